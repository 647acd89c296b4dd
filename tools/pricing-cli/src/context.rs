//! CLI execution context.

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Capture the working directory.
    pub fn new(output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self { output, cwd })
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// Find the pricing file: an explicit path, or `pricing.toml` / `pricing.json`
    /// in the working directory or one of its parents.
    pub fn pricing_file(&self, explicit: Option<&str>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(self.resolve_path(path));
        }

        let names = ["pricing.toml", "pricing.json"];
        let mut current = self.cwd.clone();
        loop {
            for name in &names {
                let candidate = current.join(name);
                if candidate.exists() {
                    return Ok(candidate);
                }
            }
            if !current.pop() {
                break;
            }
        }

        anyhow::bail!("No pricing file given and none of {:?} found", names)
    }
}
