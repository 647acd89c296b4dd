//! Exact money arithmetic.
//!
//! Uses minor-unit integer representation so that every price computed by
//! the pipeline is exact. Percentages are expressed in basis points and
//! rounded half away from zero.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CommerceError;

/// Basis points in 100%.
pub const BASIS_POINTS_PER_UNIT: i64 = 10_000;

/// Currencies a cart can be priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
    CHF,
}

impl Currency {
    /// Every supported currency.
    pub const ALL: [Currency; 7] = [
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::JPY,
        Currency::CAD,
        Currency::AUD,
        Currency::CHF,
    ];

    // (code, symbol, minor unit digits)
    fn info(self) -> (&'static str, &'static str, u32) {
        match self {
            Currency::USD => ("USD", "$", 2),
            Currency::EUR => ("EUR", "\u{20ac}", 2),
            Currency::GBP => ("GBP", "\u{00a3}", 2),
            Currency::JPY => ("JPY", "\u{00a5}", 0),
            Currency::CAD => ("CAD", "CA$", 2),
            Currency::AUD => ("AUD", "A$", 2),
            Currency::CHF => ("CHF", "CHF", 2),
        }
    }

    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        self.info().0
    }

    /// Display symbol.
    pub fn symbol(&self) -> &'static str {
        self.info().1
    }

    /// Digits after the decimal point; amounts are stored in this minor unit.
    pub fn decimal_places(&self) -> u32 {
        self.info().2
    }

    /// Look a currency up by code, ignoring case.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// An exact amount in the currency's minor unit.
///
/// Signed: rebates are negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Minor units (cents for USD, yen for JPY).
    pub amount_cents: i64,
    pub currency: Currency,
}

impl Money {
    /// Amount in minor units.
    pub fn new(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Zero in `currency`.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Check if this is positive.
    pub fn is_positive(&self) -> bool {
        self.amount_cents > 0
    }

    /// Check if this is negative (a rebate).
    pub fn is_negative(&self) -> bool {
        self.amount_cents < 0
    }

    /// Same magnitude, opposite sign.
    pub fn negate(&self) -> Self {
        Self::new(-self.amount_cents, self.currency)
    }

    /// The smaller of two amounts in the same currency.
    pub fn min(self, other: Money) -> Result<Money, CommerceError> {
        self.ensure_same_currency(&other)?;
        Ok(if other.amount_cents < self.amount_cents {
            other
        } else {
            self
        })
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), CommerceError> {
        if self.currency != other.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: other.currency.code().to_string(),
            });
        }
        Ok(())
    }

    /// Checked addition in one currency.
    pub fn try_add(&self, other: &Money) -> Result<Money, CommerceError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount_cents
            .checked_add(other.amount_cents)
            .ok_or(CommerceError::Overflow)?;
        Ok(Money::new(amount, self.currency))
    }

    /// Checked subtraction in one currency.
    pub fn try_subtract(&self, other: &Money) -> Result<Money, CommerceError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount_cents
            .checked_sub(other.amount_cents)
            .ok_or(CommerceError::Overflow)?;
        Ok(Money::new(amount, self.currency))
    }

    /// Checked multiplication by a quantity.
    pub fn try_multiply(&self, factor: i64) -> Result<Money, CommerceError> {
        let amount = self
            .amount_cents
            .checked_mul(factor)
            .ok_or(CommerceError::Overflow)?;
        Ok(Money::new(amount, self.currency))
    }

    /// Calculate a share of this amount expressed in basis points.
    ///
    /// `percentage_bps(1000)` is 10%. The result is rounded half away from
    /// zero to the currency's smallest unit.
    ///
    /// ```
    /// use turbo_pricing::money::{Currency, Money};
    /// let price = Money::new(999, Currency::USD);
    /// assert_eq!(price.percentage_bps(1000).amount_cents, 100);
    /// ```
    pub fn percentage_bps(&self, basis_points: i64) -> Money {
        let scaled = self.amount_cents as i128 * basis_points as i128;
        let divisor = BASIS_POINTS_PER_UNIT as i128;
        let mut quotient = scaled / divisor;
        let remainder = scaled % divisor;
        if remainder.abs() * 2 >= divisor {
            quotient += scaled.signum();
        }
        let saturated = if scaled < 0 { i64::MIN } else { i64::MAX };
        let amount = i64::try_from(quotient).unwrap_or(saturated);
        Money::new(amount, self.currency)
    }

    /// Sum an iterator of Money values, failing on mismatch or overflow.
    pub fn try_sum<'a>(
        iter: impl Iterator<Item = &'a Money>,
        currency: Currency,
    ) -> Result<Money, CommerceError> {
        iter.fold(Ok(Money::zero(currency)), |acc, m| acc?.try_add(m))
    }

    /// Symbol and amount, `$49.99`.
    pub fn display(&self) -> String {
        format!("{}{}", self.currency.symbol(), self.display_amount())
    }

    /// Amount without symbol, `-49.99`.
    pub fn display_amount(&self) -> String {
        let places = self.currency.decimal_places();
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.amount_cents.unsigned_abs();
        if places == 0 {
            return format!("{}{}", sign, abs);
        }
        let divisor = 10_u64.pow(places);
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / divisor,
            abs % divisor,
            width = places as usize
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(4999, Currency::USD).display(), "$49.99");
        assert_eq!(Money::new(-1505, Currency::USD).display(), "$-15.05");
        assert_eq!(Money::new(100, Currency::JPY).display(), "\u{00a5}100");
        assert_eq!(Money::new(7, Currency::EUR).display_amount(), "0.07");
    }

    #[test]
    fn test_money_addition() {
        let a = Money::new(1000, Currency::USD);
        let b = Money::new(-300, Currency::USD);
        assert_eq!(a.try_add(&b).unwrap().amount_cents, 700);
    }

    #[test]
    fn test_money_overflow() {
        let a = Money::new(i64::MAX, Currency::USD);
        assert!(matches!(
            a.try_add(&Money::new(1, Currency::USD)),
            Err(CommerceError::Overflow)
        ));
        assert!(matches!(a.try_multiply(2), Err(CommerceError::Overflow)));
    }

    #[test]
    fn test_money_currency_mismatch() {
        let usd = Money::new(1000, Currency::USD);
        let eur = Money::new(1000, Currency::EUR);
        assert!(matches!(
            usd.try_add(&eur),
            Err(CommerceError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_percentage_rounding() {
        let m = Money::new(10000, Currency::USD);
        assert_eq!(m.percentage_bps(1000).amount_cents, 1000);

        // 10% of $0.05 is half a cent, rounded away from zero
        let m = Money::new(5, Currency::USD);
        assert_eq!(m.percentage_bps(1000).amount_cents, 1);
        assert_eq!(m.negate().percentage_bps(1000).amount_cents, -1);

        // 10% of $0.04 rounds down
        let m = Money::new(4, Currency::USD);
        assert_eq!(m.percentage_bps(1000).amount_cents, 0);
    }

    #[test]
    fn test_try_sum() {
        let values = [
            Money::new(100, Currency::USD),
            Money::new(250, Currency::USD),
            Money::new(-50, Currency::USD),
        ];
        let total = Money::try_sum(values.iter(), Currency::USD).unwrap();
        assert_eq!(total.amount_cents, 300);
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("USD"), Some(Currency::USD));
        assert_eq!(Currency::from_code("eur"), Some(Currency::EUR));
        assert_eq!(Currency::from_code("INVALID"), None);
        assert_eq!(Currency::JPY.decimal_places(), 0);
    }
}
