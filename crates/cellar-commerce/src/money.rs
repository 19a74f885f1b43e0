//! Money type for representing monetary values.
//!
//! Amounts are integers in the currency's smallest unit, so totals never
//! accumulate floating-point error. Arithmetic is checked.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    /// Vietnamese dong; the storefront's pricing currency.
    #[default]
    VND,
    USD,
}

impl Currency {
    /// Get the currency code (e.g., "VND").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::VND => "VND",
            Currency::USD => "USD",
        }
    }

    /// Get the currency symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::VND => "\u{20ab}",
            Currency::USD => "$",
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "VND" => Some(Currency::VND),
            "USD" => Some(Currency::USD),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in the smallest currency unit (whole dong, or cents).
    pub amount: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from minor units.
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Shorthand for a dong amount.
    pub fn vnd(amount: i64) -> Self {
        Self::new(amount, Currency::VND)
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Try to add another Money value. `None` on currency mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Try to subtract another Money value.
    pub fn try_subtract(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount
            .checked_sub(other.amount)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Multiply by a quantity, `None` on overflow.
    pub fn try_multiply(&self, factor: i64) -> Option<Money> {
        self.amount
            .checked_mul(factor)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Sum an iterator of Money values in one currency.
    pub fn try_sum<'a>(
        mut iter: impl Iterator<Item = &'a Money>,
        currency: Currency,
    ) -> Option<Money> {
        iter.try_fold(Money::zero(currency), |acc, m| acc.try_add(m))
    }

    /// Format as a display string, e.g. `1.250.000₫` or `$12.50`.
    pub fn display(&self) -> String {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        match self.currency {
            Currency::VND => format!("{sign}{}{}", group_thousands(abs, '.'), self.currency.symbol()),
            Currency::USD => format!(
                "{sign}{}{}.{:02}",
                self.currency.symbol(),
                group_thousands(abs / 100, ','),
                abs % 100
            ),
        }
    }
}

fn group_thousands(value: u64, sep: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
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
    fn test_display() {
        assert_eq!(Money::vnd(1_250_000).display(), "1.250.000\u{20ab}");
        assert_eq!(Money::vnd(950).display(), "950\u{20ab}");
        assert_eq!(Money::new(1250, Currency::USD).display(), "$12.50");
        assert_eq!(Money::new(123_456_78, Currency::USD).display(), "$123,456.78");
        assert_eq!(Money::vnd(-5000).display(), "-5.000\u{20ab}");
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::vnd(1000);
        assert_eq!(a.try_add(&Money::vnd(500)), Some(Money::vnd(1500)));
        assert_eq!(a.try_subtract(&Money::vnd(300)), Some(Money::vnd(700)));
        assert_eq!(a.try_multiply(3), Some(Money::vnd(3000)));
        assert_eq!(Money::vnd(i64::MAX).try_multiply(2), None);
        assert_eq!(a.try_add(&Money::new(1, Currency::USD)), None);
    }

    #[test]
    fn test_try_sum() {
        let values = [Money::vnd(100), Money::vnd(250)];
        assert_eq!(
            Money::try_sum(values.iter(), Currency::VND),
            Some(Money::vnd(350))
        );
        let overflow = [Money::vnd(i64::MAX), Money::vnd(1)];
        assert_eq!(Money::try_sum(overflow.iter(), Currency::VND), None);
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("vnd"), Some(Currency::VND));
        assert_eq!(Currency::from_code("USD"), Some(Currency::USD));
        assert_eq!(Currency::from_code("EUR"), None);
    }
}
