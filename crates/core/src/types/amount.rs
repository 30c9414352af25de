//! Non-negative monetary amounts using decimal arithmetic.
//!
//! The shop runs in a single currency (Indonesian Rupiah), so an [`Amount`]
//! carries no currency code. Values are stored in the currency's standard unit
//! and may carry fractional digits when a catalog price does.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing an [`Amount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The value is below zero.
    #[error("amount cannot be negative (got {0})")]
    Negative(Decimal),
    /// The input string is not a decimal number.
    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// A monetary amount that is never negative.
///
/// Serializes transparently as the underlying decimal; deserialization rejects
/// negative values so a corrupt payload cannot smuggle in a negative balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Negative`] if `value` is below zero.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }
        Ok(Self(value.normalize()))
    }

    /// Create an amount from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the underlying decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtract `other`, returning `None` when the result would be negative.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        if other.0 > self.0 {
            return None;
        }
        self.0.checked_sub(other.0).map(Self)
    }

    /// Add `other`, returning `None` on decimal overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Add `other`, clamping at the largest representable amount.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Multiply by a line quantity, clamping at the largest representable amount.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Format for display the way the storefront shows prices (e.g., `Rp 5.000.000`).
    ///
    /// Uses `.` as the thousands separator and `,` before at most three
    /// fractional digits.
    #[must_use]
    pub fn display_rupiah(&self) -> String {
        let rounded = self.0.round_dp(3).normalize().to_string();
        let (whole, fraction) = rounded
            .split_once('.')
            .map_or((rounded.as_str(), None), |(w, f)| (w, Some(f)));

        let digits: Vec<char> = whole.chars().collect();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, digit) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(*digit);
        }

        match fraction {
            Some(fraction) => format!("Rp {grouped},{fraction}"),
            None => format!("Rp {grouped}"),
        }
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| AmountError::Invalid(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
