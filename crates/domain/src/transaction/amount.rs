//! Money amount value object.

use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{DomainError, Result};

const MINOR_PER_MAJOR: i64 = 100;

/// Strictly positive money amount, stored in minor units (cents) to avoid
/// floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    minor: i64,
}

impl Amount {
    /// Creates an amount from minor units. Zero and negatives are rejected.
    pub fn from_minor(minor: i64) -> Result<Self> {
        if minor <= 0 {
            return Err(DomainError::InvalidAmount(
                "amount must be greater than zero".into(),
            ));
        }
        Ok(Self { minor })
    }

    /// Parses user input such as `"12"`, `"12.5"` or `"12,50"`.
    ///
    /// Either a comma or a dot separates the fraction, which may have at
    /// most two digits.
    pub fn parse(input: &str) -> Result<Self> {
        let cleaned = input.trim().replace(',', ".");
        let malformed = || DomainError::InvalidAmount(format!("invalid amount format: '{input}'"));

        if cleaned.starts_with('-') {
            return Err(DomainError::InvalidAmount(
                "amount must be greater than zero".into(),
            ));
        }

        let (whole, fraction) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(malformed());
        }
        let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !digits_only(whole) || !digits_only(fraction) {
            return Err(malformed());
        }
        if fraction.len() > 2 {
            return Err(DomainError::InvalidAmount(format!(
                "at most two decimal places allowed: '{input}'"
            )));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| malformed())?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| malformed())? * 10,
            _ => fraction.parse().map_err(|_| malformed())?,
        };

        let minor = whole
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(|| DomainError::InvalidAmount(format!("amount too large: '{input}'")))?;

        Self::from_minor(minor)
    }

    pub fn minor_units(&self) -> i64 {
        self.minor
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.minor / MINOR_PER_MAJOR,
            self.minor % MINOR_PER_MAJOR
        )
    }
}

/// Serialized as its two-decimal display string.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
