//! Byte quantity domain type
//!
//! Human-readable sizes for the memory ceiling and usage samples.
//! Units are binary: 1KB is 1024 bytes.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Number of bytes, displayed with two decimals in the largest fitting unit
///
/// # Examples
///
/// ```
/// use gml::domain::ByteSize;
///
/// let limit: ByteSize = "1.5GB".parse().unwrap();
/// assert_eq!(limit.as_bytes(), 3 * 512 * 1024 * 1024);
/// assert_eq!(limit.to_string(), "1.50GB");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ByteSize(u64);

impl ByteSize {
    /// Zero bytes
    pub const ZERO: Self = Self(0);

    /// Create a size from a raw byte count
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Create a size from mebibytes
    pub const fn from_mib(mib: u64) -> Self {
        Self(mib * 1024 * 1024)
    }

    /// Get the raw byte count
    #[inline]
    pub const fn as_bytes(&self) -> u64 {
        self.0
    }

    /// Add another size, saturating at the maximum
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    fn multiplier(unit: &str) -> Option<u64> {
        let exp = match unit {
            "" | "B" => 0,
            "K" | "KB" | "KIB" => 1,
            "M" | "MB" | "MIB" => 2,
            "G" | "GB" | "GIB" => 3,
            "T" | "TB" | "TIB" => 4,
            "P" | "PB" | "PIB" => 5,
            "E" | "EB" | "EIB" => 6,
            _ => return None,
        };
        Some(1024u64.pow(exp))
    }
}

impl FromStr for ByteSize {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);

        let invalid = || DomainError::InvalidSize(s.to_string());
        if number.is_empty() {
            return Err(invalid());
        }
        let multiplier = Self::multiplier(&unit.trim().to_ascii_uppercase()).ok_or_else(invalid)?;

        // Whole numbers stay exact; fractions go through f64.
        if let Ok(whole) = number.parse::<u64>() {
            return whole
                .checked_mul(multiplier)
                .map(Self)
                .ok_or_else(invalid);
        }

        let value: f64 = number.parse().map_err(|_| invalid())?;
        let bytes = value * multiplier as f64;
        if !bytes.is_finite() || bytes >= u64::MAX as f64 {
            return Err(invalid());
        }
        Ok(Self(bytes.round() as u64))
    }
}

impl TryFrom<String> for ByteSize {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ByteSize> for String {
    fn from(size: ByteSize) -> Self {
        size.to_string()
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0 as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        write!(f, "{:.2}{}", value, UNITS[unit])
    }
}
