// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-point decimal arithmetic for reward ratios.

use std::{fmt, str::FromStr};

use alloy_primitives::{
    utils::{format_units, parse_units, UnitsError},
    U256,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// An unsigned decimal with [FixedNumber::DECIMALS] fractional digits, stored as a scaled
/// [U256].
///
/// Every operation truncates toward zero. Checked operations return `None` on overflow or
/// division by zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedNumber(U256);

impl FixedNumber {
    /// Number of fractional decimal digits.
    pub const DECIMALS: u8 = 18;
    /// Scale factor, `10^DECIMALS`.
    pub const SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);
    pub const ZERO: Self = Self(U256::ZERO);

    /// Wrap an already scaled value.
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// The scaled value, `self * 10^DECIMALS`.
    pub const fn raw(&self) -> U256 {
        self.0
    }

    /// The fixed-point value of `num / den`.
    pub fn ratio(num: U256, den: U256) -> Option<Self> {
        num.checked_mul(Self::SCALE)?.checked_div(den).map(Self)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Divide by a plain count, e.g. when averaging.
    pub fn checked_div_count(self, count: usize) -> Option<Self> {
        self.0.checked_div(U256::from(count)).map(Self)
    }

    /// `floor(self * x)` as an integer.
    pub fn mul_floor(self, x: U256) -> Option<U256> {
        Some(self.0.checked_mul(x)? / Self::SCALE)
    }
}

impl fmt::Display for FixedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = format_units(self.0, Self::DECIMALS).map_err(|_| fmt::Error)?;
        let trimmed = formatted.trim_end_matches('0');
        if trimmed.ends_with('.') {
            write!(f, "{trimmed}0")
        } else {
            f.write_str(trimmed)
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseFixedError {
    #[error("invalid decimal {0:?}")]
    Invalid(String, #[source] UnitsError),

    #[error("negative decimal {0:?}")]
    Negative(String),
}

impl FromStr for FixedNumber {
    type Err = ParseFixedError;

    /// Digits past [FixedNumber::DECIMALS] are truncated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = parse_units(s, Self::DECIMALS)
            .map_err(|err| ParseFixedError::Invalid(s.to_string(), err))?;
        if parsed.is_negative() {
            return Err(ParseFixedError::Negative(s.to_string()));
        }
        Ok(Self(parsed.get_absolute()))
    }
}

impl Serialize for FixedNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FixedNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
