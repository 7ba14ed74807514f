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

//! Reward rate estimation for proof-of-stake block producers.
//!
//! Given a snapshot of recently produced blocks, estimates the active stake backing block
//! production, the network participation rate, the yearly return, and the reward a given stake
//! can expect over a period. On-chain quantities are [U256] integers; ratios are
//! [FixedNumber]s with 18 decimals.

use alloy_primitives::U256;

pub mod blocks;
pub mod error;
pub mod estimator;
pub mod fixed;
pub mod format;

pub use blocks::{
    group_by_chain, BlockFilter, BlockQuery, BlockRecord, BlockSnapshot, ChainGroup, FeedError,
    DEFAULT_FIRST,
};
pub use error::EstimateError;
pub use estimator::{IntervalPolicy, ParticipationEstimate, RewardEstimate, RewardEstimator};
pub use fixed::{FixedNumber, ParseFixedError};

/// Base units per whole token (18 decimals).
pub const WEI_PER_TOKEN: U256 = FixedNumber::SCALE;
pub const SECONDS_PER_DAY: u64 = 60 * 60 * 24;
/// Seconds in a 365 day year
pub const YEAR_SECONDS: u64 = SECONDS_PER_DAY * 365;

/// Serde helpers encoding a [U256] as a decimal string.
pub(crate) mod decimal_string {
    use std::str::FromStr;

    use alloy_primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str(&s).map_err(de::Error::custom)
    }
}
