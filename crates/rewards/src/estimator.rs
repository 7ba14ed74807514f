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

//! Participation rate, year return, and APR estimation from recent blocks.
//!
//! Active stake is not observable directly. It is inferred per chain from the mean block
//! difficulty divided by the chain's target interval, and every figure below derives from it.

use std::{fmt, str::FromStr};

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{
    blocks::{group_by_chain, BlockRecord, ChainGroup},
    decimal_string,
    error::EstimateError,
    fixed::FixedNumber,
    SECONDS_PER_DAY, WEI_PER_TOKEN, YEAR_SECONDS,
};

/// How to pick the target interval of a chain whose blocks disagree on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntervalPolicy {
    /// Fail with [EstimateError::NonUniformTargetInterval].
    #[default]
    Strict,
    /// Use the interval of the first block of the chain.
    FirstRecord,
}

impl fmt::Display for IntervalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalPolicy::Strict => f.write_str("strict"),
            IntervalPolicy::FirstRecord => f.write_str("first-record"),
        }
    }
}

impl FromStr for IntervalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(IntervalPolicy::Strict),
            "first-record" => Ok(IntervalPolicy::FirstRecord),
            other => {
                Err(format!("unknown interval policy {other:?}; expected strict or first-record"))
            }
        }
    }
}

/// Network-wide participation and yearly return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationEstimate {
    /// Mean over chains of active stake / circulating supply
    pub participation_rate: FixedNumber,
    /// Sum over chains of the yearly reward / active stake
    pub year_return: FixedNumber,
}

/// Statistically expected reward for one staker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEstimate {
    /// Sum over chains of the reward over the period, in base units
    #[serde(with = "decimal_string")]
    pub reward: U256,
    /// Sum over chains of the yearly reward / user stake
    pub apr: FixedNumber,
    /// Mean over chains of the estimated active stake
    #[serde(with = "decimal_string")]
    pub active_stake: U256,
}

/// Per-chain figures shared by both estimates.
struct ChainStats<'a> {
    chain_id: &'a str,
    target_interval: U256,
    mean_reward: U256,
    active_stake: U256,
}

struct ChainRate {
    participation_rate: FixedNumber,
    year_return: FixedNumber,
}

struct ChainReward {
    reward: U256,
    apr: FixedNumber,
    active_stake: U256,
}

/// Stateless estimator over a snapshot of blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewardEstimator {
    interval_policy: IntervalPolicy,
}

impl RewardEstimator {
    pub fn new(interval_policy: IntervalPolicy) -> Self {
        Self { interval_policy }
    }

    /// Estimate the participation rate and yearly return of the network.
    ///
    /// `circulating_supply` is in whole tokens. Returns a zero estimate when `blocks` is empty
    /// or the supply is zero.
    pub fn estimate_participation_and_year_return(
        &self,
        blocks: &[BlockRecord],
        circulating_supply: U256,
    ) -> Result<ParticipationEstimate, EstimateError> {
        if blocks.is_empty() || circulating_supply.is_zero() {
            return Ok(ParticipationEstimate::default());
        }

        let supply = circulating_supply
            .checked_mul(WEI_PER_TOKEN)
            .ok_or(EstimateError::Overflow("circulating supply"))?;
        let year_seconds = U256::from(YEAR_SECONDS);

        let rates = group_by_chain(blocks)
            .iter()
            .map(|group| -> Result<ChainRate, EstimateError> {
                let stats = self.chain_stats(group)?;

                let participation_rate = FixedNumber::ratio(stats.active_stake, supply)
                    .ok_or(EstimateError::Overflow("participation rate"))?;

                if stats.active_stake.is_zero() {
                    return Err(EstimateError::ZeroActiveStake {
                        chain_id: stats.chain_id.to_string(),
                    });
                }

                // Total prize paid over one year
                let year_prize = (year_seconds / stats.target_interval)
                    .checked_mul(stats.mean_reward)
                    .ok_or(EstimateError::Overflow("year prize"))?;
                let year_return = FixedNumber::ratio(year_prize, stats.active_stake)
                    .ok_or(EstimateError::Overflow("year return"))?;

                Ok(ChainRate { participation_rate, year_return })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let participation_rate =
            sum_fixed(rates.iter().map(|r| r.participation_rate), "participation rate")?
                .checked_div_count(rates.len())
                .ok_or(EstimateError::Overflow("participation rate"))?;
        let year_return = sum_fixed(rates.iter().map(|r| r.year_return), "year return")?;

        Ok(ParticipationEstimate { participation_rate, year_return })
    }

    /// Estimate what a stake of `user_stake` base units earns over `period_days`, given
    /// `total_staked` whole tokens already in the pool.
    ///
    /// Returns a zero estimate when `blocks` is empty.
    pub fn estimate_reward_and_apr(
        &self,
        blocks: &[BlockRecord],
        user_stake: U256,
        total_staked: U256,
        period_days: u64,
    ) -> Result<RewardEstimate, EstimateError> {
        if blocks.is_empty() {
            return Ok(RewardEstimate::default());
        }
        if user_stake.is_zero() {
            return Err(EstimateError::ZeroUserStake);
        }

        // The user's stake is added to the pool it is a share of
        let pool = total_staked
            .checked_mul(WEI_PER_TOKEN)
            .and_then(|total| total.checked_add(user_stake))
            .ok_or(EstimateError::Overflow("pool stake"))?;
        let stake_share =
            FixedNumber::ratio(user_stake, pool).ok_or(EstimateError::Overflow("stake share"))?;

        let period_seconds = U256::from(period_days) * U256::from(SECONDS_PER_DAY);
        let year_seconds = U256::from(YEAR_SECONDS);

        let rewards = group_by_chain(blocks)
            .iter()
            .map(|group| -> Result<ChainReward, EstimateError> {
                let stats = self.chain_stats(group)?;

                let reward = claimed_reward(&stats, stake_share, period_seconds)?;
                let year_reward = claimed_reward(&stats, stake_share, year_seconds)?;
                let apr = FixedNumber::ratio(year_reward, user_stake)
                    .ok_or(EstimateError::Overflow("apr"))?;

                Ok(ChainReward { reward, apr, active_stake: stats.active_stake })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let reward = rewards
            .iter()
            .try_fold(U256::ZERO, |sum, r| sum.checked_add(r.reward))
            .ok_or(EstimateError::Overflow("reward"))?;
        let apr = sum_fixed(rewards.iter().map(|r| r.apr), "apr")?;
        let active_stake = rewards
            .iter()
            .try_fold(U256::ZERO, |sum, r| sum.checked_add(r.active_stake))
            .and_then(|sum| sum.checked_div(U256::from(rewards.len())))
            .ok_or(EstimateError::Overflow("active stake"))?;

        Ok(RewardEstimate { reward, apr, active_stake })
    }

    fn chain_stats<'a>(&self, group: &ChainGroup<'a>) -> Result<ChainStats<'a>, EstimateError> {
        let target_interval = U256::from(self.target_interval(group)?);
        let mean_difficulty =
            group.mean_difficulty().ok_or(EstimateError::Overflow("mean difficulty"))?;
        let mean_reward = group.mean_reward().ok_or(EstimateError::Overflow("mean reward"))?;

        Ok(ChainStats {
            chain_id: group.chain_id(),
            target_interval,
            mean_reward,
            active_stake: mean_difficulty / target_interval,
        })
    }

    fn target_interval(&self, group: &ChainGroup<'_>) -> Result<u64, EstimateError> {
        let first = group.records().first().map(|b| b.target_interval).unwrap_or_default();

        if self.interval_policy == IntervalPolicy::Strict {
            if let Some(other) =
                group.records().iter().map(|b| b.target_interval).find(|&t| t != first)
            {
                return Err(EstimateError::NonUniformTargetInterval {
                    chain_id: group.chain_id().to_string(),
                    first,
                    other,
                });
            }
        }

        if first == 0 {
            return Err(EstimateError::ZeroTargetInterval {
                chain_id: group.chain_id().to_string(),
            });
        }
        Ok(first)
    }
}

/// Reward for the blocks a staker statistically claims within `seconds`.
fn claimed_reward(
    stats: &ChainStats<'_>,
    stake_share: FixedNumber,
    seconds: U256,
) -> Result<U256, EstimateError> {
    let blocks_drawn = seconds / stats.target_interval;
    let blocks_claimed =
        stake_share.mul_floor(blocks_drawn).ok_or(EstimateError::Overflow("blocks claimed"))?;
    stats.mean_reward.checked_mul(blocks_claimed).ok_or(EstimateError::Overflow("claimed reward"))
}

fn sum_fixed(
    mut values: impl Iterator<Item = FixedNumber>,
    what: &'static str,
) -> Result<FixedNumber, EstimateError> {
    values
        .try_fold(FixedNumber::ZERO, |sum, v| sum.checked_add(v))
        .ok_or(EstimateError::Overflow(what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_policy_parse() {
        assert_eq!("strict".parse::<IntervalPolicy>().unwrap(), IntervalPolicy::Strict);
        assert_eq!(
            "first-record".parse::<IntervalPolicy>().unwrap(),
            IntervalPolicy::FirstRecord
        );
        assert!("first".parse::<IntervalPolicy>().is_err());
        assert_eq!(IntervalPolicy::FirstRecord.to_string(), "first-record");
    }

    #[test]
    fn test_estimates_serialize_as_strings() {
        let estimate = RewardEstimate {
            reward: U256::from(4_320_000_000_000_000u64),
            apr: "1.5768".parse().unwrap(),
            active_stake: U256::from(100u64),
        };
        let json = serde_json::to_value(&estimate).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "reward": "4320000000000000",
                "apr": "1.5768",
                "active_stake": "100",
            })
        );
        assert_eq!(serde_json::from_value::<RewardEstimate>(json).unwrap(), estimate);
    }
}
