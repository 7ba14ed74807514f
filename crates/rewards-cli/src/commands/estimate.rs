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

use alloy_primitives::{
    utils::{format_ether, parse_units},
    U256,
};
use anyhow::{anyhow, bail, Context};
use clap::Args;
use pos_rewards::format::{format_percent, format_tokens};

use crate::config::GlobalConfig;

/// Command to estimate the reward of a stake.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct EstimateRewards {
    /// Amount to stake.
    ///
    /// This is specified in tokens, e.g., to stake 1.5 tokens, use `--stake 1.5`.
    #[clap(long)]
    pub stake: String,
    /// Amount already staked in the pool, in whole tokens.
    #[clap(long, default_value = "0")]
    pub total_staked: U256,
    /// Staking period in days.
    #[clap(long, default_value_t = 365)]
    pub period_days: u64,
}

impl EstimateRewards {
    /// Run the [EstimateRewards] command.
    pub fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        let stake: U256 = parse_units(&self.stake, 18)
            .map_err(|e| anyhow!("Failed to parse stake amount: {}", e))?
            .into();
        if stake.is_zero() {
            bail!("Stake is below the denomination minimum: {}", self.stake);
        }

        let blocks = global_config.load_blocks()?;
        let estimate = global_config
            .estimator()
            .estimate_reward_and_apr(&blocks, stake, self.total_staked, self.period_days)
            .context("Failed to estimate rewards")?;

        if global_config.json {
            println!("{}", serde_json::to_string(&estimate)?);
            return Ok(());
        }

        let symbol = &global_config.token_symbol;
        tracing::info!(
            "Estimated reward over {} days: {} {} (~{})",
            self.period_days,
            format_ether(estimate.reward),
            symbol,
            format_tokens(estimate.reward, symbol)
        );
        tracing::info!("APR: {} ({})", format_percent(estimate.apr), estimate.apr);
        tracing::info!(
            "Estimated active stake: {} {}",
            format_ether(estimate.active_stake),
            symbol
        );
        Ok(())
    }
}
