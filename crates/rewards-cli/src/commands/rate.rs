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

use alloy_primitives::U256;
use anyhow::Context;
use clap::Args;
use pos_rewards::format::format_percent;

use crate::config::GlobalConfig;

/// Command to estimate the participation rate and yearly return.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct ParticipationRate {
    /// Circulating token supply, in whole tokens.
    #[clap(long, env = "CIRCULATING_SUPPLY")]
    pub circulating_supply: U256,
}

impl ParticipationRate {
    /// Run the [ParticipationRate] command.
    pub fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        let blocks = global_config.load_blocks()?;
        let estimate = global_config
            .estimator()
            .estimate_participation_and_year_return(&blocks, self.circulating_supply)
            .context("Failed to estimate participation rate")?;

        if global_config.json {
            println!("{}", serde_json::to_string(&estimate)?);
            return Ok(());
        }

        tracing::info!(
            "Participation rate: {} ({})",
            format_percent(estimate.participation_rate),
            estimate.participation_rate
        );
        tracing::info!(
            "Year return: {} ({})",
            format_percent(estimate.year_return),
            estimate.year_return
        );
        Ok(())
    }
}
