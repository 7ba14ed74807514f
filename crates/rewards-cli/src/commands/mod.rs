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

//! Commands of the rewards CLI.

mod estimate;
mod rate;

pub use estimate::EstimateRewards;
pub use rate::ParticipationRate;

use std::time::Duration;

use anyhow::{bail, Result};
use clap::Subcommand;

use crate::config::GlobalConfig;

/// Estimation commands.
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Estimate the network participation rate and yearly return.
    Rate(ParticipationRate),
    /// Estimate the reward and APR of a stake over a period.
    Estimate(EstimateRewards),
}

impl Command {
    /// Run the command once, or repeatedly in watch mode.
    pub async fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        if !global_config.poll.watch {
            return self.run_once(global_config);
        }
        if global_config.blocks_from_stdin() {
            bail!("--watch cannot re-read a snapshot from stdin; pass a file to --blocks");
        }

        let interval = Duration::from_secs(global_config.poll.poll_interval);
        let mut failures = 0u32;
        loop {
            match self.run_once(global_config) {
                Ok(()) => failures = 0,
                Err(e) => {
                    failures += 1;
                    tracing::error!("Error estimating rewards: {:?}", e);
                    if failures >= global_config.poll.retries {
                        bail!("Maximum retries reached");
                    }
                }
            }
            tracing::info!("Sleeping for {} seconds", interval.as_secs());
            tokio::time::sleep(interval).await;
        }
    }

    fn run_once(&self, global_config: &GlobalConfig) -> Result<()> {
        match self {
            Self::Rate(cmd) => cmd.run(global_config),
            Self::Estimate(cmd) => cmd.run(global_config),
        }
    }
}
