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

//! Common configuration options for commands in the rewards CLI.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Args;
use pos_rewards::{
    BlockFilter, BlockQuery, BlockRecord, BlockSnapshot, IntervalPolicy, RewardEstimator,
    DEFAULT_FIRST,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Common configuration options for all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalConfig {
    /// Block snapshot in the indexer's JSON format, or `-` to read it from stdin
    #[clap(long, env = "BLOCKS_FILE", global = true)]
    pub blocks: Option<PathBuf>,

    /// Number of most recent blocks to estimate from
    #[clap(long, env = "BLOCKS_FIRST", global = true, default_value_t = DEFAULT_FIRST)]
    pub first: usize,

    /// Only use blocks produced by this address
    #[clap(long, global = true)]
    pub producer: Option<String>,

    /// Only use blocks produced by this node
    #[clap(long, global = true)]
    pub node: Option<String>,

    /// Only use blocks newer than this Unix timestamp
    #[clap(long, global = true)]
    pub after: Option<u64>,

    /// Only use blocks older than this Unix timestamp
    #[clap(long, global = true)]
    pub before: Option<u64>,

    /// How to handle a chain whose blocks disagree on the target interval (strict, first-record)
    #[clap(long, env = "INTERVAL_POLICY", global = true, default_value_t = IntervalPolicy::Strict)]
    pub interval_policy: IntervalPolicy,

    /// Token symbol used when displaying amounts
    #[clap(long, env = "TOKEN_SYMBOL", global = true, default_value = "CTSI")]
    pub token_symbol: String,

    /// Log level (error, warn, info, debug, trace)
    #[clap(long, env = "LOG_LEVEL", global = true, default_value = "info")]
    pub log_level: LevelFilter,

    /// Whether to log in JSON format.
    #[clap(long, env, global = true, default_value_t = false)]
    pub log_json: bool,

    /// Print the estimate as JSON on stdout. Logs are written to stderr.
    #[clap(long, global = true)]
    pub json: bool,

    /// Options for re-polling the snapshot.
    #[clap(flatten, next_help_heading = "Polling")]
    pub poll: PollConfig,
}

/// Configuration for watch mode, where the snapshot is re-read and re-estimated periodically.
#[derive(Args, Debug, Clone)]
pub struct PollConfig {
    /// Keep re-reading the block snapshot and printing fresh estimates
    #[clap(long, global = true)]
    pub watch: bool,

    /// Interval in seconds between polls.
    #[clap(long, global = true, default_value = "30")]
    pub poll_interval: u64,

    /// Number of consecutive failures before quitting.
    #[clap(long, global = true, default_value = "3")]
    pub retries: u32,
}

impl GlobalConfig {
    /// Access [Self::blocks] or return an error that can be shown to the user.
    pub fn require_blocks(&self) -> Result<&Path> {
        self.blocks
            .as_deref()
            .context("Block snapshot not provided; please set --blocks or the BLOCKS_FILE env var")
    }

    /// Whether the snapshot is read from stdin.
    pub fn blocks_from_stdin(&self) -> bool {
        self.blocks.as_deref() == Some(Path::new("-"))
    }

    /// The block query built from the filter options.
    pub fn query(&self) -> BlockQuery {
        BlockQuery {
            first: self.first,
            filter: BlockFilter {
                producer: self.producer.clone(),
                node: self.node.clone(),
                timestamp_gt: self.after,
                timestamp_lt: self.before,
                ..Default::default()
            },
        }
    }

    pub fn estimator(&self) -> RewardEstimator {
        RewardEstimator::new(self.interval_policy)
    }

    /// Read the block snapshot and select the blocks to estimate from, newest first.
    pub fn load_blocks(&self) -> Result<Vec<BlockRecord>> {
        let path = self.require_blocks()?;
        let snapshot = if self.blocks_from_stdin() {
            BlockSnapshot::from_reader(std::io::stdin().lock())
                .context("Failed to read block snapshot from stdin")?
        } else {
            let file = File::open(path)
                .with_context(|| format!("Failed to open block snapshot {}", path.display()))?;
            BlockSnapshot::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to read block snapshot {}", path.display()))?
        };

        if let Some((oldest, newest)) = snapshot.time_range() {
            tracing::debug!(
                "Snapshot covers {} to {}",
                format_timestamp(oldest),
                format_timestamp(newest)
            );
        }

        let blocks = snapshot.select(&self.query());
        match (blocks.last(), blocks.first()) {
            (Some(oldest), Some(newest)) => tracing::info!(
                "Estimating from {} of {} blocks, {} to {}",
                blocks.len(),
                snapshot.len(),
                format_timestamp(oldest.timestamp),
                format_timestamp(newest.timestamp)
            ),
            _ => tracing::warn!("No blocks matched; estimates will be zero"),
        }
        Ok(blocks)
    }

    /// Install the global tracing subscriber.
    pub fn init_tracing(&self) {
        let filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(self.log_level.into())
            .from_env_lossy();

        // Keep stdout clean for the JSON result.
        let writer = if self.json {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::stdout)
        };

        let builder =
            tracing_subscriber::fmt().with_ansi(false).with_writer(writer).with_env_filter(filter);
        if self.log_json {
            builder.json().init();
        } else {
            builder.init();
        }
    }
}

fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}
