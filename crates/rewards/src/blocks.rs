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

//! Block records as served by the chain indexer, and the query applied to them before estimation.

use std::{collections::BTreeMap, io::Read, str::FromStr};

use alloy_primitives::U256;
use serde::Deserialize;
use thiserror::Error;

/// Default number of most recent blocks considered by a [BlockQuery].
pub const DEFAULT_FIRST: usize = 10;

/// One produced block, with the chain metadata needed for reward estimation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    /// Indexer entity ID of the block
    pub id: String,
    /// Block number
    pub number: u64,
    /// ID of the chain the block was produced on
    pub chain_id: String,
    /// Difficulty of the block
    pub difficulty: U256,
    /// Reward paid for the block, in base units
    pub reward: U256,
    /// Target seconds per block of the chain
    pub target_interval: u64,
    /// Unix timestamp of the block
    pub timestamp: u64,
    /// Producer (user) address
    pub producer: Option<String>,
    /// Node address
    pub node: Option<String>,
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("failed to read block snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed block snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid integer in field {field}: {value:?}")]
    InvalidInteger { field: &'static str, value: String },
}

// The indexer encodes BigInt fields as strings, but some producers of snapshots use plain numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInteger {
    Number(u64),
    Text(String),
}

impl RawInteger {
    fn into_u64(self, field: &'static str) -> Result<u64, FeedError> {
        match self {
            RawInteger::Number(n) => Ok(n),
            RawInteger::Text(s) => {
                let value = parse_u256(field, &s)?;
                u64::try_from(value)
                    .map_err(|_| FeedError::InvalidInteger { field, value: s.clone() })
            }
        }
    }
}

fn parse_u256(field: &'static str, value: &str) -> Result<U256, FeedError> {
    U256::from_str(value.trim())
        .map_err(|_| FeedError::InvalidInteger { field, value: value.to_string() })
}

#[derive(Debug, Deserialize)]
struct RawRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChain {
    id: String,
    target_interval: RawInteger,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    id: String,
    number: RawInteger,
    difficulty: String,
    reward: String,
    timestamp: RawInteger,
    #[serde(default)]
    producer: Option<RawRef>,
    #[serde(default)]
    node: Option<RawRef>,
    chain: RawChain,
}

impl TryFrom<RawBlock> for BlockRecord {
    type Error = FeedError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        Ok(BlockRecord {
            id: raw.id,
            number: raw.number.into_u64("number")?,
            chain_id: raw.chain.id,
            difficulty: parse_u256("difficulty", &raw.difficulty)?,
            reward: parse_u256("reward", &raw.reward)?,
            target_interval: raw.chain.target_interval.into_u64("chain.targetInterval")?,
            timestamp: raw.timestamp.into_u64("timestamp")?,
            producer: raw.producer.map(|r| r.id),
            node: raw.node.map(|r| r.id),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawBlocks {
    blocks: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawResponse {
    Envelope { data: RawBlocks },
    Bare(RawBlocks),
}

/// Filter on block fields. Unset fields match every block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFilter {
    pub id: Option<String>,
    pub number: Option<u64>,
    pub producer: Option<String>,
    pub node: Option<String>,
    /// Only blocks strictly older than this timestamp
    pub timestamp_lt: Option<u64>,
    /// Only blocks strictly newer than this timestamp
    pub timestamp_gt: Option<u64>,
}

impl BlockFilter {
    pub fn matches(&self, block: &BlockRecord) -> bool {
        fn same(want: &Option<String>, have: &Option<String>) -> bool {
            match (want, have) {
                (None, _) => true,
                (Some(want), Some(have)) => want.eq_ignore_ascii_case(have),
                (Some(_), None) => false,
            }
        }

        self.id.as_ref().is_none_or(|id| *id == block.id)
            && self.number.is_none_or(|n| n == block.number)
            && same(&self.producer, &block.producer)
            && same(&self.node, &block.node)
            && self.timestamp_lt.is_none_or(|t| block.timestamp < t)
            && self.timestamp_gt.is_none_or(|t| block.timestamp > t)
    }
}

/// Selects the most recent `first` blocks matching `filter`, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockQuery {
    pub first: usize,
    pub filter: BlockFilter,
}

impl Default for BlockQuery {
    fn default() -> Self {
        Self { first: DEFAULT_FIRST, filter: BlockFilter::default() }
    }
}

/// A complete, immutable set of blocks fetched from the indexer at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSnapshot {
    blocks: Vec<BlockRecord>,
}

impl BlockSnapshot {
    pub fn new(blocks: Vec<BlockRecord>) -> Self {
        Self { blocks }
    }

    /// Parse an indexer response, either bare (`{"blocks": [...]}`) or wrapped in a GraphQL
    /// `data` envelope.
    pub fn from_json(json: &str) -> Result<Self, FeedError> {
        Self::from_response(serde_json::from_str(json)?)
    }

    /// Like [Self::from_json], reading from `reader`.
    pub fn from_reader(reader: impl Read) -> Result<Self, FeedError> {
        Self::from_response(serde_json::from_reader(reader)?)
    }

    fn from_response(response: RawResponse) -> Result<Self, FeedError> {
        let raw = match response {
            RawResponse::Envelope { data } => data,
            RawResponse::Bare(blocks) => blocks,
        };
        let blocks =
            raw.blocks.into_iter().map(BlockRecord::try_from).collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("Parsed {} blocks from snapshot", blocks.len());
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[BlockRecord] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Apply `query`, returning matching blocks ordered by timestamp descending.
    pub fn select(&self, query: &BlockQuery) -> Vec<BlockRecord> {
        let mut selected: Vec<BlockRecord> =
            self.blocks.iter().filter(|b| query.filter.matches(b)).cloned().collect();
        selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.number.cmp(&a.number)));
        selected.truncate(query.first);
        tracing::debug!("Selected {} of {} blocks", selected.len(), self.blocks.len());
        selected
    }

    /// Oldest and newest block timestamps.
    pub fn time_range(&self) -> Option<(u64, u64)> {
        let oldest = self.blocks.iter().map(|b| b.timestamp).min()?;
        let newest = self.blocks.iter().map(|b| b.timestamp).max()?;
        Some((oldest, newest))
    }
}

/// Blocks of a single chain, in input order. Never empty.
#[derive(Debug, Clone)]
pub struct ChainGroup<'a> {
    chain_id: &'a str,
    records: Vec<&'a BlockRecord>,
}

impl<'a> ChainGroup<'a> {
    pub fn chain_id(&self) -> &'a str {
        self.chain_id
    }

    pub fn records(&self) -> &[&'a BlockRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean difficulty, truncated. `None` on overflow.
    pub fn mean_difficulty(&self) -> Option<U256> {
        self.mean(|b| b.difficulty)
    }

    /// Mean block reward, truncated. `None` on overflow.
    pub fn mean_reward(&self) -> Option<U256> {
        self.mean(|b| b.reward)
    }

    fn mean(&self, field: impl Fn(&BlockRecord) -> U256) -> Option<U256> {
        let sum = self
            .records
            .iter()
            .try_fold(U256::ZERO, |sum, block| sum.checked_add(field(block)))?;
        sum.checked_div(U256::from(self.records.len()))
    }
}

/// Partition blocks by chain ID. Groups are ordered by chain ID.
pub fn group_by_chain(blocks: &[BlockRecord]) -> Vec<ChainGroup<'_>> {
    let mut groups: BTreeMap<&str, Vec<&BlockRecord>> = BTreeMap::new();
    for block in blocks {
        groups.entry(block.chain_id.as_str()).or_default().push(block);
    }
    groups.into_iter().map(|(chain_id, records)| ChainGroup { chain_id, records }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const SNAPSHOT: &str = r#"{
        "data": {
            "blocks": [
                {
                    "id": "0xaa-1",
                    "number": "7",
                    "difficulty": "1000",
                    "reward": "2900000000000000000000",
                    "timestamp": "1620000100",
                    "producer": { "id": "0xProducer" },
                    "node": { "id": "0xNode1" },
                    "chain": { "id": "0xaa-0", "targetInterval": "10" }
                },
                {
                    "id": "0xbb-1",
                    "number": 3,
                    "difficulty": "0x7d0",
                    "reward": "10",
                    "timestamp": 1620000000,
                    "producer": null,
                    "node": { "id": "0xnode2" },
                    "chain": { "id": "0xbb-0", "targetInterval": 20 }
                }
            ]
        }
    }"#;

    fn block(chain_id: &str, number: u64, timestamp: u64) -> BlockRecord {
        BlockRecord {
            id: format!("{chain_id}-{number}"),
            number,
            chain_id: chain_id.to_string(),
            difficulty: U256::from(1000u64),
            reward: U256::from(10u64),
            target_interval: 10,
            timestamp,
            producer: Some("0xProducer".to_string()),
            node: Some(format!("0xnode{}", number % 2)),
        }
    }

    #[traced_test]
    #[test]
    fn test_parse_graphql_envelope() {
        let snapshot = BlockSnapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(logs_contain("Parsed 2 blocks from snapshot"));

        let first = &snapshot.blocks()[0];
        assert_eq!(first.number, 7);
        assert_eq!(first.chain_id, "0xaa-0");
        assert_eq!(first.reward, U256::from(2_900_000_000_000_000_000_000u128));
        assert_eq!(first.target_interval, 10);
        assert_eq!(first.timestamp, 1620000100);
        assert_eq!(first.producer.as_deref(), Some("0xProducer"));

        let second = &snapshot.blocks()[1];
        assert_eq!(second.difficulty, U256::from(2000u64));
        assert_eq!(second.target_interval, 20);
        assert_eq!(second.producer, None);
        assert_eq!(second.node.as_deref(), Some("0xnode2"));

        assert_eq!(snapshot.time_range(), Some((1620000000, 1620000100)));
    }

    #[test]
    fn test_parse_bare_response() {
        let json = r#"{"blocks": [{
            "id": "1", "number": 1, "difficulty": "5", "reward": "6", "timestamp": 9,
            "chain": { "id": "c", "targetInterval": 1 }
        }]}"#;
        let snapshot = BlockSnapshot::from_reader(json.as_bytes()).unwrap();
        assert_eq!(snapshot.blocks()[0].difficulty, U256::from(5u64));
        assert_eq!(snapshot.blocks()[0].node, None);

        let empty = BlockSnapshot::from_json(r#"{"blocks": []}"#).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.time_range(), None);
    }

    #[test]
    fn test_parse_invalid_integer() {
        let json = r#"{"blocks": [{
            "id": "1", "number": 1, "difficulty": "12ab", "reward": "6", "timestamp": 9,
            "chain": { "id": "c", "targetInterval": 1 }
        }]}"#;
        let err = BlockSnapshot::from_json(json).unwrap_err();
        assert!(matches!(err, FeedError::InvalidInteger { field: "difficulty", .. }));

        let json = r#"{"blocks": [{
            "id": "1", "number": 1, "difficulty": "1", "reward": "6", "timestamp": 9,
            "chain": { "id": "c", "targetInterval": "99999999999999999999999" }
        }]}"#;
        let err = BlockSnapshot::from_json(json).unwrap_err();
        assert!(matches!(err, FeedError::InvalidInteger { field: "chain.targetInterval", .. }));

        assert!(matches!(BlockSnapshot::from_json("{}"), Err(FeedError::Json(_))));
    }

    #[test]
    fn test_select_orders_newest_first_and_limits() {
        let snapshot = BlockSnapshot::new((1..=15).map(|n| block("a", n, 100 + n)).collect());
        let selected = snapshot.select(&BlockQuery::default());
        assert_eq!(selected.len(), DEFAULT_FIRST);
        assert_eq!(selected[0].number, 15);
        assert_eq!(selected[9].number, 6);

        let query = BlockQuery { first: 100, ..Default::default() };
        assert_eq!(snapshot.select(&query).len(), 15);
    }

    #[test]
    fn test_select_filters() {
        let snapshot = BlockSnapshot::new((1..=6).map(|n| block("a", n, 100 + n)).collect());

        let by_node = BlockFilter { node: Some("0XNODE1".to_string()), ..Default::default() };
        let selected = snapshot.select(&BlockQuery { first: 10, filter: by_node });
        assert_eq!(selected.iter().map(|b| b.number).collect::<Vec<_>>(), vec![5, 3, 1]);

        let window =
            BlockFilter { timestamp_gt: Some(102), timestamp_lt: Some(105), ..Default::default() };
        let selected = snapshot.select(&BlockQuery { first: 10, filter: window });
        assert_eq!(selected.iter().map(|b| b.number).collect::<Vec<_>>(), vec![4, 3]);

        let by_number = BlockFilter { number: Some(2), ..Default::default() };
        assert_eq!(snapshot.select(&BlockQuery { first: 10, filter: by_number }).len(), 1);

        let by_producer =
            BlockFilter { producer: Some("0xsomeoneelse".to_string()), ..Default::default() };
        assert!(snapshot.select(&BlockQuery { first: 10, filter: by_producer }).is_empty());
    }

    #[test]
    fn test_group_by_chain() {
        let blocks = vec![block("b", 1, 1), block("a", 2, 2), block("b", 3, 3)];
        let groups = group_by_chain(&blocks);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].chain_id(), "a");
        assert_eq!(groups[1].chain_id(), "b");
        let numbers: Vec<u64> = groups[1].records().iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1, 3]);

        assert!(group_by_chain(&[]).is_empty());
    }

    #[test]
    fn test_group_means_truncate() {
        let mut blocks = vec![block("a", 1, 1), block("a", 2, 2)];
        blocks[0].difficulty = U256::from(10u64);
        blocks[1].difficulty = U256::from(11u64);
        blocks[0].reward = U256::from(3u64);
        blocks[1].reward = U256::from(4u64);
        let groups = group_by_chain(&blocks);
        assert_eq!(groups[0].mean_difficulty(), Some(U256::from(10u64)));
        assert_eq!(groups[0].mean_reward(), Some(U256::from(3u64)));

        blocks[0].difficulty = U256::MAX;
        assert_eq!(group_by_chain(&blocks)[0].mean_difficulty(), None);
    }
}
