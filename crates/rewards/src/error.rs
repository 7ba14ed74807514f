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

use thiserror::Error;

/// Failures of the reward estimator.
///
/// Empty input is not an error; it produces a zero-valued estimate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimateError {
    #[error("chain {chain_id} has a target interval of zero")]
    ZeroTargetInterval { chain_id: String },

    #[error("chain {chain_id} mixes target intervals {first} and {other}")]
    NonUniformTargetInterval { chain_id: String, first: u64, other: u64 },

    #[error("chain {chain_id} has zero estimated active stake")]
    ZeroActiveStake { chain_id: String },

    #[error("user stake must be greater than zero")]
    ZeroUserStake,

    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),
}
