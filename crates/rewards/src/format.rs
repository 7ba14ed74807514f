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

//! Human-readable rendering of estimates. This is the only place ratios become floating point.

use alloy_primitives::U256;

use crate::{fixed::FixedNumber, WEI_PER_TOKEN};

/// Format base units as whole tokens with commas, e.g. `1,500 CTSI`. Fractions are truncated.
pub fn format_tokens(base_units: U256, symbol: &str) -> String {
    format!("{} {}", format_with_commas(base_units / WEI_PER_TOKEN), symbol)
}

fn to_f64(value: FixedNumber) -> f64 {
    value.to_string().parse().unwrap_or(f64::NAN)
}

/// Format a ratio as a percentage with two decimals, e.g. `31.54%`.
pub fn format_percent(value: FixedNumber) -> String {
    format!("{:.2}%", to_f64(value) * 100.0)
}

/// Format a U256 number with comma separators
pub fn format_with_commas(num: U256) -> String {
    let s = num.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, ch) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(s: &str) -> U256 {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(wei("1000000000000000000000"), "CTSI"), "1,000 CTSI");
        assert_eq!(format_tokens(wei("1500000000000000000000000"), "CTSI"), "1,500,000 CTSI");
        assert_eq!(format_tokens(wei("788626950526189926000000"), "CTSI"), "788,626 CTSI");
        assert_eq!(format_tokens(U256::ZERO, "CTSI"), "0 CTSI");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent("0.3".parse().unwrap()), "30.00%");
        assert_eq!(format_percent("0.05".parse().unwrap()), "5.00%");
        assert_eq!(format_percent("1.5768".parse().unwrap()), "157.68%");
        assert_eq!(format_percent(FixedNumber::ZERO), "0.00%");
    }

    #[test]
    fn test_format_with_commas() {
        assert_eq!(format_with_commas(U256::ZERO), "0");
        assert_eq!(format_with_commas(U256::from(100u64)), "100");
        assert_eq!(format_with_commas(U256::from(1000u64)), "1,000");
        assert_eq!(format_with_commas(U256::from(100000u64)), "100,000");
        assert_eq!(format_with_commas(U256::from(1234567890u64)), "1,234,567,890");
    }
}
