use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of changing or removing a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller counts feeding [`calculate_risk`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskInput {
    pub direct_count: usize,
    pub indirect_count: usize,
}

const HIGH_DIRECT: usize = 5;
const HIGH_TOTAL: usize = 10;
const MEDIUM_DIRECT: usize = 2;
const MEDIUM_TOTAL: usize = 3;

/// Classifies risk from caller counts.
///
/// Both thresholds are `>=` comparisons on non-decreasing quantities, so the
/// result never drops when callers are added.
pub fn calculate_risk(input: RiskInput) -> RiskLevel {
    let total = input.direct_count + input.indirect_count;
    if input.direct_count >= HIGH_DIRECT || total >= HIGH_TOTAL {
        RiskLevel::High
    } else if input.direct_count >= MEDIUM_DIRECT || total >= MEDIUM_TOTAL {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(direct_count: usize, indirect_count: usize) -> RiskLevel {
        calculate_risk(RiskInput {
            direct_count,
            indirect_count,
        })
    }

    #[test]
    fn reference_cases() {
        assert_eq!(risk(10, 20), RiskLevel::High);
        assert_eq!(risk(3, 5), RiskLevel::Medium);
        assert_eq!(risk(1, 0), RiskLevel::Low);
        assert_eq!(risk(0, 0), RiskLevel::Low);
        assert_eq!(risk(5, 0), RiskLevel::High);
    }

    #[test]
    fn large_indirect_count_elevates_low_direct() {
        assert!(risk(1, 10) >= RiskLevel::Medium);
        assert_eq!(risk(0, 3), RiskLevel::Medium);
        assert_eq!(risk(1, 1), RiskLevel::Low);
    }

    #[test]
    fn monotonic_in_both_counts() {
        for direct in 0..15 {
            for indirect in 0..15 {
                let base = risk(direct, indirect);
                assert!(risk(direct + 1, indirect) >= base, "direct {direct}/{indirect}");
                assert!(risk(direct, indirect + 1) >= base, "indirect {direct}/{indirect}");
            }
        }
    }
}
