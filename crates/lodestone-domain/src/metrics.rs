//! Derived-metric computation
//!
//! Turns a member payload's raw mining counters into a level, a node budget
//! and per-resource balances. Everything here is pure and deterministic: the
//! same payload always yields the same [`MemberMetrics`].
//!
//! ## Level
//!
//! [`LEVEL_INCREMENTS`] lists the experience needed for each level-up. Its
//! running sum gives the cumulative thresholds; the level is the number of
//! thresholds strictly below the experience. Experience past the last
//! threshold stays at the table's maximum level.
//!
//! ## Budget
//!
//! [`BUDGET_TABLE`] gives the cumulative budget per level. The
//! [`BONUS_NODE`] adds one point for each of its levels 1, 5 and 7 that are
//! reached, and two points at level 10.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Experience needed for each successive level-up
pub const LEVEL_INCREMENTS: [u64; 10] = [
    0, 3_000, 9_000, 25_000, 60_000, 100_000, 150_000, 210_000, 290_000, 400_000,
];

/// Cumulative budget granted at each level
pub const BUDGET_TABLE: [u32; 10] = [1, 3, 5, 7, 9, 11, 14, 16, 18, 20];

/// Node whose level grants bonus budget
pub const BONUS_NODE: &str = "special_0";

/// (node level reached, bonus granted)
const BONUS_STEPS: [(i64, u32); 4] = [(1, 1), (5, 1), (7, 1), (10, 2)];

/// Key of the nested object holding the counters inside a member payload
pub const MINING_CORE_KEY: &str = "mining_core";

/// Highest level the table can express
pub const MAX_LEVEL: u32 = LEVEL_INCREMENTS.len() as u32;

/// Errors raised while reading a member payload
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// A field exists but has the wrong JSON type
    #[error("Field '{field}' must be {expected}")]
    InvalidField {
        /// Dotted path of the field
        field: String,
        /// Expected shape
        expected: &'static str,
    },
}

/// Resource kinds tracked per member, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Mithril powder
    Mithril,
    /// Gemstone powder
    Gemstone,
    /// Glacite powder
    Glacite,
}

impl ResourceKind {
    /// All kinds in output order
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Mithril,
        ResourceKind::Gemstone,
        ResourceKind::Glacite,
    ];

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Mithril => "mithril",
            ResourceKind::Gemstone => "gemstone",
            ResourceKind::Glacite => "glacite",
        }
    }

    /// Payload key of the owned counter
    pub fn owned_key(&self) -> String {
        format!("powder_{}", self.as_str())
    }

    /// Payload key of the consumed counter
    pub fn consumed_key(&self) -> String {
        format!("powder_spent_{}", self.as_str())
    }
}

/// Owned/consumed/total triple for one resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBalance {
    /// Which resource
    pub kind: ResourceKind,
    /// Currently held
    pub owned: u64,
    /// Already spent elsewhere
    pub consumed: u64,
    /// `owned + consumed`
    pub total: u64,
}

impl ResourceBalance {
    /// Build a balance, deriving the total
    pub fn new(kind: ResourceKind, owned: u64, consumed: u64) -> Self {
        Self {
            kind,
            owned,
            consumed,
            total: owned.saturating_add(consumed),
        }
    }
}

/// Metrics derived from one member payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMetrics {
    /// Level from experience
    pub level: u32,
    /// Numeric node levels keyed by node name
    pub node_levels: BTreeMap<String, i64>,
    /// Balances in [`ResourceKind::ALL`] order
    pub resources: Vec<ResourceBalance>,
    /// Budget for `level` plus the bonus node's contribution
    pub budget: u32,
}

impl MemberMetrics {
    /// Compute metrics from already-extracted inputs
    pub fn compute(
        experience: f64,
        node_levels: BTreeMap<String, i64>,
        resources: Vec<ResourceBalance>,
    ) -> Self {
        let level = level_from_experience(experience);
        let budget = budget_for(level, &node_levels);
        Self {
            level,
            node_levels,
            resources,
            budget,
        }
    }

    /// Compute metrics from a raw member payload
    ///
    /// A payload without a `mining_core` object yields the all-zero metrics
    /// of a member that never progressed. Node entries that are not integers
    /// (upstream mixes toggle flags into the node map) are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidField`] when a counter, the experience
    /// or the node map has the wrong JSON type.
    pub fn from_member(payload: &Value) -> Result<Self, MetricsError> {
        let core = match payload.get(MINING_CORE_KEY) {
            None | Some(Value::Null) => return Ok(Self::compute(0.0, BTreeMap::new(), zero_resources())),
            Some(Value::Object(core)) => core,
            Some(_) => {
                return Err(MetricsError::InvalidField {
                    field: MINING_CORE_KEY.to_string(),
                    expected: "an object",
                })
            }
        };

        let experience = match core.get("experience") {
            None | Some(Value::Null) => 0.0,
            Some(value) => value.as_f64().ok_or_else(|| MetricsError::InvalidField {
                field: format!("{}.experience", MINING_CORE_KEY),
                expected: "a number",
            })?,
        };

        let node_levels = match core.get("nodes") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(nodes)) => nodes
                .iter()
                .filter_map(|(name, level)| level.as_i64().map(|l| (name.clone(), l)))
                .collect(),
            Some(_) => {
                return Err(MetricsError::InvalidField {
                    field: format!("{}.nodes", MINING_CORE_KEY),
                    expected: "an object",
                })
            }
        };

        let resources = ResourceKind::ALL
            .iter()
            .map(|kind| {
                let owned = read_counter(core, &kind.owned_key())?;
                let consumed = read_counter(core, &kind.consumed_key())?;
                Ok(ResourceBalance::new(*kind, owned, consumed))
            })
            .collect::<Result<Vec<_>, MetricsError>>()?;

        Ok(Self::compute(experience, node_levels, resources))
    }
}

fn zero_resources() -> Vec<ResourceBalance> {
    ResourceKind::ALL
        .iter()
        .map(|kind| ResourceBalance::new(*kind, 0, 0))
        .collect()
}

/// Read a non-negative integer counter, defaulting to 0 when absent
fn read_counter(core: &serde_json::Map<String, Value>, key: &str) -> Result<u64, MetricsError> {
    match core.get(key) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value
            .as_u64()
            .or_else(|| {
                // Counters occasionally arrive as whole floats (e.g. 2080.0)
                value
                    .as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .ok_or_else(|| MetricsError::InvalidField {
                field: format!("{}.{}", MINING_CORE_KEY, key),
                expected: "a non-negative integer",
            }),
    }
}

/// Running sum of [`LEVEL_INCREMENTS`]
pub fn cumulative_thresholds() -> [u64; 10] {
    let mut thresholds = [0u64; 10];
    let mut sum = 0;
    for (slot, increment) in thresholds.iter_mut().zip(LEVEL_INCREMENTS) {
        sum += increment;
        *slot = sum;
    }
    thresholds
}

/// Level reached with the given experience
///
/// Equal to a threshold does not yet count; the experience must be strictly
/// greater. Negative or NaN experience is level 0.
///
/// # Examples
///
/// ```
/// use lodestone_domain::metrics::level_from_experience;
///
/// assert_eq!(level_from_experience(0.0), 0);
/// assert_eq!(level_from_experience(3_000.0), 1);
/// assert_eq!(level_from_experience(3_001.0), 2);
/// ```
pub fn level_from_experience(experience: f64) -> u32 {
    cumulative_thresholds()
        .iter()
        .take_while(|&&threshold| experience > threshold as f64)
        .count() as u32
}

/// Bonus budget granted by the bonus node's level
pub fn bonus_for(node_level: i64) -> u32 {
    BONUS_STEPS
        .iter()
        .filter(|(required, _)| node_level >= *required)
        .map(|(_, bonus)| bonus)
        .sum()
}

/// Budget for a level given the member's node levels
///
/// Levels past the end of [`BUDGET_TABLE`] use its last entry.
pub fn budget_for(level: u32, node_levels: &BTreeMap<String, i64>) -> u32 {
    let index = (level as usize).min(BUDGET_TABLE.len() - 1);
    let bonus_level = node_levels.get(BONUS_NODE).copied().unwrap_or(0);
    BUDGET_TABLE[index] + bonus_for(bonus_level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_cumulative_thresholds() {
        assert_eq!(
            cumulative_thresholds(),
            [0, 3_000, 12_000, 37_000, 97_000, 197_000, 347_000, 557_000, 847_000, 1_247_000]
        );
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(level_from_experience(0.0), 0);
        assert_eq!(level_from_experience(1.0), 1);
        assert_eq!(level_from_experience(3_000.0), 1);
        assert_eq!(level_from_experience(3_001.0), 2);
        assert_eq!(level_from_experience(12_000.0), 2);
        assert_eq!(level_from_experience(1_247_000.0), 9);
        assert_eq!(level_from_experience(1_247_001.0), MAX_LEVEL);
    }

    #[test]
    fn test_level_clamps_past_table() {
        assert_eq!(level_from_experience(50_000_000.0), MAX_LEVEL);
        assert_eq!(level_from_experience(f64::MAX), MAX_LEVEL);
    }

    #[test]
    fn test_level_degenerate_input() {
        assert_eq!(level_from_experience(-5.0), 0);
        assert_eq!(level_from_experience(f64::NAN), 0);
    }

    #[test]
    fn test_bonus_steps() {
        assert_eq!(bonus_for(0), 0);
        assert_eq!(bonus_for(1), 1);
        assert_eq!(bonus_for(4), 1);
        assert_eq!(bonus_for(5), 2);
        assert_eq!(bonus_for(7), 3);
        assert_eq!(bonus_for(9), 3);
        assert_eq!(bonus_for(10), 5);
        assert_eq!(bonus_for(63), 5);
    }

    #[test]
    fn test_documented_budget_example() {
        // Level 5 with the bonus node at 4; efficient_miner's 63 must not count.
        let nodes: BTreeMap<String, i64> = [
            ("efficient_miner".to_string(), 63),
            ("special_0".to_string(), 4),
            ("mining_speed".to_string(), 14),
        ]
        .into_iter()
        .collect();
        assert_eq!(budget_for(5, &nodes), 12);
    }

    #[test]
    fn test_budget_clamps_past_table() {
        let nodes = BTreeMap::new();
        assert_eq!(budget_for(0, &nodes), 1);
        assert_eq!(budget_for(9, &nodes), 20);
        assert_eq!(budget_for(MAX_LEVEL, &nodes), 20);
    }

    #[test]
    fn test_from_member_documented_payload() {
        let payload = json!({
            "player_id": "b876ec32e396476ba1158438d83c67d4",
            "mining_core": {
                "nodes": {
                    "mining_speed": 14,
                    "efficient_miner": 63,
                    "special_0": 4,
                    "toggle_mining_speed_boost": false
                },
                "experience": 150_000,
                "powder_mithril": 49_791,
                "powder_spent_mithril": 936_586,
                "powder_gemstone": 2_080,
                "powder_spent_gemstone": 0
            }
        });

        let metrics = MemberMetrics::from_member(&payload).unwrap();
        assert_eq!(metrics.level, 5);
        assert_eq!(metrics.budget, 12);
        assert_eq!(metrics.node_levels.len(), 3);
        assert!(!metrics.node_levels.contains_key("toggle_mining_speed_boost"));

        assert_eq!(
            metrics.resources,
            vec![
                ResourceBalance::new(ResourceKind::Mithril, 49_791, 936_586),
                ResourceBalance::new(ResourceKind::Gemstone, 2_080, 0),
                ResourceBalance::new(ResourceKind::Glacite, 0, 0),
            ]
        );
        assert_eq!(metrics.resources[0].total, 986_377);
    }

    #[test]
    fn test_from_member_without_core() {
        let metrics = MemberMetrics::from_member(&json!({"player_id": "x"})).unwrap();
        assert_eq!(metrics.level, 0);
        assert_eq!(metrics.budget, 1);
        assert!(metrics.node_levels.is_empty());
        assert_eq!(metrics.resources.len(), 3);
        assert!(metrics.resources.iter().all(|r| r.total == 0));
    }

    #[test]
    fn test_from_member_rejects_bad_types() {
        let err = MemberMetrics::from_member(&json!({"mining_core": 3})).unwrap_err();
        assert_eq!(
            err,
            MetricsError::InvalidField {
                field: "mining_core".to_string(),
                expected: "an object"
            }
        );

        let err = MemberMetrics::from_member(&json!({
            "mining_core": {"powder_glacite": "lots"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("mining_core.powder_glacite"));

        let err = MemberMetrics::from_member(&json!({
            "mining_core": {"experience": "a lot"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("experience"));
    }

    #[test]
    fn test_from_member_accepts_whole_floats() {
        let metrics = MemberMetrics::from_member(&json!({
            "mining_core": {"powder_mithril": 10.0, "powder_spent_mithril": 5}
        }))
        .unwrap();
        assert_eq!(metrics.resources[0].total, 15);
    }

    proptest! {
        #[test]
        fn prop_level_is_monotone(a in 0u64..2_000_000, b in 0u64..2_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_from_experience(lo as f64) <= level_from_experience(hi as f64));
        }

        #[test]
        fn prop_level_is_bounded(xp in any::<f64>()) {
            prop_assert!(level_from_experience(xp) <= MAX_LEVEL);
        }

        #[test]
        fn prop_budget_never_below_base(level in 0u32..=MAX_LEVEL, node in -5i64..100) {
            let nodes: BTreeMap<String, i64> =
                [(BONUS_NODE.to_string(), node)].into_iter().collect();
            let base = BUDGET_TABLE[(level as usize).min(BUDGET_TABLE.len() - 1)];
            let budget = budget_for(level, &nodes);
            prop_assert!(budget >= base && budget <= base + 5);
        }
    }
}
