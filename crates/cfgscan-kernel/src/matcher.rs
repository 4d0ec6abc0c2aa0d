//! Config tree matching.
//!
//! An olive's check tree is a predicate over an assay-version's settings.
//! Branches of the check that the config does not mention are
//! unconstrained; nested mappings must line up and hold recursively; leaves
//! are decided by the selected [`MatchStrategy`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a leaf of the check tree is compared with the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// The config value satisfies the leaf unless it is `false` or `null`.
    #[default]
    Truthy,

    /// The config value must be a list containing the check's literal value.
    ListMembership,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truthy => write!(f, "truthy"),
            Self::ListMembership => write!(f, "list_membership"),
        }
    }
}

impl std::str::FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "truthy" | "scalar" => Ok(Self::Truthy),
            "list_membership" | "list-membership" | "list" => Ok(Self::ListMembership),
            _ => Err(format!("unknown match strategy: {s}")),
        }
    }
}

/// Returns true if every branch of `check` that is present in `config` holds.
pub fn matches(
    config: &Map<String, Value>,
    check: &Map<String, Value>,
    strategy: MatchStrategy,
) -> bool {
    check.iter().all(|(key, expected)| {
        let Some(actual) = config.get(key) else {
            return true;
        };
        match expected {
            Value::Object(nested) => actual
                .as_object()
                .is_some_and(|actual| matches(actual, nested, strategy)),
            leaf => leaf_holds(actual, leaf, strategy),
        }
    })
}

fn leaf_holds(actual: &Value, expected: &Value, strategy: MatchStrategy) -> bool {
    match strategy {
        MatchStrategy::Truthy => !matches!(actual, Value::Bool(false) | Value::Null),
        MatchStrategy::ListMembership => actual
            .as_array()
            .is_some_and(|items| items.contains(expected)),
    }
}
