//! Workflow version values.
//!
//! On disk a version entry is either a bare string or a list of strings.
//! Internally versions travel as a [`TagSet`]; [`Versions`] is the report
//! storage form, where one version is a scalar and several are a sorted list.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Deduplicated, ordered set of version tags.
pub type TagSet = BTreeSet<String>;

/// Report storage form of a workflow's versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Versions {
    One(String),
    Many(Vec<String>),
}

impl Versions {
    /// Build the storage form: `None` for no tags, a scalar for exactly one,
    /// a sorted list otherwise.
    pub fn from_tags(tags: TagSet) -> Option<Self> {
        let mut all: Vec<String> = tags.into_iter().collect();
        match all.len() {
            0 => None,
            1 => all.pop().map(Self::One),
            _ => Some(Self::Many(all)),
        }
    }

    /// The versions as a tag set.
    pub fn tags(&self) -> TagSet {
        match self {
            Self::One(tag) => BTreeSet::from([tag.clone()]),
            Self::Many(tags) => tags.iter().cloned().collect(),
        }
    }
}

/// Coerce a JSON version entry to a tag set.
///
/// A string is a one-element set and a list of strings is its set of
/// elements. Anything else (numbers, mappings, lists with non-string
/// members) is ill-typed and yields `None`.
pub fn tags_from_value(value: &Value) -> Option<TagSet> {
    match value {
        Value::String(tag) => Some(BTreeSet::from([tag.clone()])),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(ToOwned::to_owned))
            .collect(),
        _ => None,
    }
}

/// Like [`tags_from_value`] but keeps duplicates, sorted. Change detection
/// compares against this multiset.
pub fn tag_multiset(value: &Value) -> Option<Vec<String>> {
    let mut tags = match value {
        Value::String(tag) => vec![tag.clone()],
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(ToOwned::to_owned))
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    tags.sort();
    Some(tags)
}

/// Always-list JSON form used by the staged config and version-control file.
pub fn tags_to_list(tags: &TagSet) -> Value {
    Value::Array(tags.iter().cloned().map(Value::String).collect())
}
