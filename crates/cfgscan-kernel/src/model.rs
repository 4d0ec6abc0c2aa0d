//! Input records: the assay configuration forest and parsed olives.

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Envelope key used by assay-info config files on disk.
const VALUES_KEY: &str = "values";

/// The assay configuration forest, keyed by assay name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssayConfig {
    assays: Map<String, Value>,
}

impl AssayConfig {
    /// Interpret a loaded JSON document as an assay configuration.
    ///
    /// A `{"values": {...}}` envelope is unwrapped. A root that is not a
    /// mapping is fatal.
    pub fn from_value(value: Value) -> Result<Self, ScanError> {
        let mut root = match value {
            Value::Object(root) => root,
            other => {
                return Err(ScanError::FatalInput(format!(
                    "assay config root must be an object, got {}",
                    value_kind(&other)
                )));
            }
        };
        if root.get(VALUES_KEY).is_some_and(Value::is_object)
            && let Some(Value::Object(values)) = root.remove(VALUES_KEY)
        {
            return Ok(Self { assays: values });
        }
        Ok(Self { assays: root })
    }

    pub fn assays(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.assays.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.assays
    }
}

/// One parsed olive: the workflows it runs, at which tags, and under which
/// configuration checks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OliveRecord {
    /// Source files this record was parsed from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub olives: Vec<String>,
    #[serde(default)]
    pub names: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Workflow name → predicate tree. Empty for unconditional olives.
    #[serde(default)]
    pub checks: Map<String, Value>,
}

impl OliveRecord {
    pub fn new<N, T>(names: N, tags: T) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            olives: Vec::new(),
            names: names.into_iter().map(Into::into).collect(),
            tags: tags.into_iter().map(Into::into).collect(),
            checks: Map::new(),
        }
    }

    pub fn with_check(mut self, workflow: impl Into<String>, predicate: Value) -> Self {
        self.checks.insert(workflow.into(), predicate);
        self
    }

    pub fn check_for(&self, workflow: &str) -> Option<&Value> {
        self.checks.get(workflow)
    }

    pub fn is_unconditional(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Interpret a loaded JSON document as a list of olive records.
pub fn olive_records_from_value(value: Value) -> Result<Vec<OliveRecord>, ScanError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ScanError::FatalInput(format!(
                "olive records must be a list, got {}",
                value_kind(&other)
            )));
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|error| {
                ScanError::FatalInput(format!("olive record #{index} is invalid: {error}"))
            })
        })
        .collect()
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
