//! Version history: the version-control document and older reports.
//!
//! Both are optional and both are untrusted. Lookups distinguish "nothing
//! recorded" (`Ok(None)`) from "something recorded but ill-typed" (`Err`), so
//! the driver can fall back to unrecorded behaviour and still count the
//! fault.

use crate::versions::{TagSet, tag_multiset, tags_from_value, tags_to_list};
use serde_json::{Map, Value};

const VALUES_KEY: &str = "values";
const VERSIONS_KEY: &str = "versions";
const WORKFLOWS_KEY: &str = "workflows";
const FREEZE_KEY: &str = "freeze";

/// One assay-version's version-control record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControlEntry {
    /// No new versions may be admitted; `workflows` is authoritative.
    pub frozen: bool,
    /// Workflow name → explicit version or list of versions.
    pub workflows: Map<String, Value>,
}

impl ControlEntry {
    /// The workflows table in staged form: every well-typed entry becomes a
    /// sorted list.
    pub fn staged_table(&self) -> Map<String, Value> {
        self.workflows
            .iter()
            .map(|(name, value)| {
                let staged = tags_from_value(value)
                    .map(|tags| tags_to_list(&tags))
                    .unwrap_or_else(|| value.clone());
                (name.clone(), staged)
            })
            .collect()
    }

    /// Mirror a commit into this snapshot.
    pub fn record(&mut self, workflow: &str, tags: &TagSet) {
        self.workflows
            .insert(workflow.to_string(), tags_to_list(tags));
    }
}

/// The version-control document, `{"values": {assay: {"versions": {...}}}}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VersionControl {
    document: Value,
    updated: bool,
}

impl VersionControl {
    pub fn new(document: Value) -> Self {
        Self {
            document,
            updated: false,
        }
    }

    /// Look up the record for one assay-version.
    pub fn entry(&self, assay: &str, version: &str) -> Result<Option<ControlEntry>, String> {
        let root = self
            .document
            .as_object()
            .ok_or_else(|| "version-control root is not an object".to_string())?;
        let Some(node) = child_object(root, VALUES_KEY, "version-control `values`")? else {
            return Ok(None);
        };
        let Some(node) = child_object(node, assay, &format!("version-control assay `{assay}`"))?
        else {
            return Ok(None);
        };
        let Some(node) = child_object(node, VERSIONS_KEY, &format!("`{assay}` versions"))? else {
            return Ok(None);
        };
        let Some(node) = child_object(node, version, &format!("`{assay}` version `{version}`"))?
        else {
            return Ok(None);
        };

        let frozen = node
            .get(FREEZE_KEY)
            .is_some_and(|flag| !matches!(flag, Value::Bool(false) | Value::Null));
        let label = format!("`{assay}/{version}` workflows");
        let workflows = child_object(node, WORKFLOWS_KEY, &label)?
            .cloned()
            .unwrap_or_default();
        Ok(Some(ControlEntry { frozen, workflows }))
    }

    /// Persist a merged version set for one workflow. The entry must already
    /// exist; commits never create assays or versions.
    pub fn commit(
        &mut self,
        assay: &str,
        version: &str,
        workflow: &str,
        tags: &TagSet,
    ) -> Result<(), String> {
        let workflows = self
            .document
            .get_mut(VALUES_KEY)
            .and_then(|node| node.get_mut(assay))
            .and_then(|node| node.get_mut(VERSIONS_KEY))
            .and_then(|node| node.get_mut(version))
            .and_then(|node| node.get_mut(WORKFLOWS_KEY))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| format!("no workflows table to update for {assay}/{version}"))?;
        workflows.insert(workflow.to_string(), tags_to_list(tags));
        self.updated = true;
        Ok(())
    }

    /// Whether any commit happened since load.
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

/// A previously produced report, used as a merge hint only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OlderReport {
    document: Value,
}

impl OlderReport {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// Workflow table previously reported for one assay-version.
    pub fn versions_for(
        &self,
        assay: &str,
        version: &str,
    ) -> Result<Option<&Map<String, Value>>, String> {
        let root = self
            .document
            .as_object()
            .ok_or_else(|| "older report root is not an object".to_string())?;
        let Some(node) = child_object(root, assay, &format!("older report assay `{assay}`"))? else {
            return Ok(None);
        };
        child_object(node, version, &format!("older report `{assay}/{version}`"))
    }
}

/// History that applies to one (assay, version, workflow) key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum History {
    /// Frozen entry: the pinned override for this workflow.
    Frozen(Vec<String>),
    /// Explicit override, sorted with duplicates kept.
    Controlled(Vec<String>),
    /// What an older report listed.
    Prior(TagSet),
    Unrecorded,
}

/// Ill-typed history for one key, with what to use instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct MalformedHistory {
    pub reason: String,
    pub fallback: History,
}

impl History {
    /// Pick the history for `workflow`: a frozen or explicit override first,
    /// then an older report, then nothing.
    pub fn resolve(
        control: Option<&ControlEntry>,
        prior: Option<&Map<String, Value>>,
        workflow: &str,
    ) -> Result<Self, MalformedHistory> {
        // A frozen table pins only the workflows it lists; others fall
        // through to the older report like an unfrozen version would.
        if let Some(entry) = control
            && let Some(value) = entry.workflows.get(workflow)
        {
            return if entry.frozen {
                tag_multiset(value)
                    .map(Self::Frozen)
                    .ok_or_else(|| MalformedHistory {
                        reason: format!("frozen override for `{workflow}` is not a version list"),
                        fallback: Self::Frozen(Vec::new()),
                    })
            } else {
                tag_multiset(value)
                    .map(Self::Controlled)
                    .ok_or_else(|| MalformedHistory {
                        reason: format!("version override for `{workflow}` is not a version list"),
                        fallback: Self::Unrecorded,
                    })
            };
        }

        match prior.and_then(|table| table.get(workflow)) {
            None => Ok(Self::Unrecorded),
            Some(value) => tags_from_value(value)
                .map(Self::Prior)
                .ok_or_else(|| MalformedHistory {
                    reason: format!("older report entry for `{workflow}` is not a version list"),
                    fallback: Self::Unrecorded,
                }),
        }
    }
}

fn child_object<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    label: &str,
) -> Result<Option<&'a Map<String, Value>>, String> {
    match parent.get(key) {
        None => Ok(None),
        Some(Value::Object(child)) => Ok(Some(child)),
        Some(_) => Err(format!("{label} is not an object")),
    }
}
