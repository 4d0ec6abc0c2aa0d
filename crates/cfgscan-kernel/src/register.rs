//! Report and staged-config builder.
//!
//! All writes into the report go through [`ReportBuilder::register`], which
//! merges with whatever is already stored for the key and normalizes the
//! storage form. Staged-config writes go through [`ReportBuilder::stage`].

use crate::versions::{TagSet, Versions, tags_from_value, tags_to_list};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const VERSIONS_KEY: &str = "versions";
const WORKFLOWS_KEY: &str = "workflows";

/// Workflow name → versions, for one assay-version.
pub type WorkflowTable = BTreeMap<String, Versions>;

/// Report node for one assay.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssayReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub versions: BTreeMap<String, WorkflowTable>,
}

/// Assay → report node.
pub type Report = BTreeMap<String, AssayReport>;

/// Accumulates the report and the staged config over one run.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    report: Report,
    staged: Map<String, Value>,
}

impl ReportBuilder {
    /// Start from a deep copy of the assay configuration.
    pub fn new(staged: Map<String, Value>) -> Self {
        Self {
            report: Report::new(),
            staged,
        }
    }

    /// Ensure the assay has a report node.
    pub fn open_assay(&mut self, assay: &str) {
        self.report.entry(assay.to_string()).or_default();
    }

    pub fn set_reference(&mut self, assay: &str, reference: impl Into<String>) {
        self.report.entry(assay.to_string()).or_default().reference = Some(reference.into());
    }

    /// Ensure the assay-version has a (possibly empty) workflow table.
    pub fn open_version(&mut self, assay: &str, version: &str) {
        self.report
            .entry(assay.to_string())
            .or_default()
            .versions
            .entry(version.to_string())
            .or_default();
    }

    /// Merge `versions` into the report entry for the key and return what is
    /// stored afterwards. Nothing is stored when the merged set is empty.
    pub fn register<I>(
        &mut self,
        versions: I,
        assay: &str,
        assay_version: &str,
        workflow: &str,
    ) -> Option<&Versions>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut merged: TagSet = versions.into_iter().map(Into::into).collect();
        let table = self
            .report
            .entry(assay.to_string())
            .or_default()
            .versions
            .entry(assay_version.to_string())
            .or_default();
        if let Some(existing) = table.get(workflow) {
            merged.extend(existing.tags());
        }
        let stored = Versions::from_tags(merged)?;
        table.insert(workflow.to_string(), stored);
        table.get(workflow)
    }

    /// Current report entry for a key.
    pub fn registered(
        &self,
        assay: &str,
        assay_version: &str,
        workflow: &str,
    ) -> Option<&Versions> {
        self.report
            .get(assay)?
            .versions
            .get(assay_version)?
            .get(workflow)
    }

    /// Staged `workflows` table of one assay-version, if it has one.
    pub fn staged_workflows(
        &self,
        assay: &str,
        assay_version: &str,
    ) -> Option<&Map<String, Value>> {
        self.staged
            .get(assay)?
            .get(VERSIONS_KEY)?
            .get(assay_version)?
            .get(WORKFLOWS_KEY)?
            .as_object()
    }

    /// Staged tags for one workflow, if present and well-typed.
    pub fn staged_tags(
        &self,
        assay: &str,
        assay_version: &str,
        workflow: &str,
    ) -> Option<TagSet> {
        self.staged_workflows(assay, assay_version)?
            .get(workflow)
            .and_then(tags_from_value)
    }

    /// Write `tags` as a sorted list into the staged `workflows` table.
    pub fn stage(
        &mut self,
        assay: &str,
        assay_version: &str,
        workflow: &str,
        tags: &TagSet,
    ) -> Result<(), String> {
        let workflows = self.staged_workflows_mut(assay, assay_version)?;
        workflows.insert(workflow.to_string(), tags_to_list(tags));
        Ok(())
    }

    /// Replace the whole staged `workflows` table of one assay-version.
    pub fn replace_staged_workflows(
        &mut self,
        assay: &str,
        assay_version: &str,
        table: Map<String, Value>,
    ) -> Result<(), String> {
        let workflows = self.staged_workflows_mut(assay, assay_version)?;
        *workflows = table;
        Ok(())
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Finish the run: every well-typed staged workflow entry becomes a
    /// sorted list, including entries no olive touched.
    pub fn finish(mut self) -> (Report, Value) {
        for assay in self.staged.values_mut() {
            let Some(versions) = assay.get_mut(VERSIONS_KEY).and_then(Value::as_object_mut) else {
                continue;
            };
            for version in versions.values_mut() {
                let Some(workflows) = version
                    .get_mut(WORKFLOWS_KEY)
                    .and_then(Value::as_object_mut)
                else {
                    continue;
                };
                for entry in workflows.values_mut() {
                    if let Some(tags) = tags_from_value(entry) {
                        *entry = tags_to_list(&tags);
                    }
                }
            }
        }
        (self.report, Value::Object(self.staged))
    }

    fn staged_workflows_mut(
        &mut self,
        assay: &str,
        assay_version: &str,
    ) -> Result<&mut Map<String, Value>, String> {
        let assay_node = self
            .staged
            .entry(assay.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let versions = object_entry(assay_node, VERSIONS_KEY)
            .ok_or_else(|| format!("staged assay `{assay}` is not an object"))?;
        let version_node = versions
            .entry(assay_version.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let version_map = version_node
            .as_object_mut()
            .ok_or_else(|| format!("staged `{assay}/{assay_version}` is not an object"))?;
        version_map
            .entry(WORKFLOWS_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| format!("staged `{assay}/{assay_version}` workflows is not an object"))
    }
}

/// The mapping under `key` in `node`, created if absent. `None` when `node`
/// or the existing child is not a mapping.
fn object_entry<'a>(node: &'a mut Value, key: &str) -> Option<&'a mut Map<String, Value>> {
    node.as_object_mut()?
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
}
