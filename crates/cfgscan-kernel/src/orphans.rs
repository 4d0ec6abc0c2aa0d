//! Cross-check of olive workflow names against the assay configuration.

use crate::model::{AssayConfig, OliveRecord};
use serde_json::Value;
use std::collections::BTreeSet;

/// Workflow names deployed olives run that no assay-version configures.
pub fn find_orphans(config: &AssayConfig, olives: &[OliveRecord]) -> BTreeSet<String> {
    let configured = configured_workflows(config);
    olives
        .iter()
        .flat_map(|olive| olive.names.iter())
        .filter(|name| !configured.contains(*name))
        .cloned()
        .collect()
}

/// Every workflow name listed in any assay-version `workflows` table.
/// Ill-typed nodes contribute nothing.
pub fn configured_workflows(config: &AssayConfig) -> BTreeSet<String> {
    config
        .assays()
        .filter_map(|(_, assay)| assay.get("versions").and_then(Value::as_object))
        .flat_map(|versions| versions.values())
        .filter_map(|version| version.get("workflows").and_then(Value::as_object))
        .flat_map(|workflows| workflows.keys().cloned())
        .collect()
}
