//! Line-level extraction of olive records.

use crate::OliveError;
use cfgscan_kernel::OliveRecord;
use regex::Regex;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Lines that reference config settings mention one of these.
const CHECK_LINE_MARKERS: [&str; 2] = ["assay_info", "project_info"];
const RUN_MARKER: &str = "Run ";

fn run_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\S+)_v(\d+_\d+_*\d*\w*)$").expect("run-line regex must compile")
    })
}

/// Parse one olive file.
pub fn parse_olive(
    path: &Path,
    check_pattern: Option<&Regex>,
) -> Result<OliveRecord, OliveError> {
    let text = fs::read_to_string(path).map_err(|error| OliveError::Read {
        path: path.display().to_string(),
        message: error.to_string(),
    })?;
    let mut record = parse_olive_text(&text, check_pattern);
    if record.names.is_empty() {
        warn!(path = %path.display(), "no Run lines in olive");
    }
    if record.checks.is_empty() {
        debug!(path = %path.display(), "no config checks in olive");
    }
    record.olives.push(path.display().to_string());
    Ok(record)
}

/// Parse every olive in `paths`, in order.
pub fn parse_olives(
    paths: &[PathBuf],
    check_pattern: Option<&Regex>,
) -> Result<Vec<OliveRecord>, OliveError> {
    paths
        .iter()
        .map(|path| parse_olive(path, check_pattern))
        .collect()
}

/// Extract a record from olive source text.
///
/// `Run <name>_v<major>_<minor>[_<patch>...]` lines contribute a workflow
/// name and a tag (underscores become dots). Lines mentioning `assay_info`
/// or `project_info` are matched against `check_pattern`, which must have a
/// `workflow` group and either a `path` group (a dotted setting path, turned
/// into a nested predicate with a `true` leaf) or a `version` group (a
/// scalar predicate).
pub fn parse_olive_text(text: &str, check_pattern: Option<&Regex>) -> OliveRecord {
    let mut record = OliveRecord::default();

    if let Some(pattern) = check_pattern {
        for line in text
            .lines()
            .filter(|line| CHECK_LINE_MARKERS.iter().any(|marker| line.contains(marker)))
        {
            let Some(captures) = pattern.captures(line) else {
                continue;
            };
            let Some(workflow) = captures.name("workflow") else {
                continue;
            };
            let workflow = workflow.as_str().to_string();
            if let Some(path) = captures.name("path") {
                let tree = check_tree_from_path(path.as_str());
                match record.checks.get_mut(&workflow) {
                    Some(existing) => merge_tree(existing, tree),
                    None => {
                        record.checks.insert(workflow, tree);
                    }
                }
            } else if let Some(version) = captures.name("version") {
                record
                    .checks
                    .insert(workflow, Value::String(version.as_str().to_string()));
            }
        }
    }

    for line in text.lines().filter(|line| line.contains(RUN_MARKER)) {
        let Some(captures) = run_line_re().captures(line.trim_end()) else {
            continue;
        };
        let name = captures[1].to_string();
        let tag = captures[2].replace('_', ".");
        if let Some(Value::String(checked)) = record.checks.get(&name)
            && *checked != tag
        {
            warn!(
                workflow = %name,
                checked = %checked,
                runs = %tag,
                "config check does not use the version the olive runs"
            );
        }
        record.names.insert(name);
        record.tags.insert(tag);
    }

    record
}

/// `"a.b.c"` → `{"a": {"b": {"c": true}}}`. Empty segments are skipped.
pub fn check_tree_from_path(path: &str) -> Value {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .rev()
        .fold(None, |inner: Option<Value>, segment| {
            let mut node = Map::new();
            node.insert(segment.to_string(), inner.unwrap_or(Value::Bool(true)));
            Some(Value::Object(node))
        })
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Deep-merge mappings; anything else is replaced by `incoming`.
fn merge_tree(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(target), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match target.get_mut(&key) {
                    Some(existing) => merge_tree(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}
