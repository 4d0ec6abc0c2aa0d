//! Finding olive files for one Shesmu instance.

use crate::OliveError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Olives that launch Vidarr workflows.
pub const OLIVE_FILE_PATTERN: &str = "vidarr*.shesmu";

/// Collect olive files for `instance` under `olive_dir`.
///
/// Looks in `<olive_dir>/<instance>` first. When that holds no olives and
/// `aliases` maps the instance to another directory name, falls back to
/// `<olive_dir>/shesmu/<alias>`. Files whose names are in `blacklist` are
/// dropped. The result is sorted.
pub fn collect_olives(
    olive_dir: &Path,
    instance: &str,
    blacklist: &[String],
    aliases: &BTreeMap<String, String>,
) -> Result<Vec<PathBuf>, OliveError> {
    if !olive_dir.is_dir() {
        debug!(dir = %olive_dir.display(), "olive directory does not exist");
        return Ok(Vec::new());
    }

    let mut found = glob_olives(&olive_dir.join(instance))?;
    if found.is_empty()
        && let Some(alias) = aliases.get(instance)
    {
        found = glob_olives(&olive_dir.join("shesmu").join(alias))?;
    }
    info!(instance, count = found.len(), "collected olive files");

    let mut kept: Vec<PathBuf> = found
        .into_iter()
        .filter(|path| {
            let blocked = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| blacklist.iter().any(|entry| entry == name));
            if blocked {
                debug!(path = %path.display(), "olive is blacklisted");
            }
            !blocked
        })
        .collect();
    kept.sort();
    Ok(kept)
}

fn glob_olives(dir: &Path) -> Result<Vec<PathBuf>, OliveError> {
    let pattern = dir.join(OLIVE_FILE_PATTERN);
    let pattern = pattern.to_string_lossy();
    let entries = glob::glob(&pattern).map_err(|error| OliveError::Pattern {
        pattern: pattern.to_string(),
        message: error.to_string(),
    })?;
    Ok(entries.filter_map(Result::ok).collect())
}
