//! Deterministic JSON output.
//!
//! Reports and staged configs are rewritten on every run and diffed by
//! humans, so identical input must produce identical bytes. Mapping keys are
//! sorted recursively before rendering; list order is left alone.

use crate::error::ScanError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Recursively sort mapping keys.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|left, right| left.0.cmp(right.0));
            let mut sorted = Map::new();
            for (key, child) in entries {
                sorted.insert(key.clone(), canonicalize(child));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        scalar => scalar.clone(),
    }
}

/// Serialize `value` and canonicalize the result.
pub fn to_canonical_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, ScanError> {
    let rendered = serde_json::to_value(value).map_err(|error| ScanError::Serialize {
        what: "value".to_string(),
        message: error.to_string(),
    })?;
    Ok(canonicalize(&rendered))
}

/// Pretty, key-sorted JSON with a trailing newline.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String, ScanError> {
    let canonical = to_canonical_value(value)?;
    let mut rendered =
        serde_json::to_string_pretty(&canonical).map_err(|error| ScanError::Serialize {
            what: "canonical json".to_string(),
            message: error.to_string(),
        })?;
    rendered.push('\n');
    Ok(rendered)
}

/// Write canonical JSON to `path` via a temp file and rename.
pub fn write_canonical_json<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), ScanError> {
    let path = path.as_ref();
    let rendered = to_canonical_string(value)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| ScanError::Storage(format!("{}: {e}", parent.display())))?;
    }

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), ScanError> {
        let file = File::create(&tmp_path)
            .map_err(|e| ScanError::Storage(format!("{}: {e}", tmp_path.display())))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(rendered.as_bytes())
            .map_err(|e| ScanError::Storage(format!("{}: {e}", tmp_path.display())))?;
        writer
            .flush()
            .map_err(|e| ScanError::Storage(format!("{}: {e}", tmp_path.display())))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        ScanError::Storage(format!(
            "{} -> {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}
