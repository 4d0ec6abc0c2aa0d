use crate::settings::Settings;
use cfgscan_kernel::{
    AssayConfig, OliveRecord, olive_records_from_value, to_canonical_string, write_canonical_json,
};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// Exit status for I/O, parse and configuration failures.
pub const EXIT_FAILURE: i32 = 2;
/// Exit status for runs that completed but are rejected.
pub const EXIT_REJECTED: i32 = 1;

pub fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(EXIT_FAILURE);
}

pub fn load_json_or_exit(path: &Path, what: &str) -> Value {
    let raw = fs::read_to_string(path).unwrap_or_else(|e| {
        fail(format!("failed to read {what} {}: {e}", path.display()));
    });
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        fail(format!("failed to parse {what} {}: {e}", path.display()));
    })
}

/// Missing history files are treated as empty history.
pub fn load_optional_json_or_exit(path: Option<&Path>, what: &str) -> Option<Value> {
    let path = path?;
    if !path.exists() {
        info!(path = %path.display(), "{what} not found; continuing without it");
        return None;
    }
    Some(load_json_or_exit(path, what))
}

pub fn load_config_or_exit(path: &Path) -> AssayConfig {
    AssayConfig::from_value(load_json_or_exit(path, "assay config")).unwrap_or_else(|e| {
        fail(format!("{}: {e}", path.display()));
    })
}

pub fn load_olive_records_or_exit(path: &Path) -> Vec<OliveRecord> {
    olive_records_from_value(load_json_or_exit(path, "olive records")).unwrap_or_else(|e| {
        fail(format!("{}: {e}", path.display()));
    })
}

pub fn load_settings_or_exit(path: &Path, instance: &str) -> Settings {
    let settings = Settings::load(path).unwrap_or_else(|e| fail(e));
    if let Err(e) = settings.require_instance(instance) {
        eprintln!("error: {e}");
        std::process::exit(EXIT_REJECTED);
    }
    settings
}

pub fn write_json_or_exit<T: Serialize + ?Sized>(path: &Path, value: &T) {
    write_canonical_json(path, value).unwrap_or_else(|e| {
        fail(format!("failed to write {}: {e}", path.display()));
    });
}

pub fn to_canonical_or_exit<T: Serialize + ?Sized>(value: &T) -> String {
    to_canonical_string(value).unwrap_or_else(|e| fail(e))
}

pub fn print_json(payload: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(payload).expect("json serialization")
    );
}
