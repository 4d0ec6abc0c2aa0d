//! TOML run settings.

use cfgscan_kernel::{FilterPatterns, MatchStrategy};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse settings {path}: {message}")]
    Parse { path: String, message: String },

    #[error("instance `{instance}` is not configured (known: {known})")]
    UnknownInstance { instance: String, known: String },

    #[error("invalid checks.assay pattern {pattern:?}: {message}")]
    InvalidCheckPattern { pattern: String, message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Label → instance directory name.
    #[serde(default)]
    pub instances: BTreeMap<String, String>,
    pub data: DataSettings,
    #[serde(default)]
    pub checks: CheckSettings,
    /// Instance → fallback directory under `<olive_dir>/shesmu/`.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub filters: FilterPatterns,
    #[serde(default)]
    pub matching: MatchingSettings,

    /// Directory relative data paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    pub local_olive_dir: PathBuf,
    pub assay_config_file: PathBuf,
    #[serde(default)]
    pub version_file: Option<PathBuf>,
    #[serde(default)]
    pub older_report: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckSettings {
    /// Pattern applied to olive lines that mention assay or project info.
    #[serde(default)]
    pub assay: Option<String>,
    #[serde(default)]
    pub blacklist: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingSettings {
    #[serde(default)]
    pub strategy: MatchStrategy,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut settings = Self::parse(&raw).map_err(|message| SettingsError::Parse {
            path: path.display().to_string(),
            message,
        })?;
        settings.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(settings)
    }

    fn parse(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }

    /// Fails unless `instance` is one of the configured instance directories.
    pub fn require_instance(&self, instance: &str) -> Result<(), SettingsError> {
        if self.instances.values().any(|dir| dir == instance) {
            return Ok(());
        }
        let known: Vec<&str> = self.instances.values().map(String::as_str).collect();
        Err(SettingsError::UnknownInstance {
            instance: instance.to_string(),
            known: if known.is_empty() {
                "none".to_string()
            } else {
                known.join(", ")
            },
        })
    }

    pub fn check_pattern(&self) -> Result<Option<Regex>, SettingsError> {
        self.checks
            .assay
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| SettingsError::InvalidCheckPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn olive_dir(&self) -> PathBuf {
        self.resolve(&self.data.local_olive_dir)
    }

    pub fn assay_config_path(&self) -> PathBuf {
        self.resolve(&self.data.assay_config_file)
    }

    pub fn version_file(&self) -> Option<PathBuf> {
        self.data.version_file.as_deref().map(|p| self.resolve(p))
    }

    pub fn older_report(&self) -> Option<PathBuf> {
        self.data.older_report.as_deref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[instances]
main = "clinical"
research = "research"

[data]
local_olive_dir = "olives"
assay_config_file = "/etc/cfgscan/assays.json"
version_file = "versions.json"

[checks]
assay = 'assay_info\.(?P<workflow>\w+)\.(?P<version>\S+)'
blacklist = ["vidarr_old.shesmu"]

[aliases]
clinical = "cl"

[filters]
include = ["^CAP"]

[matching]
strategy = "list_membership"
"#;

    #[test]
    fn full_settings_parse() {
        let mut settings = Settings::parse(FULL).expect("settings");
        settings.base_dir = PathBuf::from("/srv/scan");

        assert_eq!(settings.olive_dir(), PathBuf::from("/srv/scan/olives"));
        assert_eq!(
            settings.assay_config_path(),
            PathBuf::from("/etc/cfgscan/assays.json")
        );
        assert_eq!(
            settings.version_file(),
            Some(PathBuf::from("/srv/scan/versions.json"))
        );
        assert_eq!(settings.older_report(), None);
        assert_eq!(settings.checks.blacklist, vec!["vidarr_old.shesmu"]);
        assert_eq!(settings.aliases.get("clinical").map(String::as_str), Some("cl"));
        assert_eq!(settings.filters.include, vec!["^CAP"]);
        assert_eq!(settings.matching.strategy, MatchStrategy::ListMembership);
        assert!(settings.check_pattern().expect("pattern").is_some());
    }

    #[test]
    fn optional_sections_default() {
        let settings = Settings::parse(
            r#"
[data]
local_olive_dir = "olives"
assay_config_file = "assays.json"
"#,
        )
        .expect("settings");
        assert!(settings.instances.is_empty());
        assert!(settings.checks.assay.is_none());
        assert_eq!(settings.matching.strategy, MatchStrategy::Truthy);
        assert!(settings.check_pattern().expect("pattern").is_none());
    }

    #[test]
    fn missing_data_section_is_rejected() {
        assert!(Settings::parse("[instances]\nmain = \"clinical\"\n").is_err());
    }

    #[test]
    fn instance_must_be_configured() {
        let settings = Settings::parse(FULL).expect("settings");
        assert!(settings.require_instance("clinical").is_ok());
        let err = settings
            .require_instance("main")
            .expect_err("labels are not instance directories");
        assert!(err.to_string().contains("clinical, research"));
    }

    #[test]
    fn bad_check_pattern_is_reported() {
        let mut settings = Settings::parse(FULL).expect("settings");
        settings.checks.assay = Some("(unclosed".to_string());
        assert!(matches!(
            settings.check_pattern(),
            Err(SettingsError::InvalidCheckPattern { .. })
        ));
    }
}
