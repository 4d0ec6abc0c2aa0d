//! Assay selection by name pattern.

use crate::error::ScanError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Raw include/exclude patterns, as they appear in settings files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPatterns {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl FilterPatterns {
    pub fn compile(&self) -> Result<AssayFilter, ScanError> {
        AssayFilter::new(&self.include, &self.exclude)
    }
}

/// Compiled assay filter. Patterns are unanchored searches; anchor them
/// explicitly to match whole names.
#[derive(Debug, Clone, Default)]
pub struct AssayFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl AssayFilter {
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, ScanError> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// An assay is admitted when it matches some include pattern (or there
    /// are none) and no exclude pattern.
    pub fn admits(&self, assay: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|pattern| pattern.is_match(assay));
        included && !self.exclude.iter().any(|pattern| pattern.is_match(assay))
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, ScanError> {
    patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Regex::new(pattern).map_err(|error| ScanError::InvalidPattern {
                pattern: pattern.to_string(),
                message: error.to_string(),
            })
        })
        .collect()
}
