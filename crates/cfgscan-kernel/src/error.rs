//! Error types for scan runs.
//!
//! Only structurally invalid root inputs are hard errors. Everything else a
//! run can trip over is recorded as a [`Diagnostic`] and the run continues.

use serde::{Deserialize, Serialize};

/// Errors that abort a scan run or its serialization.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The assay configuration or olive records cannot be interpreted at all.
    #[error("fatal input: {0}")]
    FatalInput(String),

    /// An assay filter pattern does not compile.
    #[error("invalid filter pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A value could not be rendered as JSON.
    #[error("failed to serialize {what}: {message}")]
    Serialize { what: String, message: String },

    /// Writing an output file failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Recoverable fault classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The assay has no usable `reference` value.
    MissingReference,
    /// A version-control or older-report entry is absent or ill-typed where
    /// structure was expected.
    MalformedHistory,
    /// Matching or registering one olive/workflow pair failed, or the
    /// assay/version node it belongs to is malformed.
    ItemFailure,
    /// A deployed olive names a workflow no assay configures.
    OrphanedOlive,
}

impl FaultKind {
    /// Whether this fault counts towards [`crate::ScanRun::errors`].
    pub fn is_error(self) -> bool {
        !matches!(self, Self::OrphanedOlive)
    }

    /// Default severity for the fault class.
    pub fn severity(self) -> Severity {
        match self {
            Self::MissingReference | Self::ItemFailure => Severity::Error,
            Self::MalformedHistory | Self::OrphanedOlive => Severity::Warning,
        }
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::MissingReference => "missing_reference",
            Self::MalformedHistory => "malformed_history",
            Self::ItemFailure => "item_failure",
            Self::OrphanedOlive => "orphaned_olive",
        };
        f.write_str(label)
    }
}

/// Severity of a diagnostic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One recovered fault, located as precisely as the driver knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: FaultKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            assay: None,
            version: None,
            workflow: None,
            message: message.into(),
        }
    }

    pub fn at_assay(mut self, assay: &str) -> Self {
        self.assay = Some(assay.to_string());
        self
    }

    pub fn at_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn for_workflow(mut self, workflow: &str) -> Self {
        self.workflow = Some(workflow.to_string());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        let location = [&self.assay, &self.version, &self.workflow]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>();
        if !location.is_empty() {
            write!(f, " [{}]", location.join("/"))?;
        }
        write!(f, ": {}", self.message)
    }
}
