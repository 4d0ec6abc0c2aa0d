//! # cfgscan kernel
//!
//! The reconciliation engine: decides, for every (assay, assay-version), the
//! set of workflow name → version(s) that will actually run, given the assay
//! configuration tree and the olives deployed against it.
//!
//! The kernel performs no discovery and no file parsing of olives. It takes
//! already-structured inputs and produces a report plus a staged copy of the
//! assay configuration.
//!
//! ## Architecture
//!
//! ```text
//! matcher        ← does an olive's check tree hold for an assay-version?
//!     │
//! history        ← version-control entries and older reports, per key
//!     │
//! vetter         ← merge olive tags against history, flag drift
//!     │
//! register       ← report/staged-config builder (scalar vs list storage)
//!     │
//! scanner        ← assays × versions × olives × workflow names
//!     │
//! canonical      ← recursive key sort, deterministic JSON output
//! ```
//!
//! `orphans` and `filter` sit beside the driver: the former is a read-only
//! cross-check of olive names against the configuration, the latter selects
//! which assays a run covers.

pub mod canonical;
pub mod error;
pub mod filter;
pub mod history;
pub mod matcher;
pub mod model;
pub mod orphans;
pub mod register;
pub mod scanner;
pub mod versions;
pub mod vetter;

pub use canonical::{canonicalize, to_canonical_string, write_canonical_json};
pub use error::{Diagnostic, FaultKind, ScanError, Severity};
pub use filter::{AssayFilter, FilterPatterns};
pub use history::{ControlEntry, History, MalformedHistory, OlderReport, VersionControl};
pub use matcher::{MatchStrategy, matches};
pub use model::{AssayConfig, OliveRecord, olive_records_from_value};
pub use orphans::find_orphans;
pub use register::{AssayReport, Report, ReportBuilder};
pub use scanner::{ConfigScanner, ItemOutcome, STAGED_CONFIG_KIND, ScanOptions, ScanRun};
pub use versions::{TagSet, Versions};
pub use vetter::{VetSource, Vetting, vet};
