//! Olive rule-file discovery and parsing.
//!
//! Olives are Shesmu scripts. This crate does not understand Shesmu; it
//! extracts just enough by line matching to build [`OliveRecord`]s: which
//! workflows an olive runs (`Run <name>_v<version>` lines) and which
//! assay/project config settings it checks before running them.

pub mod discover;
pub mod parse;

pub use cfgscan_kernel::OliveRecord;
pub use discover::{OLIVE_FILE_PATTERN, collect_olives};
pub use parse::{check_tree_from_path, parse_olive, parse_olive_text, parse_olives};

/// Errors from reading olive files.
#[derive(Debug, thiserror::Error)]
pub enum OliveError {
    #[error("invalid olive glob pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("failed to read olive {path}: {message}")]
    Read { path: String, message: String },
}
