pub mod orphans;
pub mod parse_olives;
pub mod reconcile;
pub mod scan;

use crate::support::{EXIT_REJECTED, print_json, write_json_or_exit};
use cfgscan_kernel::{OlderReport, ScanRun, VersionControl};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Where a finished run is written.
pub struct RunOutputs {
    pub report: PathBuf,
    pub staged: Option<PathBuf>,
    pub versions: Option<PathBuf>,
}

pub fn load_version_control(path: Option<&Path>) -> Option<VersionControl> {
    crate::support::load_optional_json_or_exit(path, "version file").map(VersionControl::new)
}

pub fn load_older_report(path: Option<&Path>) -> Option<OlderReport> {
    crate::support::load_optional_json_or_exit(path, "older report").map(OlderReport::new)
}

/// Write the report, staged config and updated version file.
///
/// An empty report is rejected before anything is written, so a broken run
/// never replaces the previous report.
pub fn write_outputs_or_exit(run: &ScanRun, outputs: &RunOutputs) {
    if run.report().is_empty() {
        eprintln!("error: report is empty; no workflows were registered");
        std::process::exit(EXIT_REJECTED);
    }

    write_json_or_exit(&outputs.report, run.report());
    if let Some(path) = &outputs.staged {
        write_json_or_exit(path, &run.staged_document());
    }
    if run.version_control_updated()
        && let (Some(path), Some(control)) = (&outputs.versions, run.version_control())
    {
        warn!(path = %path.display(), "version file updated with new workflow versions");
        eprintln!("warning: version file updated: {}", path.display());
        write_json_or_exit(path, control.document());
    }
}

/// Print the run summary and exit 1 under `--strict` when errors were recorded.
pub fn finish(run: &ScanRun, outputs: &RunOutputs, strict: bool, json_output: bool) {
    let errors = run.errors();
    if json_output {
        print_json(&json!({
            "report_path": outputs.report.display().to_string(),
            "staged_path": outputs.staged.as_ref().map(|p| p.display().to_string()),
            "assay_count": run.report().len(),
            "errors": errors,
            "orphans": run.orphans(),
            "version_control_updated": run.version_control_updated(),
            "diagnostics": run.diagnostics(),
        }));
    } else {
        println!("cfgscan report: {}", outputs.report.display());
        if let Some(path) = &outputs.staged {
            println!("  Staged config: {}", path.display());
        }
        println!("  Assays: {}", run.report().len());
        println!("  Errors: {errors}");
        if !run.orphans().is_empty() {
            println!("  Orphans:");
            for name in run.orphans() {
                println!("    - {name}");
            }
        }
        if !run.diagnostics().is_empty() {
            println!("  Diagnostics:");
            for diagnostic in run.diagnostics() {
                println!("    - {diagnostic}");
            }
        }
    }

    if strict && errors > 0 {
        std::process::exit(EXIT_REJECTED);
    }
}
