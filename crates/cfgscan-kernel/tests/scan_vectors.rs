//! Integration tests: run the scan fixture vectors.
//!
//! Each fixture in tests/fixtures/ has:
//! - case.json: assay config, olive records, and optional history/filters
//! - expect.json: the expected report, staged config, and run counters
//!
//! The expected report is also compared byte-for-byte after canonical
//! rendering, so key ordering regressions show up here.

use cfgscan_kernel::{
    AssayConfig, ConfigScanner, FilterPatterns, MatchStrategy, OlderReport, Report, ScanOptions,
    VersionControl, olive_records_from_value, to_canonical_string,
};
use serde_json::Value;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(path: PathBuf) -> Value {
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}

fn run_fixture(name: &str) {
    let dir = fixtures_dir().join(name);
    let case = load(dir.join("case.json"));
    let expected = load(dir.join("expect.json"));

    let config = AssayConfig::from_value(case["config"].clone()).expect("fixture config");
    let olives = olive_records_from_value(case["olives"].clone()).expect("fixture olives");

    let strategy = case["strategy"]
        .as_str()
        .map(|raw| raw.parse::<MatchStrategy>().expect("fixture strategy"))
        .unwrap_or_default();
    let filter = match case.get("filters") {
        Some(raw) => serde_json::from_value::<FilterPatterns>(raw.clone())
            .expect("fixture filters")
            .compile()
            .expect("fixture filter patterns"),
        None => Default::default(),
    };

    let mut scanner = ConfigScanner::new(ScanOptions {
        strategy,
        filter,
        schema_header: false,
    });
    if let Some(document) = case.get("versionControl") {
        scanner = scanner.with_version_control(VersionControl::new(document.clone()));
    }
    if let Some(document) = case.get("olderReport") {
        scanner = scanner.with_older_report(OlderReport::new(document.clone()));
    }
    let run = scanner.run(&config, &olives);

    let report = serde_json::to_value(run.report()).expect("report serializes");
    assert_eq!(
        report,
        expected["report"],
        "\n\nFixture: {name}\n\nGot report:\n{}\n",
        serde_json::to_string_pretty(&report).unwrap(),
    );
    assert_eq!(
        run.staged_config(),
        &expected["staged"],
        "\n\nFixture: {name}\n\nGot staged:\n{}\n",
        serde_json::to_string_pretty(run.staged_config()).unwrap(),
    );
    assert_eq!(
        run.errors() as u64,
        expected["errors"].as_u64().expect("errors"),
        "Fixture: {name}: diagnostics {:?}",
        run.diagnostics()
    );
    let orphans: Vec<&str> = expected["orphans"]
        .as_array()
        .expect("orphans")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(
        run.orphans().iter().map(String::as_str).collect::<Vec<_>>(),
        orphans,
        "Fixture: {name}"
    );
    assert_eq!(
        run.version_control_updated(),
        expected["versionControlUpdated"].as_bool().expect("versionControlUpdated"),
        "Fixture: {name}"
    );
    if let Some(document) = expected.get("versionControl") {
        assert_eq!(
            run.version_control().map(VersionControl::document),
            Some(document),
            "Fixture: {name}"
        );
    }

    // Reloading the rendered report gives back the same report.
    let rendered = to_canonical_string(run.report()).expect("canonical report");
    let reloaded: Report = serde_json::from_str(&rendered).expect("report reloads");
    assert_eq!(&reloaded, run.report(), "Fixture: {name}");
    assert_eq!(
        to_canonical_string(&reloaded).expect("canonical report"),
        rendered,
        "Fixture: {name}"
    );
}

#[test]
fn end_to_end_check_satisfied() {
    run_fixture("end_to_end_check_satisfied");
}

#[test]
fn conflicting_unconditional_olives() {
    run_fixture("conflicting_unconditional_olives");
}

#[test]
fn frozen_assay_version() {
    run_fixture("frozen_assay_version");
}

#[test]
fn version_control_drift() {
    run_fixture("version_control_drift");
}

#[test]
fn list_membership_strategy() {
    run_fixture("list_membership_strategy");
}

#[test]
fn filtered_assays() {
    run_fixture("filtered_assays");
}

#[test]
fn repeated_runs_render_identical_bytes() {
    let dir = fixtures_dir().join("frozen_assay_version");
    let case = load(dir.join("case.json"));
    let config = AssayConfig::from_value(case["config"].clone()).expect("fixture config");
    let olives = olive_records_from_value(case["olives"].clone()).expect("fixture olives");

    let render = || {
        let run = ConfigScanner::new(ScanOptions::default())
            .with_version_control(VersionControl::new(case["versionControl"].clone()))
            .run(&config, &olives);
        (
            to_canonical_string(run.report()).expect("report"),
            to_canonical_string(&run.staged_document()).expect("staged"),
        )
    };
    assert_eq!(render(), render());
}
