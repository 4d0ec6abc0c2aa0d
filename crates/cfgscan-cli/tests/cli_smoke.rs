use serde_json::{Value, json};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "cfgscan-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_cfgscan<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_cfgscan");
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("cfgscan command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_exit_code(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "stdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn read_json(path: &Path) -> Value {
    let raw = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).expect("json")).expect("write json");
}

fn rna_config() -> Value {
    json!({
        "RNA": {
            "reference": "hg38",
            "versions": { "2": { "workflows": { "star": "2.7" } } }
        }
    })
}

/// Writes config, olive records and version file for a run whose olive
/// drifts from the controlled version.
fn write_drift_inputs(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let config = dir.join("config.json");
    let olives = dir.join("olives.json");
    let versions = dir.join("versions.json");
    write_json(&config, &rna_config());
    write_json(
        &olives,
        &json!([{ "names": ["star"], "tags": ["2.8"], "checks": {} }]),
    );
    write_json(
        &versions,
        &json!({
            "values": {
                "RNA": { "versions": { "2": { "workflows": { "star": "2.7" } } } }
            }
        }),
    );
    (config, olives, versions)
}

/// An assay without a reference: one recorded error, and `wf1` is orphaned.
fn write_unreferenced_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let config = dir.join("config.json");
    let olives = dir.join("olives.json");
    write_json(
        &config,
        &json!({ "A": { "versions": { "1": { "foo": true } } } }),
    );
    write_json(
        &olives,
        &json!([{ "names": ["wf1"], "tags": ["2.0"], "checks": { "wf1": { "foo": true } } }]),
    );
    (config, olives)
}

#[test]
fn reconcile_writes_report_staged_config_and_version_file() {
    let tmp = TempDirGuard::new("reconcile");
    let (config, olives, versions) = write_drift_inputs(tmp.path());
    let report = tmp.path().join("out/report.json");
    let staged = tmp.path().join("out/staged.json");

    let output = run_cfgscan([
        OsStr::new("reconcile"),
        OsStr::new("--config"),
        config.as_os_str(),
        OsStr::new("--olives"),
        olives.as_os_str(),
        OsStr::new("--versions"),
        versions.as_os_str(),
        OsStr::new("--out-json"),
        report.as_os_str(),
        OsStr::new("--staged"),
        staged.as_os_str(),
        OsStr::new("--schema-header"),
        OsStr::new("--json"),
    ]);
    assert_success(&output);

    let summary = parse_json_stdout(&output);
    assert_eq!(summary["errors"], 0);
    assert_eq!(summary["assay_count"], 1);
    assert_eq!(summary["version_control_updated"], true);
    assert!(String::from_utf8_lossy(&output.stderr).contains("warning: version file updated"));

    assert_eq!(
        read_json(&report),
        json!({ "RNA": { "reference": "hg38", "2": { "star": ["2.7", "2.8"] } } })
    );
    let staged = read_json(&staged);
    assert_eq!(staged["schema"], 1);
    assert_eq!(staged["kind"], "cfgscan.staged_assay_config.v1");
    assert_eq!(
        staged["values"]["RNA"]["versions"]["2"]["workflows"]["star"],
        json!(["2.7"])
    );
    assert_eq!(
        read_json(&versions)["values"]["RNA"]["versions"]["2"]["workflows"]["star"],
        json!(["2.7", "2.8"])
    );
}

#[test]
fn report_bytes_are_canonical() {
    let tmp = TempDirGuard::new("canonical");
    let (config, olives, _) = write_drift_inputs(tmp.path());
    let report = tmp.path().join("report.json");

    let output = run_cfgscan([
        OsStr::new("reconcile"),
        OsStr::new("--config"),
        config.as_os_str(),
        OsStr::new("--olives"),
        olives.as_os_str(),
        OsStr::new("--out-json"),
        report.as_os_str(),
    ]);
    assert_success(&output);

    let raw = fs::read_to_string(&report).expect("report should be written");
    assert!(raw.ends_with("}\n"));
    let two = raw.find("\"2\"").expect("version key");
    let reference = raw.find("\"reference\"").expect("reference key");
    assert!(two < reference, "keys should be sorted:\n{raw}");
}

#[test]
fn strict_mode_rejects_runs_with_errors() {
    let tmp = TempDirGuard::new("strict");
    let (config, olives) = write_unreferenced_inputs(tmp.path());
    let report = tmp.path().join("report.json");

    let lenient = run_cfgscan([
        OsStr::new("reconcile"),
        OsStr::new("--config"),
        config.as_os_str(),
        OsStr::new("--olives"),
        olives.as_os_str(),
        OsStr::new("--out-json"),
        report.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_success(&lenient);
    let summary = parse_json_stdout(&lenient);
    assert_eq!(summary["errors"], 1);
    assert_eq!(summary["orphans"], json!(["wf1"]));
    assert_eq!(summary["diagnostics"][0]["kind"], "orphaned_olive");

    let strict = run_cfgscan([
        OsStr::new("reconcile"),
        OsStr::new("--config"),
        config.as_os_str(),
        OsStr::new("--olives"),
        olives.as_os_str(),
        OsStr::new("--out-json"),
        report.as_os_str(),
        OsStr::new("--strict"),
    ]);
    assert_exit_code(&strict, 1);
}

#[test]
fn empty_report_is_rejected_without_writing() {
    let tmp = TempDirGuard::new("empty");
    let (config, olives, _) = write_drift_inputs(tmp.path());
    let report = tmp.path().join("report.json");

    let output = run_cfgscan([
        OsStr::new("reconcile"),
        OsStr::new("--config"),
        config.as_os_str(),
        OsStr::new("--olives"),
        olives.as_os_str(),
        OsStr::new("--exclude"),
        OsStr::new("^RNA$"),
        OsStr::new("--out-json"),
        report.as_os_str(),
    ]);
    assert_exit_code(&output, 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("report is empty"));
    assert!(!report.exists());
}

#[test]
fn unknown_strategy_is_an_operational_failure() {
    let tmp = TempDirGuard::new("strategy");
    let (config, olives, _) = write_drift_inputs(tmp.path());

    let output = run_cfgscan([
        OsStr::new("reconcile"),
        OsStr::new("--config"),
        config.as_os_str(),
        OsStr::new("--olives"),
        olives.as_os_str(),
        OsStr::new("--strategy"),
        OsStr::new("fuzzy"),
    ]);
    assert_exit_code(&output, 2);
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown match strategy"));
}

#[test]
fn missing_config_is_an_operational_failure() {
    let tmp = TempDirGuard::new("missing");
    let output = run_cfgscan([
        OsStr::new("reconcile"),
        OsStr::new("--config"),
        tmp.path().join("nope.json").as_os_str(),
        OsStr::new("--olives"),
        tmp.path().join("nope-olives.json").as_os_str(),
    ]);
    assert_exit_code(&output, 2);
}

#[test]
fn orphans_command_lists_unconfigured_workflows() {
    let tmp = TempDirGuard::new("orphans");
    let (config, olives) = write_unreferenced_inputs(tmp.path());

    let output = run_cfgscan([
        OsStr::new("orphans"),
        OsStr::new("--config"),
        config.as_os_str(),
        OsStr::new("--olives"),
        olives.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_exit_code(&output, 1);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["orphans"], json!(["wf1"]));
    assert_eq!(payload["orphan_count"], 1);

    let (config, olives, _) = write_drift_inputs(tmp.path());
    let clean = run_cfgscan([
        OsStr::new("orphans"),
        OsStr::new("--config"),
        config.as_os_str(),
        OsStr::new("--olives"),
        olives.as_os_str(),
    ]);
    assert_success(&clean);
    assert!(String::from_utf8_lossy(&clean.stdout).contains("none"));
}

/// Lays out settings, an olive directory for `clinical`, and an assay config.
fn write_scan_workspace(dir: &Path) -> PathBuf {
    let olive_dir = dir.join("olives/clinical");
    fs::create_dir_all(&olive_dir).expect("olive dir");
    fs::write(
        olive_dir.join("vidarr_rna.shesmu"),
        "Version 1;\nInput cerberus_fp;\n\nOlive\n  Run star_v2_8\n  With {};\n",
    )
    .expect("olive");
    fs::write(olive_dir.join("vidarr_retired.shesmu"), "Olive\n  Run bwaMem_v0_9\n")
        .expect("olive");
    write_json(&dir.join("assays.json"), &json!({ "values": rna_config() }));

    let settings = dir.join("settings.toml");
    fs::write(
        &settings,
        r#"
[instances]
main = "clinical"

[data]
local_olive_dir = "olives"
assay_config_file = "assays.json"

[checks]
blacklist = ["vidarr_retired.shesmu"]
"#,
    )
    .expect("settings");
    settings
}

#[test]
fn scan_runs_the_full_pipeline_and_renders_a_page() {
    let tmp = TempDirGuard::new("scan");
    let settings = write_scan_workspace(tmp.path());
    let report = tmp.path().join("enabled_workflows.json");
    let script = tmp.path().join("report.js");
    let page = tmp.path().join("running_workflows.html");
    fs::write(&script, "populate(readJson());").expect("script");

    let output = run_cfgscan([
        OsStr::new("scan"),
        OsStr::new("--settings"),
        settings.as_os_str(),
        OsStr::new("--instance"),
        OsStr::new("clinical"),
        OsStr::new("--out-json"),
        report.as_os_str(),
        OsStr::new("--jscript"),
        script.as_os_str(),
        OsStr::new("--outpage"),
        page.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_success(&output);

    let summary = parse_json_stdout(&output);
    assert_eq!(summary["errors"], 0);
    assert_eq!(summary["orphans"], json!([]));
    assert_eq!(
        read_json(&report),
        json!({ "RNA": { "reference": "hg38", "2": { "star": "2.8" } } })
    );

    let html = fs::read_to_string(&page).expect("page should be written");
    assert!(html.contains("readJson = function() { return {"));
    assert!(html.contains("<select id=\"assay\"></select>"));
    assert!(html.contains("<select id=\"version\"></select>"));
    assert!(html.contains("<pre id=\"output\"></pre>"));
    assert!(html.contains("populate(readJson());"));
    assert!(html.contains("Updated on: "));
}

#[test]
fn scan_rejects_unconfigured_instances() {
    let tmp = TempDirGuard::new("instance");
    let settings = write_scan_workspace(tmp.path());

    let output = run_cfgscan([
        OsStr::new("scan"),
        OsStr::new("--settings"),
        settings.as_os_str(),
        OsStr::new("--instance"),
        OsStr::new("research"),
    ]);
    assert_exit_code(&output, 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("not configured"));
}

#[test]
fn parse_olives_prints_records() {
    let tmp = TempDirGuard::new("parse");
    let settings = write_scan_workspace(tmp.path());

    let output = run_cfgscan([
        OsStr::new("parse-olives"),
        OsStr::new("--settings"),
        settings.as_os_str(),
        OsStr::new("--instance"),
        OsStr::new("clinical"),
    ]);
    assert_success(&output);

    let records = parse_json_stdout(&output);
    let records = records.as_array().expect("records array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["names"], json!(["star"]));
    assert_eq!(records[0]["tags"], json!(["2.8"]));
    assert!(
        records[0]["olives"][0]
            .as_str()
            .is_some_and(|path| path.ends_with("vidarr_rna.shesmu"))
    );
}
