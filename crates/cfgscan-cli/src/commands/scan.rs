use super::{RunOutputs, finish, load_older_report, load_version_control, write_outputs_or_exit};
use crate::render::render_page;
use crate::support::{fail, load_config_or_exit, load_settings_or_exit, to_canonical_or_exit};
use cfgscan_kernel::{ConfigScanner, ScanOptions};
use cfgscan_olive::{collect_olives, parse_olives};
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub struct Args {
    pub settings: String,
    pub instance: String,
    pub versions: Option<String>,
    pub older_report: Option<String>,
    pub out_json: String,
    pub staged: Option<String>,
    pub schema_header: bool,
    pub jscript: Option<String>,
    pub outpage: String,
    pub strict: bool,
    pub json: bool,
}

pub fn run(args: Args) {
    let settings = load_settings_or_exit(&PathBuf::from(&args.settings), &args.instance);
    let check_pattern = settings.check_pattern().unwrap_or_else(|e| fail(e));
    let filter = settings.filters.compile().unwrap_or_else(|e| fail(e));

    let olive_paths = collect_olives(
        &settings.olive_dir(),
        &args.instance,
        &settings.checks.blacklist,
        &settings.aliases,
    )
    .unwrap_or_else(|e| fail(e));
    let olives = parse_olives(&olive_paths, check_pattern.as_ref()).unwrap_or_else(|e| fail(e));
    info!(
        instance = %args.instance,
        olives = olive_paths.len(),
        "parsed olives"
    );

    let config = load_config_or_exit(&settings.assay_config_path());
    let versions_path = args.versions.map(PathBuf::from).or_else(|| settings.version_file());
    let older_path = args
        .older_report
        .map(PathBuf::from)
        .or_else(|| settings.older_report());

    let mut scanner = ConfigScanner::new(ScanOptions {
        strategy: settings.matching.strategy,
        filter,
        schema_header: args.schema_header,
    });
    if let Some(control) = load_version_control(versions_path.as_deref()) {
        scanner = scanner.with_version_control(control);
    }
    if let Some(older) = load_older_report(older_path.as_deref()) {
        scanner = scanner.with_older_report(older);
    }
    let run = scanner.run(&config, &olives);

    let outputs = RunOutputs {
        report: PathBuf::from(&args.out_json),
        staged: args.staged.map(PathBuf::from),
        versions: versions_path,
    };
    write_outputs_or_exit(&run, &outputs);

    if let Some(script_path) = &args.jscript {
        let script = fs::read_to_string(script_path)
            .unwrap_or_else(|e| fail(format!("failed to read script {script_path}: {e}")));
        let report_json = to_canonical_or_exit(run.report());
        let today = chrono::Local::now().date_naive();
        let page = render_page(&report_json, &script, &args.instance, today);
        fs::write(&args.outpage, page)
            .unwrap_or_else(|e| fail(format!("failed to write {}: {e}", args.outpage)));
    }

    finish(&run, &outputs, args.strict, args.json);
}
