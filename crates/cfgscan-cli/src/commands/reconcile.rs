use super::{RunOutputs, finish, load_older_report, load_version_control, write_outputs_or_exit};
use crate::support::{fail, load_config_or_exit, load_olive_records_or_exit};
use cfgscan_kernel::{AssayFilter, ConfigScanner, MatchStrategy, ScanOptions};
use std::path::{Path, PathBuf};

pub struct Args {
    pub config: String,
    pub olives: String,
    pub versions: Option<String>,
    pub older_report: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub strategy: String,
    pub out_json: String,
    pub staged: Option<String>,
    pub schema_header: bool,
    pub strict: bool,
    pub json: bool,
}

pub fn run(args: Args) {
    let strategy: MatchStrategy = args.strategy.parse().unwrap_or_else(|e: String| fail(e));
    let filter = AssayFilter::new(&args.include, &args.exclude).unwrap_or_else(|e| fail(e));
    let config = load_config_or_exit(&PathBuf::from(&args.config));
    let olives = load_olive_records_or_exit(&PathBuf::from(&args.olives));
    let versions_path = args.versions.map(PathBuf::from);

    let mut scanner = ConfigScanner::new(ScanOptions {
        strategy,
        filter,
        schema_header: args.schema_header,
    });
    if let Some(control) = load_version_control(versions_path.as_deref()) {
        scanner = scanner.with_version_control(control);
    }
    if let Some(older) = load_older_report(args.older_report.as_deref().map(Path::new)) {
        scanner = scanner.with_older_report(older);
    }
    let run = scanner.run(&config, &olives);

    let outputs = RunOutputs {
        report: PathBuf::from(&args.out_json),
        staged: args.staged.map(PathBuf::from),
        versions: versions_path,
    };
    write_outputs_or_exit(&run, &outputs);
    finish(&run, &outputs, args.strict, args.json);
}
