use crate::support::{fail, load_settings_or_exit, to_canonical_or_exit};
use cfgscan_olive::{collect_olives, parse_olives};
use std::path::PathBuf;

pub fn run(settings: String, instance: String) {
    let settings = load_settings_or_exit(&PathBuf::from(&settings), &instance);
    let check_pattern = settings.check_pattern().unwrap_or_else(|e| fail(e));
    let paths = collect_olives(
        &settings.olive_dir(),
        &instance,
        &settings.checks.blacklist,
        &settings.aliases,
    )
    .unwrap_or_else(|e| fail(e));
    let records = parse_olives(&paths, check_pattern.as_ref()).unwrap_or_else(|e| fail(e));
    print!("{}", to_canonical_or_exit(&records));
}
