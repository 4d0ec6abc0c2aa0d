use crate::support::{EXIT_REJECTED, load_config_or_exit, load_olive_records_or_exit, print_json};
use cfgscan_kernel::find_orphans;
use serde_json::json;
use std::path::PathBuf;

pub fn run(config: String, olives: String, json_output: bool) {
    let assay_config = load_config_or_exit(&PathBuf::from(&config));
    let records = load_olive_records_or_exit(&PathBuf::from(&olives));
    let orphans = find_orphans(&assay_config, &records);

    if json_output {
        print_json(&json!({
            "config": config,
            "olive_count": records.len(),
            "orphan_count": orphans.len(),
            "orphans": orphans,
        }));
    } else if orphans.is_empty() {
        println!("cfgscan orphans: none");
    } else {
        println!("cfgscan orphans: {}", orphans.len());
        for name in &orphans {
            println!("  - {name}");
        }
    }

    if !orphans.is_empty() {
        std::process::exit(EXIT_REJECTED);
    }
}
