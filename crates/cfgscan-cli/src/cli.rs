use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cfgscan",
    about = "cfgscan: reconcile deployed olives against the assay configuration",
    version
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug); overrides RUST_LOG
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover and parse olives for an instance, then reconcile them
    Scan {
        /// Path to the TOML settings file
        #[arg(long)]
        settings: String,

        /// Shesmu instance directory name (must be listed under [instances])
        #[arg(long)]
        instance: String,

        /// Version-control JSON (overrides data.version_file)
        #[arg(long)]
        versions: Option<String>,

        /// Report from a previous run (overrides data.older_report)
        #[arg(long)]
        older_report: Option<String>,

        /// Where to write the report
        #[arg(long, default_value = "enabled_workflows.json")]
        out_json: String,

        /// Where to write the staged assay config
        #[arg(long)]
        staged: Option<String>,

        /// Wrap the staged config in a schema/kind header
        #[arg(long)]
        schema_header: bool,

        /// JavaScript embedded in the HTML page; the page is only written
        /// when this is given
        #[arg(long)]
        jscript: Option<String>,

        /// Where to write the HTML page
        #[arg(long, default_value = "running_workflows.html")]
        outpage: String,

        /// Exit 1 when the run recorded errors
        #[arg(long)]
        strict: bool,

        /// Output summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconcile pre-parsed olive records against an assay config
    Reconcile {
        /// Assay config JSON
        #[arg(long)]
        config: String,

        /// Olive records JSON (a list)
        #[arg(long)]
        olives: String,

        /// Version-control JSON
        #[arg(long)]
        versions: Option<String>,

        /// Report from a previous run
        #[arg(long)]
        older_report: Option<String>,

        /// Only scan assays matching this pattern (repeatable)
        #[arg(long)]
        include: Vec<String>,

        /// Skip assays matching this pattern (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Leaf matching strategy: truthy or list-membership
        #[arg(long, default_value = "truthy")]
        strategy: String,

        /// Where to write the report
        #[arg(long, default_value = "enabled_workflows.json")]
        out_json: String,

        /// Where to write the staged assay config
        #[arg(long)]
        staged: Option<String>,

        /// Wrap the staged config in a schema/kind header
        #[arg(long)]
        schema_header: bool,

        /// Exit 1 when the run recorded errors
        #[arg(long)]
        strict: bool,

        /// Output summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List workflows that olives run but no assay configures
    Orphans {
        /// Assay config JSON
        #[arg(long)]
        config: String,

        /// Olive records JSON (a list)
        #[arg(long)]
        olives: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the olive records parsed for an instance
    ParseOlives {
        /// Path to the TOML settings file
        #[arg(long)]
        settings: String,

        /// Shesmu instance directory name
        #[arg(long)]
        instance: String,
    },
}
