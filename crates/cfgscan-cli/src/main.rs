//! cfgscan CLI: the `cfgscan` command.

mod cli;
mod commands;
mod render;
mod settings;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan {
            settings,
            instance,
            versions,
            older_report,
            out_json,
            staged,
            schema_header,
            jscript,
            outpage,
            strict,
            json,
        } => commands::scan::run(commands::scan::Args {
            settings,
            instance,
            versions,
            older_report,
            out_json,
            staged,
            schema_header,
            jscript,
            outpage,
            strict,
            json,
        }),

        Commands::Reconcile {
            config,
            olives,
            versions,
            older_report,
            include,
            exclude,
            strategy,
            out_json,
            staged,
            schema_header,
            strict,
            json,
        } => commands::reconcile::run(commands::reconcile::Args {
            config,
            olives,
            versions,
            older_report,
            include,
            exclude,
            strategy,
            out_json,
            staged,
            schema_header,
            strict,
            json,
        }),

        Commands::Orphans {
            config,
            olives,
            json,
        } => commands::orphans::run(config, olives, json),

        Commands::ParseOlives { settings, instance } => {
            commands::parse_olives::run(settings, instance)
        }
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(fallback)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
