//! fleetenv CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use fleetenv::cli::args::Commands;
use fleetenv::cli::{Cli, CommandDispatcher, Workspace};
use fleetenv::cli::commands::{EXIT_FAILURE, EXIT_NO_CONFIG};
use fleetenv::env::EnvContext;
use fleetenv::ui::{create_ui, should_use_colors, OutputMode};
use fleetenv::FleetError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("fleetenv=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fleetenv=info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Process environment as UTF-8 pairs. Entries that are not valid UTF-8
/// are skipped instead of aborting.
fn process_vars() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os().filter_map(|(key, value)| {
        match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                tracing::debug!("Skipping non UTF-8 environment entry {:?}", key);
                None
            }
        }
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("fleetenv starting with args: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);

    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    // State directories are keyed by absolute path.
    let root = std::path::absolute(&root).unwrap_or(root);

    // The only read of the process environment.
    let env = EnvContext::bootstrap(&root, process_vars());

    let is_interactive = match &cli.command {
        Some(Commands::Run(args)) => !args.ci && !args.json && !args.ndjson && !env.is_ci(),
        _ => !env.is_ci(),
    };
    let colors = should_use_colors(cli.no_color, &env);
    let mut ui = create_ui(is_interactive, output_mode, colors);

    let workspace = Workspace::new(root, env).with_config(cli.config.clone());
    let dispatcher = CommandDispatcher::new(workspace);

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            let code = match e {
                FleetError::ConfigNotFound { .. } => EXIT_NO_CONFIG,
                _ => EXIT_FAILURE,
            };
            ExitCode::from(code as u8)
        }
    }
}
