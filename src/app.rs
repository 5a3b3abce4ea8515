//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - runs the segmentation pipeline
//! - prints reports/plots or hands off to the TUI

use std::io::{self, Write};

use clap::Parser;
use log::debug;

use crate::cli::{Command, RunArgs};
use crate::error::AppError;
use crate::model::{NdjsonWriter, Observer};
use crate::solver::FixedDelay;

pub mod pipeline;

/// Pacing used by `sls run` when no delay is configured.
const RUN_DEFAULT_DELAY_MS: u64 = 0;

/// Pacing used by `sls tui` when no delay is configured.
pub const TUI_DEFAULT_DELAY_MS: u64 = 100;

/// Entry point for the `sls` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    // We want `sls` and `sls -n 20` to behave like `sls tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Tui(args) => handle_tui(args),
    }
}

/// Log to stderr; `RUST_LOG` overrides the default `warn` level.
fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = args.to_config(RUN_DEFAULT_DELAY_MS);
    config.validate()?;
    debug!("run config: {config:?}");

    let mut observers: Vec<Box<dyn Observer>> = Vec::new();
    if args.events {
        observers.push(Box::new(NdjsonWriter::new(io::stdout())));
    }

    let mut pacer = FixedDelay::from_millis(config.delay_ms);
    let output = pipeline::run(&config, observers, &mut pacer)?;

    let mut text = crate::report::format_run_summary(&config, &output);
    if !args.no_plot {
        text.push('\n');
        text.push_str(&crate::plot::render_segments_plot(
            &output.points,
            &output.solution.segments,
            args.width,
            args.height,
        ));
    }

    // Keep stdout clean for the event stream when it is requested.
    let write_result = if args.events {
        write!(io::stderr(), "{text}")
    } else {
        write!(io::stdout(), "{text}")
    };
    write_result.map_err(|e| AppError::new(4, format!("Failed to write output: {e}")))
}

fn handle_tui(args: RunArgs) -> Result<(), AppError> {
    let config = args.to_config(TUI_DEFAULT_DELAY_MS);
    config.validate()?;
    crate::tui::run(config)
}

/// Rewrite argv so `sls` defaults to `sls tui`.
///
/// Rules:
/// - `sls`                      -> `sls tui`
/// - `sls -n 20 ...`            -> `sls tui -n 20 ...`
/// - `sls --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if matches!(arg1.as_str(), "run" | "tui") {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}
