//! Command-line parsing for the segmented least squares explorer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the model/solver code.
//!
//! Every run flag can also come from an `SLS_*` environment variable (a `.env`
//! file in the working directory is loaded first).

use clap::{Parser, Subcommand};

use crate::domain::{RunConfig, Shape};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sls", version, about = "Segmented least squares, step by step")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Segment a generated dataset and print the result.
    Run(RunArgs),
    /// Launch the interactive TUI.
    ///
    /// Adjust the point count and penalty, then watch the dynamic program
    /// rebuild the best segmentation one prefix at a time.
    Tui(RunArgs),
}

/// Options shared by `run` and `tui`.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Number of points to generate.
    #[arg(short = 'n', long = "points", env = "SLS_N", default_value_t = 10)]
    pub points: usize,

    /// Penalty charged per segment.
    #[arg(short = 'l', long, env = "SLS_LAMBDA", default_value_t = 1.0)]
    pub lambda: f64,

    /// Pause between candidate evaluations in milliseconds
    /// (default: 0 for `run`, 100 for `tui`).
    #[arg(long, env = "SLS_DELAY_MS")]
    pub delay_ms: Option<u64>,

    /// Random seed for the noise generator.
    #[arg(long, env = "SLS_SEED", default_value_t = 42)]
    pub seed: u64,

    /// Standard deviation of Gaussian noise added to y.
    #[arg(long, env = "SLS_NOISE", default_value_t = 0.0)]
    pub noise: f64,

    /// Curve to sample.
    #[arg(long, value_enum, env = "SLS_SHAPE", default_value_t = Shape::Sine)]
    pub shape: Shape,

    /// Left end of the sampled x range.
    #[arg(long, allow_negative_numbers = true, default_value_t = -10.0)]
    pub x_min: f64,

    /// Right end of the sampled x range (exclusive).
    #[arg(long, allow_negative_numbers = true, default_value_t = 10.0)]
    pub x_max: f64,

    /// Stream model events to stdout as NDJSON (`run` only).
    #[arg(long)]
    pub events: bool,

    /// Disable the terminal plot (`run` only).
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

impl RunArgs {
    /// Resolve flags into a run configuration; `default_delay_ms` applies when
    /// neither `--delay-ms` nor `SLS_DELAY_MS` is given.
    pub fn to_config(&self, default_delay_ms: u64) -> RunConfig {
        RunConfig {
            n: self.points,
            lambda: self.lambda,
            delay_ms: self.delay_ms.unwrap_or(default_delay_ms),
            seed: self.seed,
            noise: self.noise,
            shape: self.shape,
            x_min: self.x_min,
            x_max: self.x_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "sls", "run", "-n", "12", "-l", "0.25", "--shape", "zigzag", "--x-min", "-3",
            "--events",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.points, 12);
        assert!(args.events);

        let config = args.to_config(0);
        assert_eq!(config.n, 12);
        assert_eq!(config.lambda, 0.25);
        assert_eq!(config.shape, Shape::Zigzag);
        assert_eq!(config.x_min, -3.0);
        assert_eq!(config.delay_ms, 0);
    }

    #[test]
    fn explicit_delay_overrides_command_default() {
        let cli = Cli::try_parse_from(["sls", "tui", "--delay-ms", "5"]).unwrap();
        let Command::Tui(args) = cli.command else {
            panic!("expected tui subcommand");
        };
        assert_eq!(args.to_config(100).delay_ms, 5);
    }
}
