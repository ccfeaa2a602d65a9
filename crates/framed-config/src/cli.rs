//! Command-line argument parsing for Framed Dreams.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Framed Dreams command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "framed-dreams", about = "Framed Dreams headless runner")]
pub struct CliArgs {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Settle delay between cutscene and house, in milliseconds.
    #[arg(long)]
    pub settle_delay_ms: Option<u64>,

    /// Allow returning to Mars after it has been visited.
    #[arg(long)]
    pub allow_mars_revisit: Option<bool>,

    /// Treat missing world objects as load failures.
    #[arg(long)]
    pub strict: Option<bool>,

    /// Stop the run after this many simulated seconds.
    #[arg(long, default_value_t = 120.0)]
    pub max_seconds: f64,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(delay) = args.settle_delay_ms {
            self.flow.settle_delay_ms = delay;
        }
        if let Some(revisit) = args.allow_mars_revisit {
            self.flow.allow_mars_revisit = revisit;
        }
        if let Some(strict) = args.strict {
            self.debug.strict_world_objects = strict;
        }
    }
}
