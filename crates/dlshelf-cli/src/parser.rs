//! Top-level CLI parser.

use clap::Parser;

use crate::commands::Commands;
use crate::config::SettingsArgs;

/// Download panel state engine, driven from the terminal.
#[derive(Parser, Debug)]
#[command(name = "dlshelf")]
#[command(about = "Simulate the dlshelf download panel engine and render its glyphs")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate_with_settings() {
        let cli = Cli::parse_from([
            "dlshelf",
            "--poll-interval-ms",
            "250",
            "simulate",
            "--step-ms",
            "50",
            "--json",
        ]);
        assert_eq!(cli.settings.poll_interval_ms, Some(250));
        match cli.command {
            Some(Commands::Simulate { step_ms, json }) => {
                assert_eq!(step_ms, 50);
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "dlshelf",
            "render-icon",
            "--out",
            "glyph.png",
            "--progress",
            "0.25",
            "--retry-keeps-filename",
            "false",
            "-v",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.settings.retry_keeps_filename, Some(false));
        match cli.command {
            Some(Commands::RenderIcon { progress, out, .. }) => {
                assert_eq!(progress, Some(0.25));
                assert_eq!(out, PathBuf::from("glyph.png"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_progress_conflicts_with_indeterminate() {
        let result = Cli::try_parse_from([
            "dlshelf",
            "render-icon",
            "--out",
            "x.png",
            "--progress",
            "0.5",
            "--indeterminate",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::parse_from(["dlshelf"]);
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }
}
