//! Subcommand definitions.

use std::path::PathBuf;

use clap::Subcommand;

use crate::handlers::simulate::DEFAULT_STEP_MS;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the engine against a scripted in-memory host
    ///
    /// Starts two transfers, pauses and resumes one, finishes both, then
    /// deletes an older file. Panel snapshots and notification calls are
    /// printed as they happen.
    Simulate {
        /// Delay between scripted steps, in milliseconds
        #[arg(long, default_value_t = DEFAULT_STEP_MS)]
        step_ms: u64,
        /// Print the final panel as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render the toolbar glyph to a PNG file
    RenderIcon {
        /// Aggregate progress between 0 and 1; omit for the idle glyph
        #[arg(long)]
        progress: Option<f64>,
        /// Draw the busy ring without an arc
        #[arg(long, conflicts_with = "progress")]
        indeterminate: bool,
        /// Edge length in pixels (defaults to the configured icon size)
        #[arg(long)]
        size: Option<u32>,
        /// Output PNG path
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Print the effective settings as JSON
    Settings,
}
