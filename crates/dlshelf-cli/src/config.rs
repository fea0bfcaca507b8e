//! Settings flags.
//!
//! Every engine tunable can be given on the command line or through a
//! `DLSHELF_*` environment variable (a `.env` file works too). Unset values
//! keep the built-in defaults.

use clap::Args;

use dlshelf_core::{SettingsUpdate, ShelfSettings, validate_settings};

use crate::error::CliError;

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsArgs {
    /// Poll interval for running downloads, in milliseconds
    #[arg(long, env = "DLSHELF_POLL_INTERVAL_MS", global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Re-render cadence while anything is in progress, in milliseconds
    #[arg(long, env = "DLSHELF_HEARTBEAT_INTERVAL_MS", global = true)]
    pub heartbeat_interval_ms: Option<u64>,

    /// Upper bound on the throughput smoothing window, in milliseconds
    #[arg(long, env = "DLSHELF_THROUGHPUT_WINDOW_CAP_MS", global = true)]
    pub throughput_window_cap_ms: Option<u64>,

    /// Toolbar icon edge in pixels
    #[arg(long, env = "DLSHELF_ICON_SIZE", global = true)]
    pub icon_size: Option<u32>,

    /// File-type icon edge in pixels
    #[arg(long, env = "DLSHELF_FILE_ICON_SIZE", global = true)]
    pub file_icon_size: Option<u32>,

    /// Cap on the initial listing
    #[arg(long, env = "DLSHELF_INITIAL_LIST_LIMIT", global = true)]
    pub initial_list_limit: Option<usize>,

    /// Whether retry forces the original destination path
    #[arg(long, env = "DLSHELF_RETRY_KEEPS_FILENAME", global = true)]
    pub retry_keeps_filename: Option<bool>,

    /// Whether heartbeats re-list in-progress downloads
    #[arg(long, env = "DLSHELF_REFRESH_ON_HEARTBEAT", global = true)]
    pub refresh_on_heartbeat: Option<bool>,
}

impl SettingsArgs {
    /// Convert the given flags into a partial update.
    pub fn to_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            poll_interval_ms: self.poll_interval_ms.map(Some),
            heartbeat_interval_ms: self.heartbeat_interval_ms.map(Some),
            throughput_window_cap_ms: self.throughput_window_cap_ms.map(Some),
            icon_size: self.icon_size.map(Some),
            file_icon_size: self.file_icon_size.map(Some),
            initial_list_limit: self.initial_list_limit.map(Some),
            retry_keeps_filename: self.retry_keeps_filename.map(Some),
            refresh_on_heartbeat: self.refresh_on_heartbeat.map(Some),
        }
    }
}

/// Apply flags over the defaults and validate the result.
pub fn resolve_settings(args: &SettingsArgs) -> Result<ShelfSettings, CliError> {
    let mut settings = ShelfSettings::with_defaults();
    settings.merge(&args.to_update());
    validate_settings(&settings)?;
    Ok(settings)
}
