//! Engine tunables and validation.
//!
//! All fields are optional so a partial configuration (from a file, the
//! environment, or CLI flags) falls back to the defaults below.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay between single-record re-fetches of a running download.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Re-render cadence while anything is in progress.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 1000;

/// Upper bound on the throughput smoothing window.
pub const DEFAULT_THROUGHPUT_WINDOW_CAP_MS: u64 = 5000;

/// Toolbar icon edge in pixels.
pub const DEFAULT_ICON_SIZE: u32 = 32;

/// File-type icon edge in pixels.
pub const DEFAULT_FILE_ICON_SIZE: u32 = 16;

/// Engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShelfSettings {
    /// Poll chain interval in milliseconds (10-10,000).
    pub poll_interval_ms: Option<u64>,

    /// Heartbeat interval in milliseconds (100-60,000).
    pub heartbeat_interval_ms: Option<u64>,

    /// Throughput window cap in milliseconds (100-60,000).
    pub throughput_window_cap_ms: Option<u64>,

    /// Toolbar icon size (8-256).
    pub icon_size: Option<u32>,

    /// File-type icon size requested from the host (8-256).
    pub file_icon_size: Option<u32>,

    /// Cap on the initial listing; `None` lists everything.
    pub initial_list_limit: Option<usize>,

    /// Whether retry forces the original destination path.
    pub retry_keeps_filename: Option<bool>,

    /// Whether each heartbeat re-lists in-progress records from the host.
    pub refresh_on_heartbeat: Option<bool>,
}

impl ShelfSettings {
    /// Create settings with every default filled in.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
            heartbeat_interval_ms: Some(DEFAULT_HEARTBEAT_INTERVAL_MS),
            throughput_window_cap_ms: Some(DEFAULT_THROUGHPUT_WINDOW_CAP_MS),
            icon_size: Some(DEFAULT_ICON_SIZE),
            file_icon_size: Some(DEFAULT_FILE_ICON_SIZE),
            initial_list_limit: None,
            retry_keeps_filename: Some(true),
            refresh_on_heartbeat: Some(true),
        }
    }

    /// Get the effective poll interval.
    #[must_use]
    pub const fn effective_poll_interval(&self) -> Duration {
        Duration::from_millis(match self.poll_interval_ms {
            Some(ms) => ms,
            None => DEFAULT_POLL_INTERVAL_MS,
        })
    }

    /// Get the effective heartbeat interval.
    #[must_use]
    pub const fn effective_heartbeat_interval(&self) -> Duration {
        Duration::from_millis(match self.heartbeat_interval_ms {
            Some(ms) => ms,
            None => DEFAULT_HEARTBEAT_INTERVAL_MS,
        })
    }

    /// Get the effective throughput window cap.
    #[must_use]
    pub const fn effective_throughput_window_cap(&self) -> Duration {
        Duration::from_millis(match self.throughput_window_cap_ms {
            Some(ms) => ms,
            None => DEFAULT_THROUGHPUT_WINDOW_CAP_MS,
        })
    }

    /// Get the effective toolbar icon size.
    #[must_use]
    pub const fn effective_icon_size(&self) -> u32 {
        match self.icon_size {
            Some(size) => size,
            None => DEFAULT_ICON_SIZE,
        }
    }

    /// Get the effective file-type icon size.
    #[must_use]
    pub const fn effective_file_icon_size(&self) -> u32 {
        match self.file_icon_size {
            Some(size) => size,
            None => DEFAULT_FILE_ICON_SIZE,
        }
    }

    /// Whether retry keeps the original path (default on).
    #[must_use]
    pub fn effective_retry_keeps_filename(&self) -> bool {
        self.retry_keeps_filename.unwrap_or(true)
    }

    /// Whether heartbeats refresh in-progress records (default on).
    #[must_use]
    pub fn effective_refresh_on_heartbeat(&self) -> bool {
        self.refresh_on_heartbeat.unwrap_or(true)
    }

    /// Merge an update, only touching fields that are `Some`.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(interval) = other.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        if let Some(interval) = other.heartbeat_interval_ms {
            self.heartbeat_interval_ms = interval;
        }
        if let Some(cap) = other.throughput_window_cap_ms {
            self.throughput_window_cap_ms = cap;
        }
        if let Some(size) = other.icon_size {
            self.icon_size = size;
        }
        if let Some(size) = other.file_icon_size {
            self.file_icon_size = size;
        }
        if let Some(limit) = other.initial_list_limit {
            self.initial_list_limit = limit;
        }
        if let Some(keep) = other.retry_keeps_filename {
            self.retry_keeps_filename = keep;
        }
        if let Some(refresh) = other.refresh_on_heartbeat {
            self.refresh_on_heartbeat = refresh;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset the field to its default
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub poll_interval_ms: Option<Option<u64>>,
    pub heartbeat_interval_ms: Option<Option<u64>>,
    pub throughput_window_cap_ms: Option<Option<u64>>,
    pub icon_size: Option<Option<u32>>,
    pub file_icon_size: Option<Option<u32>>,
    pub initial_list_limit: Option<Option<usize>>,
    pub retry_keeps_filename: Option<Option<bool>>,
    pub refresh_on_heartbeat: Option<Option<bool>>,
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Poll interval must be between 10 and 10,000 ms, got {0}")]
    InvalidPollInterval(u64),

    #[error("Heartbeat interval must be between 100 and 60,000 ms, got {0}")]
    InvalidHeartbeatInterval(u64),

    #[error("Throughput window cap must be between 100 and 60,000 ms, got {0}")]
    InvalidWindowCap(u64),

    #[error("Icon size must be between 8 and 256 px, got {0}")]
    InvalidIconSize(u32),

    #[error("Initial list limit must be at least 1")]
    ZeroListLimit,
}

/// Validate settings values.
pub fn validate_settings(settings: &ShelfSettings) -> Result<(), SettingsError> {
    if let Some(interval) = settings.poll_interval_ms {
        if !(10..=10_000).contains(&interval) {
            return Err(SettingsError::InvalidPollInterval(interval));
        }
    }

    if let Some(interval) = settings.heartbeat_interval_ms {
        if !(100..=60_000).contains(&interval) {
            return Err(SettingsError::InvalidHeartbeatInterval(interval));
        }
    }

    if let Some(cap) = settings.throughput_window_cap_ms {
        if !(100..=60_000).contains(&cap) {
            return Err(SettingsError::InvalidWindowCap(cap));
        }
    }

    for size in [settings.icon_size, settings.file_icon_size].into_iter().flatten() {
        if !(8..=256).contains(&size) {
            return Err(SettingsError::InvalidIconSize(size));
        }
    }

    if settings.initial_list_limit == Some(0) {
        return Err(SettingsError::ZeroListLimit);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_settings() {
        let settings = ShelfSettings::with_defaults();
        assert_eq!(settings.effective_poll_interval(), Duration::from_millis(100));
        assert_eq!(settings.effective_heartbeat_interval(), Duration::from_secs(1));
        assert_eq!(settings.effective_throughput_window_cap(), Duration::from_secs(5));
        assert_eq!(settings.effective_icon_size(), 32);
        assert_eq!(settings.initial_list_limit, None);
        assert_ok!(validate_settings(&settings));
    }

    #[test]
    fn test_empty_settings_fall_back() {
        let settings = ShelfSettings::default();
        assert_eq!(settings.effective_poll_interval(), Duration::from_millis(100));
        assert_eq!(settings.effective_file_icon_size(), 16);
        assert!(settings.effective_retry_keeps_filename());
        assert!(settings.effective_refresh_on_heartbeat());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut settings = ShelfSettings::with_defaults();
        settings.poll_interval_ms = Some(5);
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidPollInterval(5))
        );

        let mut settings = ShelfSettings::with_defaults();
        settings.file_icon_size = Some(1024);
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidIconSize(1024))
        );

        let mut settings = ShelfSettings::with_defaults();
        settings.initial_list_limit = Some(0);
        assert_err!(validate_settings(&settings));
    }

    #[test]
    fn test_merge_settings() {
        let mut settings = ShelfSettings::with_defaults();
        let update = SettingsUpdate {
            poll_interval_ms: Some(Some(250)),
            refresh_on_heartbeat: Some(Some(false)),
            icon_size: Some(None),
            ..Default::default()
        };
        settings.merge(&update);

        assert_eq!(settings.poll_interval_ms, Some(250));
        assert_eq!(settings.refresh_on_heartbeat, Some(false));
        assert_eq!(settings.icon_size, None);
        assert_eq!(settings.effective_icon_size(), 32);
        assert_eq!(settings.heartbeat_interval_ms, Some(1000));
    }

    #[test]
    fn test_settings_from_json() {
        let settings: ShelfSettings =
            serde_json::from_str(r#"{"poll_interval_ms": 200, "initial_list_limit": 10}"#).unwrap();
        assert_eq!(settings.poll_interval_ms, Some(200));
        assert_eq!(settings.initial_list_limit, Some(10));
        assert_eq!(settings.icon_size, None);
    }
}
