//! Core domain types for downloads.
//!
//! Pure data types with no I/O dependencies. Field names serialize in the
//! host service's camelCase shape so records can be read straight off the
//! host's listing and event feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::ShelfError;

/// Host-assigned identifier for a download.
///
/// Opaque and stable for the lifetime of the download. The registry never
/// holds two records with the same identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(u64);

impl DownloadId {
    /// Wrap a raw host identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw host identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for DownloadId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw transfer state reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    /// Transfer is running or paused.
    #[default]
    InProgress,
    /// Transfer stopped with an error; may be resumable.
    Interrupted,
    /// Transfer finished.
    Complete,
}

impl DownloadState {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Interrupted => "interrupted",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Danger classification of a download.
///
/// Anything other than `Safe` or `Accepted` gates every state-specific
/// action behind an explicit accept-risk confirmation. The host reports an
/// open-ended set of risk kinds, so unknown strings are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DangerType {
    /// No risk detected.
    #[default]
    Safe,
    /// Risk detected and accepted by the operator.
    Accepted,
    /// Unresolved risk of the given kind (e.g. "file", "url", "uncommon").
    Risk(String),
}

impl DangerType {
    /// Whether accept-risk is still required before other actions.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Risk(_))
    }

    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Safe => "safe",
            Self::Accepted => "accepted",
            Self::Risk(kind) => kind,
        }
    }
}

impl From<String> for DangerType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "safe" => Self::Safe,
            "accepted" => Self::Accepted,
            _ => Self::Risk(value),
        }
    }
}

impl From<&str> for DangerType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<DangerType> for String {
    fn from(value: DangerType) -> Self {
        match value {
            DangerType::Safe => "safe".to_string(),
            DangerType::Accepted => "accepted".to_string(),
            DangerType::Risk(kind) => kind,
        }
    }
}

/// Canonical record for one host download.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadRecord {
    /// Host-assigned identifier.
    pub id: DownloadId,
    /// Absolute destination path. Empty while the host has not chosen one yet.
    pub filename: String,
    /// Source URL.
    pub url: String,
    /// Final file size in bytes, 0 when unknown.
    pub file_size: u64,
    /// Bytes received so far.
    pub bytes_received: u64,
    /// Expected total bytes, -1 or 0 when unknown.
    pub total_bytes: i64,
    /// Raw transfer state.
    pub state: DownloadState,
    /// Paused flag (meaningful while in progress).
    pub paused: bool,
    /// Resumable flag (meaningful while interrupted).
    pub can_resume: bool,
    /// File still on disk (meaningful once complete).
    pub exists: bool,
    /// Danger classification.
    pub danger: DangerType,
    /// Interruption reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the host started the transfer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
}

impl DownloadRecord {
    /// Create an in-progress, running record.
    pub fn new(id: impl Into<DownloadId>, url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            filename: filename.into(),
            total_bytes: -1,
            exists: true,
            ..Default::default()
        }
    }

    /// Set received and expected byte counts.
    #[must_use]
    pub const fn with_bytes(mut self, bytes_received: u64, total_bytes: i64) -> Self {
        self.bytes_received = bytes_received;
        self.total_bytes = total_bytes;
        self
    }

    /// Set the raw transfer state.
    #[must_use]
    pub const fn with_state(mut self, state: DownloadState) -> Self {
        self.state = state;
        self
    }

    /// Set the paused flag.
    #[must_use]
    pub const fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    /// Set the danger classification.
    #[must_use]
    pub fn with_danger(mut self, danger: impl Into<DangerType>) -> Self {
        self.danger = danger.into();
        self
    }

    /// Whether the host has chosen a destination yet.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        !self.filename.is_empty()
    }

    /// Whether the raw state is `in_progress` (running or paused).
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.state == DownloadState::InProgress
    }

    /// Whether bytes are expected to be moving right now.
    #[must_use]
    pub fn is_transferring(&self) -> bool {
        self.is_in_progress() && !self.paused
    }

    /// Expected total as an unsigned count, `None` for the unknown sentinels.
    #[must_use]
    pub fn known_total(&self) -> Option<u64> {
        u64::try_from(self.total_bytes).ok().filter(|total| *total > 0)
    }

    /// Fraction of the transfer completed, clamped to `[0, 1]`.
    ///
    /// Fails with `MalformedTotalBytes` when the total is unknown so callers
    /// can fall back to an indeterminate display instead of dividing by zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> Result<f64, ShelfError> {
        let total = self
            .known_total()
            .ok_or_else(|| ShelfError::malformed_total_bytes(self.id, self.total_bytes))?;
        Ok((self.bytes_received.min(total) as f64 / total as f64).clamp(0.0, 1.0))
    }

    /// Final path component, for display.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.filename
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.filename)
    }
}
