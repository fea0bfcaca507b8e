//! Host download service port.
//!
//! The host owns the actual transfers. It answers listings, accepts
//! per-download commands, serves file-type icons, and pushes created /
//! changed / erased events (delivered separately as `HostEvent`s).

use async_trait::async_trait;
use thiserror::Error;

use crate::download::{DownloadId, DownloadRecord, DownloadState, ShelfError};
use crate::progress::IconBitmap;

/// Errors reported by a host adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// The host has no download with this id.
    #[error("Download {id} not found")]
    NotFound {
        /// The missing id.
        id: DownloadId,
    },

    /// The host refused the operation.
    #[error("{operation} rejected: {message}")]
    Rejected {
        /// Operation name.
        operation: String,
        /// Host-provided reason.
        message: String,
    },

    /// The host could not be reached.
    #[error("Host unavailable: {0}")]
    Unavailable(String),
}

impl HostError {
    /// Create a rejection error.
    pub fn rejected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Map to the domain error for a failed operation.
    #[must_use]
    pub fn into_operation_error(self, operation: &str) -> ShelfError {
        match self {
            Self::Rejected { operation, message } => {
                ShelfError::host_operation_failed(operation, message)
            }
            other => ShelfError::host_operation_failed(operation, other.to_string()),
        }
    }
}

/// Filter for `HostDownloadService::list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Restrict to a single download.
    pub id: Option<DownloadId>,
    /// Restrict to a raw state.
    pub state: Option<DownloadState>,
    /// Free-text query matched against filename and URL.
    pub query: Option<String>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl ListFilter {
    /// Everything the host knows about.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A single download, used for poll re-fetches.
    #[must_use]
    pub fn by_id(id: DownloadId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    /// Downloads currently `in_progress`.
    #[must_use]
    pub fn in_progress() -> Self {
        Self {
            state: Some(DownloadState::InProgress),
            ..Default::default()
        }
    }

    /// Free-text search.
    #[must_use]
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// Cap the number of results.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Whether a record passes the id, state and query restrictions.
    ///
    /// `limit` is applied by the caller over the matching sequence.
    #[must_use]
    pub fn matches(&self, record: &DownloadRecord) -> bool {
        if self.id.is_some_and(|id| id != record.id) {
            return false;
        }
        if self.state.is_some_and(|state| state != record.state) {
            return false;
        }
        self.query.as_deref().is_none_or(|query| {
            let query = query.to_lowercase();
            record.filename.to_lowercase().contains(&query)
                || record.url.to_lowercase().contains(&query)
        })
    }
}

/// Request to start a new transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    /// Source URL.
    pub url: String,
    /// Destination path to force, if any.
    pub filename: Option<String>,
}

impl StartRequest {
    /// Download `url` to a destination the host chooses.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: None,
        }
    }

    /// Re-download a record's URL, optionally forcing its original path.
    #[must_use]
    pub fn retry_of(record: &DownloadRecord, keep_filename: bool) -> Self {
        Self {
            url: record.url.clone(),
            filename: (keep_filename && record.is_materialized()).then(|| record.filename.clone()),
        }
    }
}

/// Port for the host download service.
///
/// All commands are keyed by download id and resolve once the host has
/// acknowledged them; the resulting state arrives later on the event feed.
#[async_trait]
pub trait HostDownloadService: Send + Sync {
    /// List downloads matching `filter`.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<DownloadRecord>, HostError>;

    /// Start a new transfer and return its id.
    async fn start(&self, request: &StartRequest) -> Result<DownloadId, HostError>;

    /// Pause a running transfer.
    async fn pause(&self, id: DownloadId) -> Result<(), HostError>;

    /// Resume a paused or resumable transfer.
    async fn resume(&self, id: DownloadId) -> Result<(), HostError>;

    /// Cancel an in-progress transfer.
    async fn cancel(&self, id: DownloadId) -> Result<(), HostError>;

    /// Remove the entry from the host's list.
    async fn erase(&self, id: DownloadId) -> Result<(), HostError>;

    /// Delete the downloaded file from disk.
    async fn remove_file(&self, id: DownloadId) -> Result<(), HostError>;

    /// Open the downloaded file.
    async fn open(&self, id: DownloadId) -> Result<(), HostError>;

    /// Show the file in its folder.
    async fn show(&self, id: DownloadId) -> Result<(), HostError>;

    /// Accept a dangerous download.
    async fn accept_risk(&self, id: DownloadId) -> Result<(), HostError>;

    /// Open a URL in the host (source link).
    async fn open_url(&self, url: &str) -> Result<(), HostError>;

    /// Fetch the file-type icon for a download.
    async fn get_icon(&self, id: DownloadId, size: u32) -> Result<IconBitmap, HostError>;
}
