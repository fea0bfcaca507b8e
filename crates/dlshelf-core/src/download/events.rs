//! Host event feed.

use serde::{Deserialize, Serialize};

use super::delta::DownloadDelta;
use super::types::{DownloadId, DownloadRecord};

/// One notification from the host download service.
///
/// ```json
/// { "type": "created", "record": { "id": 1, "filename": "", ... } }
/// { "type": "changed", "delta": { "id": 1, "filename": { "current": "/dl/a" } } }
/// { "type": "erased", "id": 1 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A download was created.
    Created {
        /// Full record at creation time.
        record: DownloadRecord,
    },
    /// Some fields of a download changed.
    Changed {
        /// The changed fields.
        delta: DownloadDelta,
    },
    /// A download was erased from the host's list.
    Erased {
        /// The erased download.
        id: DownloadId,
    },
}

impl HostEvent {
    /// Create a created event.
    #[must_use]
    pub const fn created(record: DownloadRecord) -> Self {
        Self::Created { record }
    }

    /// Create a changed event.
    #[must_use]
    pub const fn changed(delta: DownloadDelta) -> Self {
        Self::Changed { delta }
    }

    /// Create an erased event.
    #[must_use]
    pub const fn erased(id: DownloadId) -> Self {
        Self::Erased { id }
    }

    /// Download the event refers to.
    #[must_use]
    pub const fn id(&self) -> DownloadId {
        match self {
            Self::Created { record } => record.id,
            Self::Changed { delta } => delta.id,
            Self::Erased { id } => *id,
        }
    }

    /// Event name for logs.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "download:created",
            Self::Changed { .. } => "download:changed",
            Self::Erased { .. } => "download:erased",
        }
    }
}
