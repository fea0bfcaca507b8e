//! Error types for reconciliation and host operations.
//!
//! None of these are fatal. Each is handled at the component boundary that
//! detects it; the only user-visible signal is degraded rendering.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::presentation::{Action, PresentationState};
use super::types::DownloadId;

/// Error type for dlshelf operations.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShelfError {
    /// A delta or fetch result references an id the registry does not hold.
    ///
    /// Expected race between removal and in-flight operations; dropped
    /// silently by the engine.
    #[error("Unknown download record: {id}")]
    UnknownRecord {
        /// The missing download id.
        id: DownloadId,
    },

    /// The host rejected an operation.
    #[error("Host rejected {operation}: {message}")]
    HostOperationFailed {
        /// Operation name (e.g. "pause").
        operation: String,
        /// Host-provided reason.
        message: String,
    },

    /// File-type icon could not be fetched.
    #[error("Icon fetch failed for {id}: {message}")]
    IconFetchFailed {
        /// Download whose icon was requested.
        id: DownloadId,
        /// Failure reason.
        message: String,
    },

    /// Expected total is zero or unknown while progress math needs it.
    #[error("Download {id} has no usable total ({total_bytes})")]
    MalformedTotalBytes {
        /// Download with the unusable total.
        id: DownloadId,
        /// The raw total reported by the host.
        total_bytes: i64,
    },

    /// The action is not offered in the record's current presentation state.
    #[error("{action} is not available while {id} is {state}")]
    ActionNotAvailable {
        /// Target download.
        id: DownloadId,
        /// Requested action.
        action: Action,
        /// Presentation state at request time.
        state: PresentationState,
    },

    /// The engine loop has exited and no longer accepts requests.
    #[error("Engine stopped")]
    EngineStopped,
}

impl ShelfError {
    /// Create an unknown record error.
    #[must_use]
    pub const fn unknown_record(id: DownloadId) -> Self {
        Self::UnknownRecord { id }
    }

    /// Create a host operation failure.
    pub fn host_operation_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostOperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an icon fetch failure.
    pub fn icon_fetch_failed(id: DownloadId, message: impl Into<String>) -> Self {
        Self::IconFetchFailed {
            id,
            message: message.into(),
        }
    }

    /// Create a malformed total error.
    #[must_use]
    pub const fn malformed_total_bytes(id: DownloadId, total_bytes: i64) -> Self {
        Self::MalformedTotalBytes { id, total_bytes }
    }

    /// Check if this is the expected removal race.
    #[must_use]
    pub const fn is_unknown_record(&self) -> bool {
        matches!(self, Self::UnknownRecord { .. })
    }
}

/// Convenience result type for dlshelf operations.
pub type ShelfResult<T> = Result<T, ShelfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = ShelfError::host_operation_failed("pause", "download not active");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("host_operation_failed"));
        assert!(json.contains("pause"));

        let parsed: ShelfError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn test_action_not_available_message() {
        let err = ShelfError::ActionNotAvailable {
            id: DownloadId::new(3),
            action: Action::Pause,
            state: PresentationState::DonePresent,
        };
        assert_eq!(err.to_string(), "pause is not available while 3 is done-present");
    }

    #[test]
    fn test_is_unknown_record() {
        assert!(ShelfError::unknown_record(DownloadId::new(1)).is_unknown_record());
        assert!(!ShelfError::EngineStopped.is_unknown_record());
    }
}
