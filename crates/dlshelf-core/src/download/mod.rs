//! Download domain types, deltas, events, and errors.
//!
//! This module contains pure data types for the download records mirrored
//! from the host service. No I/O or runtime dependencies allowed.
//!
//! # Structure
//!
//! - `types` - Identifiers and the canonical `DownloadRecord`
//! - `delta` - Partial change notifications and the field-sparse merge
//! - `events` - Host event feed (`Created`, `Changed`, `Erased`)
//! - `presentation` - Presentation state machine and operator actions
//! - `errors` - Error types for reconciliation and host operations

pub mod delta;
pub mod errors;
pub mod events;
pub mod presentation;
pub mod types;

// Re-export commonly used types
pub use delta::{DownloadDelta, FieldChange};
pub use errors::{ShelfError, ShelfResult};
pub use events::HostEvent;
pub use presentation::{Action, PresentationState};
pub use types::{DangerType, DownloadId, DownloadRecord, DownloadState};
