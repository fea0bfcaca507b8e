//! Core domain for dlshelf, the state engine behind a download panel.
//!
//! This crate holds everything that can be expressed without a runtime:
//! the canonical download record and its delta merge, the registry with its
//! observer contract, the throughput estimator, aggregate progress with the
//! icon renderer and completion edge detector, settings, and the port traits
//! for the host download service and notification surface.
//!
//! # Structure
//!
//! - `download` - Records, deltas, host events, presentation states, errors
//! - `registry` - Canonical record collection and change notification
//! - `throughput` - Smoothed per-record transfer rate
//! - `progress` - Aggregate fraction, icon drawing, renderer, completion edge
//! - `ports` - Host download service and notification surface traits
//! - `settings` - Tunables with defaults and validation

#![deny(unused_crate_dependencies)]

pub mod download;
pub mod ports;
pub mod progress;
pub mod registry;
pub mod settings;
pub mod throughput;

// Re-export commonly used types for convenience
pub use download::{
    Action, DangerType, DownloadDelta, DownloadId, DownloadRecord, DownloadState, FieldChange,
    HostEvent, PresentationState, ShelfError, ShelfResult,
};
pub use ports::{
    BadgeColor, HostDownloadService, HostError, ListFilter, NoopSurface, NotificationSurface,
    StartRequest,
};
pub use progress::{
    ActivityRun, AggregateProgress, CompletionEdgeDetector, CompletionNotice, IconBitmap,
    ProgressRenderer,
};
pub use registry::{ChangeKind, ChangeOrigin, DownloadRegistry, RegistryChange, RegistryObserver};
pub use settings::{SettingsError, SettingsUpdate, ShelfSettings, validate_settings};
pub use throughput::ThroughputEstimator;

// Dev-dependencies used only by some test modules
#[cfg(test)]
use tokio_test as _;
