//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the engine expects from its host. They
//! contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - Host operations are async and fire-and-forget beyond acknowledgement
//! - The notification surface is synchronous and infallible from our side
//! - Port errors convert into `ShelfError` at the engine boundary

pub mod host;
pub mod notification;

pub use host::{HostDownloadService, HostError, ListFilter, StartRequest};
pub use notification::{BadgeColor, NoopSurface, NotificationSurface};
