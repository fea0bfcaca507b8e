//! Runtime side of dlshelf.
//!
//! - `engine` - Single-task event loop owning the registry, plus its handle
//! - `poller` - Per-record poll chains feeding the throughput estimator
//! - `icons` - File-type icon cache with placeholder fallback
//! - `actions` - Operator action validation and host dispatch
//! - `memory` - In-memory host download service for simulation and tests

mod actions;
mod engine;
mod icons;
mod poller;

pub mod memory;

pub use actions::{ActionDispatcher, ActionOutcome, HostCommand};
pub use engine::{EngineHandle, PanelRow, ShelfEngine};
pub use icons::{FileIconCache, IconEntry};
pub use memory::InMemoryHost;
pub use poller::PollScheduler;
