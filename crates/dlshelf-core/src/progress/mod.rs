//! Aggregate progress, toolbar glyphs, and the completion badge.

mod aggregate;
mod completion;
mod icon;
mod renderer;

pub use aggregate::AggregateProgress;
pub use completion::{
    ActivityRun, COMPLETION_BADGE_TEXT, CompletionEdgeDetector, CompletionNotice,
};
pub use icon::{ARC_COLOR, BASE_COLOR, IconBitmap};
pub use renderer::ProgressRenderer;
