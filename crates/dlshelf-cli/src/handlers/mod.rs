//! Subcommand handlers.

pub mod render_icon;
pub mod settings;
pub mod simulate;
