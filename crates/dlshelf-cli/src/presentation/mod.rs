//! Terminal output for the CLI.

pub mod changes;
pub mod panel;
pub mod surface;

pub use changes::ChangeLog;
pub use panel::{PanelRowView, format_bytes, format_rate, print_panel, truncate_string};
pub use surface::ConsoleSurface;
