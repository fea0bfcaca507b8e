//! Settings command handler.

use anyhow::Result;

use dlshelf_core::ShelfSettings;

use crate::error::CliError;

/// Print the effective settings as pretty JSON.
pub fn execute(settings: &ShelfSettings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings).map_err(CliError::from)?;
    println!("{json}");
    Ok(())
}
