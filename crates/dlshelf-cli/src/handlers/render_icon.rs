//! Render-icon command handler.

use std::path::Path;

use anyhow::Result;
use image::ImageFormat;

use dlshelf_core::IconBitmap;

use crate::error::CliError;

/// Draw the toolbar glyph and write it as PNG.
///
/// `progress` selects the ring with an arc, `indeterminate` the bare ring,
/// and neither the idle glyph.
pub fn execute(size: u32, progress: Option<f64>, indeterminate: bool, out: &Path) -> Result<()> {
    let icon = build_icon(size, progress, indeterminate)?;
    let (width, height) = (icon.width(), icon.height());
    icon.into_image()
        .save_with_format(out, ImageFormat::Png)
        .map_err(CliError::from)?;

    println!("Wrote {width}x{height} icon to {}", out.display());
    Ok(())
}

fn build_icon(size: u32, progress: Option<f64>, indeterminate: bool) -> Result<IconBitmap, CliError> {
    if !(8..=256).contains(&size) {
        return Err(CliError::Arguments(format!(
            "icon size must be between 8 and 256 px, got {size}"
        )));
    }
    match progress {
        Some(fraction) if !(0.0..=1.0).contains(&fraction) => Err(CliError::Arguments(format!(
            "progress must be between 0 and 1, got {fraction}"
        ))),
        Some(fraction) => Ok(IconBitmap::progress(size, Some(fraction))),
        None if indeterminate => Ok(IconBitmap::progress(size, None)),
        None => Ok(IconBitmap::idle(size)),
    }
}
