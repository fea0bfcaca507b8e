//! Toolbar glyphs drawn straight into an RGBA buffer.
//!
//! The progress glyph is a translucent disc with a ring arc starting at
//! 12 o'clock and sweeping clockwise. The ring stroke is a quarter of the
//! icon size and sits inside the disc edge.

use std::f64::consts::TAU;

use image::{Rgba, RgbaImage};

/// Arc stroke colour.
pub const ARC_COLOR: [u8; 4] = [0x1b, 0xa1, 0xe2, 0xff];
/// Base disc, black at 10% opacity.
pub const BASE_COLOR: [u8; 4] = [0x00, 0x00, 0x00, 0x1a];
const GLYPH_COLOR: [u8; 4] = [0x55, 0x55, 0x55, 0xff];
const PLACEHOLDER_COLOR: [u8; 4] = [0xa0, 0xa0, 0xa0, 0xff];

/// Square RGBA bitmap handed to the notification surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IconBitmap {
    image: RgbaImage,
}

impl IconBitmap {
    /// Progress glyph. `None` draws the base disc without an arc.
    #[must_use]
    pub fn progress(size: u32, fraction: Option<f64>) -> Self {
        let mut image = RgbaImage::new(size, size);
        let extent = f64::from(size);
        let center = extent / 2.0;
        let line = extent / 4.0;
        let radius = (extent - line) / 2.0;
        let sweep = fraction.map(|f| f.clamp(0.0, 1.0) * TAU);

        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let dx = f64::from(x) + 0.5 - center;
            let dy = f64::from(y) + 0.5 - center;
            let distance = dx.hypot(dy);
            if distance > center {
                continue;
            }
            *pixel = Rgba(BASE_COLOR);

            let Some(sweep) = sweep else { continue };
            if (distance - radius).abs() <= line / 2.0 && angle_from_top(dx, dy) <= sweep {
                *pixel = Rgba(ARC_COLOR);
            }
        }
        Self { image }
    }

    /// Static idle glyph: a download arrow over a tray.
    #[must_use]
    pub fn idle(size: u32) -> Self {
        Self::paint(size, GLYPH_COLOR, |u, v| {
            let offset = (u - 0.5).abs();
            let shaft = offset <= 0.08 && (0.12..=0.5).contains(&v);
            let head = (0.45..=0.75).contains(&v) && offset <= (0.75 - v) * (0.25 / 0.30);
            let tray_floor = (0.84..=0.92).contains(&v) && (0.15..=0.85).contains(&u);
            let tray_sides = (0.66..=0.92).contains(&v)
                && ((0.15..=0.23).contains(&u) || (0.77..=0.85).contains(&u));
            shaft || head || tray_floor || tray_sides
        })
    }

    /// Generic file outline shown while a file-type icon is missing.
    #[must_use]
    pub fn placeholder(size: u32) -> Self {
        Self::paint(size, PLACEHOLDER_COLOR, |u, v| {
            let inside = (0.2..=0.8).contains(&u) && (0.1..=0.9).contains(&v);
            let interior = (0.28..=0.72).contains(&u) && (0.18..=0.82).contains(&v);
            inside && !interior
        })
    }

    /// Wrap raw RGBA bytes, e.g. from a host icon service.
    ///
    /// Returns `None` when the buffer length does not match the dimensions.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, bytes: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, bytes).map(|image| Self { image })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// RGBA value at a pixel, `None` outside the bitmap.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Number of pixels exactly matching `color`.
    #[must_use]
    pub fn count(&self, color: [u8; 4]) -> usize {
        self.image.pixels().filter(|p| p.0 == color).count()
    }

    /// Take the underlying buffer, e.g. for encoding.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    fn paint(size: u32, color: [u8; 4], shape: impl Fn(f64, f64) -> bool) -> Self {
        let mut image = RgbaImage::new(size, size);
        let extent = f64::from(size.max(1));
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let u = (f64::from(x) + 0.5) / extent;
            let v = (f64::from(y) + 0.5) / extent;
            if shape(u, v) {
                *pixel = Rgba(color);
            }
        }
        Self { image }
    }
}

/// Clockwise angle from 12 o'clock in `[0, TAU)`, with y growing downwards.
fn angle_from_top(dx: f64, dy: f64) -> f64 {
    let angle = dx.atan2(-dy);
    if angle < 0.0 { angle + TAU } else { angle }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

    #[test]
    fn test_quarter_arc_covers_top_right_only() {
        let icon = IconBitmap::progress(32, Some(0.25));
        assert_eq!(icon.width(), 32);
        assert_eq!(icon.pixel(24, 7), Some(ARC_COLOR));
        assert_eq!(icon.pixel(7, 24), Some(BASE_COLOR));
        assert_eq!(icon.pixel(7, 7), Some(BASE_COLOR));
        assert_eq!(icon.pixel(0, 0), Some(TRANSPARENT));
    }

    #[test]
    fn test_full_arc_and_indeterminate() {
        let full = IconBitmap::progress(32, Some(1.0));
        assert_eq!(full.pixel(7, 24), Some(ARC_COLOR));
        assert_eq!(full.pixel(16, 16), Some(BASE_COLOR));

        let indeterminate = IconBitmap::progress(32, None);
        assert_eq!(indeterminate.count(ARC_COLOR), 0);
        assert!(indeterminate.count(BASE_COLOR) > 0);
    }

    #[test]
    fn test_arc_grows_with_fraction() {
        let small = IconBitmap::progress(32, Some(0.1)).count(ARC_COLOR);
        let large = IconBitmap::progress(32, Some(0.6)).count(ARC_COLOR);
        assert!(small > 0);
        assert!(large > small * 4);
    }

    #[test]
    fn test_idle_and_placeholder_are_drawn() {
        let idle = IconBitmap::idle(32);
        assert_eq!(idle.pixel(16, 8), Some(GLYPH_COLOR));
        assert_eq!(idle.count(ARC_COLOR), 0);

        let placeholder = IconBitmap::placeholder(16);
        assert!(placeholder.count(PLACEHOLDER_COLOR) > 0);
        assert_eq!(placeholder.pixel(8, 8), Some(TRANSPARENT));
    }

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(IconBitmap::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(IconBitmap::from_rgba(2, 2, vec![0; 15]).is_none());
    }
}
