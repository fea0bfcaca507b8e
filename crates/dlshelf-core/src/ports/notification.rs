//! Notification surface port.
//!
//! The surface is the toolbar-style indicator outside the panel: an icon
//! bitmap plus a short badge with its own colours.

use std::fmt;

use crate::progress::IconBitmap;

/// An opaque RGBA colour for badge text or background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BadgeColor(pub [u8; 4]);

impl BadgeColor {
    /// Badge background announcing a finished batch.
    pub const COMPLETE_BACKGROUND: Self = Self::rgb(0x00, 0x80, 0x00);
    /// Badge text colour announcing a finished batch.
    pub const COMPLETE_TEXT: Self = Self::rgb(0xff, 0xff, 0xff);

    /// Opaque colour from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 0xff])
    }

    /// `#rrggbb` form, alpha dropped.
    #[must_use]
    pub fn to_hex(self) -> String {
        let [r, g, b, _] = self.0;
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl fmt::Display for BadgeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Port for the toolbar indicator.
///
/// Calls are synchronous and must not block; the renderer invokes them from
/// inside registry change notification.
pub trait NotificationSurface: Send + Sync {
    /// Replace the displayed icon.
    fn set_icon(&self, icon: &IconBitmap);

    /// Set badge text. The empty string clears the badge.
    fn set_badge_text(&self, text: &str);

    /// Set the badge background colour.
    fn set_badge_background_color(&self, color: BadgeColor);

    /// Set the badge text colour.
    fn set_badge_text_color(&self, color: BadgeColor);
}

/// Surface that discards everything, for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSurface;

impl NotificationSurface for NoopSurface {
    fn set_icon(&self, _icon: &IconBitmap) {}

    fn set_badge_text(&self, _text: &str) {}

    fn set_badge_background_color(&self, _color: BadgeColor) {}

    fn set_badge_text_color(&self, _color: BadgeColor) {}
}
