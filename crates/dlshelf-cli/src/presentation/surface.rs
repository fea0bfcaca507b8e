//! Notification surface that prints to the terminal.

use std::sync::atomic::{AtomicUsize, Ordering};

use dlshelf_core::{BadgeColor, IconBitmap, NotificationSurface};

/// Prints every toolbar update as a `[toolbar]` line.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    redraws: AtomicUsize,
    badges: AtomicUsize,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Icon redraws so far.
    pub fn redraws(&self) -> usize {
        self.redraws.load(Ordering::Relaxed)
    }

    /// Completion badges raised so far.
    pub fn badges_raised(&self) -> usize {
        self.badges.load(Ordering::Relaxed)
    }
}

impl NotificationSurface for ConsoleSurface {
    fn set_icon(&self, icon: &IconBitmap) {
        let count = self.redraws.fetch_add(1, Ordering::Relaxed) + 1;
        println!(
            "[toolbar] icon redraw #{count} ({}x{})",
            icon.width(),
            icon.height()
        );
    }

    fn set_badge_text(&self, text: &str) {
        if text.is_empty() {
            println!("[toolbar] badge cleared");
        } else {
            self.badges.fetch_add(1, Ordering::Relaxed);
            println!("[toolbar] badge \"{text}\"");
        }
    }

    fn set_badge_background_color(&self, color: BadgeColor) {
        println!("[toolbar] badge background {color}");
    }

    fn set_badge_text_color(&self, color: BadgeColor) {
        println!("[toolbar] badge text {color}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_redraws_and_badges() {
        let surface = ConsoleSurface::new();
        surface.set_icon(&IconBitmap::idle(16));
        surface.set_icon(&IconBitmap::progress(16, Some(0.3)));
        surface.set_badge_text("+");
        surface.set_badge_text("");

        assert_eq!(surface.redraws(), 2);
        assert_eq!(surface.badges_raised(), 1);
    }
}
