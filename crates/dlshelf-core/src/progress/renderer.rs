//! Registry observer that drives the notification surface.

use std::sync::Arc;

use chrono::Utc;

use super::aggregate::AggregateProgress;
use super::completion::{COMPLETION_BADGE_TEXT, CompletionEdgeDetector, CompletionNotice};
use super::icon::IconBitmap;
use crate::download::DownloadRecord;
use crate::ports::{BadgeColor, NotificationSurface};
use crate::registry::{RegistryChange, RegistryObserver};

/// What the surface currently shows, at redraw granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Glyph {
    Idle,
    /// Arc sweep in whole degrees.
    Ring(u16),
}

impl Glyph {
    fn of(progress: &AggregateProgress) -> Self {
        progress.sweep_degrees().map_or(Self::Idle, Self::Ring)
    }
}

/// Owns the icon and badge state shown on the notification surface.
///
/// On every registry change it recomputes the aggregate, redraws the icon
/// unless the glyph would be identical, and raises the completion badge when
/// the fraction goes from defined to undefined. An undefined fraction, with
/// nothing in progress or only unsized transfers, shows the idle glyph. Any
/// host event clears a raised badge first.
pub struct ProgressRenderer {
    surface: Arc<dyn NotificationSurface>,
    icon_size: u32,
    drawn: Option<Glyph>,
    badge_raised: bool,
    edge: CompletionEdgeDetector,
    last: AggregateProgress,
}

impl ProgressRenderer {
    /// Create a renderer drawing `icon_size` pixel glyphs onto `surface`.
    pub fn new(surface: Arc<dyn NotificationSurface>, icon_size: u32) -> Self {
        Self {
            surface,
            icon_size,
            drawn: None,
            badge_raised: false,
            edge: CompletionEdgeDetector::new(),
            last: AggregateProgress::Idle,
        }
    }

    /// Aggregate computed on the most recent change.
    #[must_use]
    pub const fn last_progress(&self) -> AggregateProgress {
        self.last
    }

    /// Recompute from a snapshot and update the surface.
    pub fn render(&mut self, snapshot: &[DownloadRecord]) -> Option<CompletionNotice> {
        let progress = AggregateProgress::compute(snapshot);
        self.last = progress;

        let glyph = Glyph::of(&progress);
        if self.drawn == Some(glyph) {
            tracing::trace!(target: "dlshelf.render", ?glyph, "Redraw suppressed");
        } else {
            let icon = match glyph {
                Glyph::Idle => IconBitmap::idle(self.icon_size),
                Glyph::Ring(_) => IconBitmap::progress(self.icon_size, progress.fraction()),
            };
            self.surface.set_icon(&icon);
            self.drawn = Some(glyph);
            tracing::debug!(target: "dlshelf.render", ?glyph, "Icon redrawn");
        }

        let notice = self.edge.observe(progress.is_busy(), Utc::now())?;
        self.surface
            .set_badge_background_color(BadgeColor::COMPLETE_BACKGROUND);
        self.surface.set_badge_text_color(BadgeColor::COMPLETE_TEXT);
        self.surface.set_badge_text(COMPLETION_BADGE_TEXT);
        self.badge_raised = true;
        tracing::info!(
            target: "dlshelf.render",
            run_id = %notice.run.run_id,
            duration_ms = notice.duration().num_milliseconds(),
            "All downloads finished"
        );
        Some(notice)
    }

    fn dismiss_badge(&mut self) {
        if self.badge_raised {
            self.surface.set_badge_text("");
            self.badge_raised = false;
            tracing::debug!(target: "dlshelf.render", "Completion badge cleared");
        }
    }
}

impl RegistryObserver for ProgressRenderer {
    fn on_registry_change(&mut self, change: &RegistryChange, snapshot: &[DownloadRecord]) {
        if change.is_host_event() {
            self.dismiss_badge();
        }
        self.render(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{DownloadDelta, DownloadId, DownloadState};
    use crate::registry::{ChangeOrigin, DownloadRegistry};
    use mockall::Sequence;
    use mockall::predicate::eq;
    use std::sync::Mutex;

    mockall::mock! {
        pub Surface {}

        impl NotificationSurface for Surface {
            fn set_icon(&self, icon: &IconBitmap);
            fn set_badge_text(&self, text: &str);
            fn set_badge_background_color(&self, color: BadgeColor);
            fn set_badge_text_color(&self, color: BadgeColor);
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Icon,
        Badge(String),
        Background(BadgeColor),
        TextColor(BadgeColor),
    }

    #[derive(Default)]
    struct RecordingSurface {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingSurface {
        fn take(&self) -> Vec<Call> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    impl NotificationSurface for RecordingSurface {
        fn set_icon(&self, _icon: &IconBitmap) {
            self.calls.lock().unwrap().push(Call::Icon);
        }
        fn set_badge_text(&self, text: &str) {
            self.calls.lock().unwrap().push(Call::Badge(text.to_string()));
        }
        fn set_badge_background_color(&self, color: BadgeColor) {
            self.calls.lock().unwrap().push(Call::Background(color));
        }
        fn set_badge_text_color(&self, color: BadgeColor) {
            self.calls.lock().unwrap().push(Call::TextColor(color));
        }
    }

    fn active(id: u64, bytes: u64) -> DownloadRecord {
        DownloadRecord::new(id, "https://example.com/f", format!("/dl/{id}")).with_bytes(bytes, 1000)
    }

    fn wired() -> (DownloadRegistry, Arc<RecordingSurface>) {
        let surface = Arc::new(RecordingSurface::default());
        let mut registry = DownloadRegistry::new();
        registry.subscribe(Box::new(ProgressRenderer::new(surface.clone(), 32)));
        (registry, surface)
    }

    #[test]
    fn test_identical_fraction_is_not_redrawn() {
        let mut surface = MockSurface::new();
        surface.expect_set_icon().times(2).return_const(());
        surface.expect_set_badge_text().never();

        let mut renderer = ProgressRenderer::new(Arc::new(surface), 32);
        renderer.render(&[active(1, 500)]);
        renderer.render(&[active(1, 500)]);
        renderer.render(&[active(1, 500)]);
        renderer.render(&[active(1, 750)]);
        assert_eq!(renderer.last_progress().fraction(), Some(0.75));
    }

    #[test]
    fn test_badge_colours_then_text_on_completion() {
        let mut surface = MockSurface::new();
        let mut seq = Sequence::new();
        surface.expect_set_icon().return_const(());
        surface
            .expect_set_badge_background_color()
            .with(eq(BadgeColor::rgb(0x00, 0x80, 0x00)))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        surface
            .expect_set_badge_text_color()
            .with(eq(BadgeColor::rgb(0xff, 0xff, 0xff)))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        surface
            .expect_set_badge_text()
            .with(eq("+"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let mut renderer = ProgressRenderer::new(Arc::new(surface), 32);
        assert!(renderer.render(&[active(1, 10)]).is_none());
        let done = active(1, 1000).with_state(DownloadState::Complete);
        assert!(renderer.render(&[done.clone()]).is_some());
        assert!(renderer.render(&[done]).is_none());
    }

    #[test]
    fn test_single_download_scenario() {
        let (mut registry, surface) = wired();

        registry.apply_created(active(1, 0), ChangeOrigin::HostEvent);
        assert_eq!(surface.take(), vec![Call::Icon]);

        registry
            .replace(active(1, 500), ChangeOrigin::Poll)
            .unwrap();
        assert_eq!(surface.take(), vec![Call::Icon]);

        registry
            .apply_delta(
                &DownloadDelta::new(1).with_state(DownloadState::Complete),
                ChangeOrigin::HostEvent,
            )
            .unwrap();
        assert_eq!(
            surface.take(),
            vec![
                Call::Icon,
                Call::Background(BadgeColor::COMPLETE_BACKGROUND),
                Call::TextColor(BadgeColor::COMPLETE_TEXT),
                Call::Badge("+".to_string()),
            ]
        );

        // Idle heartbeat neither redraws nor re-fires.
        registry.touch(ChangeOrigin::Heartbeat);
        assert!(surface.take().is_empty());

        // The next host event of any kind dismisses the badge.
        registry.apply_erased(DownloadId::new(1), ChangeOrigin::HostEvent);
        assert_eq!(surface.take(), vec![Call::Badge(String::new())]);
    }

    #[test]
    fn test_poll_changes_keep_the_badge() {
        let (mut registry, surface) = wired();
        registry.apply_created(active(1, 0), ChangeOrigin::HostEvent);
        registry
            .apply_delta(
                &DownloadDelta::new(1).with_state(DownloadState::Complete),
                ChangeOrigin::HostEvent,
            )
            .unwrap();
        surface.take();

        let refreshed = active(1, 1000).with_state(DownloadState::Complete);
        registry.replace(refreshed, ChangeOrigin::Refresh).unwrap();
        assert!(surface.take().is_empty());
    }

    fn badges(calls: Vec<Call>) -> Vec<String> {
        calls
            .into_iter()
            .filter_map(|call| match call {
                Call::Badge(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn unsized_record(id: u64) -> DownloadRecord {
        DownloadRecord::new(id, "https://example.com/live", format!("/dl/{id}")).with_bytes(400, -1)
    }

    #[test]
    fn test_unknown_totals_show_idle_glyph() {
        let surface = Arc::new(RecordingSurface::default());
        let mut renderer = ProgressRenderer::new(surface.clone(), 32);

        renderer.render(&[unsized_record(3)]);
        assert_eq!(renderer.last_progress(), AggregateProgress::Indeterminate);
        assert_eq!(surface.take(), vec![Call::Icon]);

        // Same idle glyph as an empty registry, so nothing is redrawn.
        let none: [DownloadRecord; 0] = [];
        renderer.render(&none);
        assert!(surface.take().is_empty());
    }

    #[test]
    fn test_sized_to_unsized_only_fires_completion() {
        let surface = Arc::new(RecordingSurface::default());
        let mut renderer = ProgressRenderer::new(surface.clone(), 32);
        let sized = DownloadRecord::new(1, "https://example.com/a", "/dl/1").with_bytes(10, 100);

        renderer.render(&[sized.clone(), unsized_record(2)]);
        assert!(badges(surface.take()).is_empty());

        let finished = sized.with_bytes(100, 100).with_state(DownloadState::Complete);
        assert!(renderer.render(&[finished.clone(), unsized_record(2)]).is_some());
        assert_eq!(badges(surface.take()), vec!["+"]);

        let unsized_done = unsized_record(2).with_state(DownloadState::Complete);
        assert!(renderer.render(&[finished, unsized_done]).is_none());
        assert!(badges(surface.take()).is_empty());
    }

    #[test]
    fn test_unsized_only_to_idle_does_not_fire() {
        let surface = Arc::new(RecordingSurface::default());
        let mut renderer = ProgressRenderer::new(surface.clone(), 32);

        assert!(renderer.render(&[unsized_record(2)]).is_none());
        let done = unsized_record(2).with_state(DownloadState::Complete);
        assert!(renderer.render(&[done]).is_none());
        assert!(badges(surface.take()).is_empty());
    }
}
