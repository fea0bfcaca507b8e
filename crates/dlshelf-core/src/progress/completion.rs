//! Busy → idle edge detection.
//!
//! A busy period starts when the aggregate fraction becomes defined and ends
//! when it is undefined again. Each period is an [`ActivityRun`]; the falling edge yields
//! exactly one [`CompletionNotice`].

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Badge text shown when a busy period finishes.
pub const COMPLETION_BADGE_TEXT: &str = "+";

/// One continuous busy period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivityRun {
    /// Unique id for log correlation.
    pub run_id: Uuid,
    /// When the aggregate first became busy.
    pub started_at: DateTime<Utc>,
}

impl ActivityRun {
    fn begin(now: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
        }
    }
}

/// Emitted once per busy → idle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletionNotice {
    /// The run that just finished.
    pub run: ActivityRun,
    /// When the aggregate went idle.
    pub finished_at: DateTime<Utc>,
}

impl CompletionNotice {
    /// Length of the busy period.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.finished_at - self.run.started_at
    }
}

/// Tracks the previous aggregate state across renders.
#[derive(Debug, Default)]
pub struct CompletionEdgeDetector {
    current: Option<ActivityRun>,
}

impl CompletionEdgeDetector {
    /// Create a detector in the idle state.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Feed the latest busy flag.
    pub fn observe(&mut self, busy: bool, now: DateTime<Utc>) -> Option<CompletionNotice> {
        match (self.current, busy) {
            (None, true) => {
                let run = ActivityRun::begin(now);
                tracing::debug!(target: "dlshelf.render", run_id = %run.run_id, "Activity run started");
                self.current = Some(run);
                None
            }
            (Some(run), false) => {
                self.current = None;
                Some(CompletionNotice {
                    run,
                    finished_at: now,
                })
            }
            _ => None,
        }
    }

    /// Whether a run is open.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// The open run, if any.
    #[must_use]
    pub const fn current_run(&self) -> Option<&ActivityRun> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_800_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_fires_once_on_falling_edge() {
        let mut detector = CompletionEdgeDetector::new();
        assert_eq!(detector.observe(false, at(0)), None);
        assert_eq!(detector.observe(true, at(1)), None);
        assert_eq!(detector.observe(true, at(2)), None);

        let notice = detector.observe(false, at(5)).unwrap();
        assert_eq!(notice.duration(), Duration::seconds(4));

        assert_eq!(detector.observe(false, at(6)), None);
        assert_eq!(detector.observe(false, at(7)), None);
    }

    #[test]
    fn test_each_run_gets_a_new_id() {
        let mut detector = CompletionEdgeDetector::new();
        detector.observe(true, at(0));
        let first = detector.current_run().unwrap().run_id;
        let notice = detector.observe(false, at(1)).unwrap();
        assert_eq!(notice.run.run_id, first);

        detector.observe(true, at(2));
        assert!(detector.is_busy());
        assert_ne!(detector.current_run().unwrap().run_id, first);
    }

    #[test]
    fn test_idle_start_never_fires() {
        let mut detector = CompletionEdgeDetector::default();
        for second in 0..10 {
            assert!(detector.observe(false, at(second)).is_none());
        }
    }
}
