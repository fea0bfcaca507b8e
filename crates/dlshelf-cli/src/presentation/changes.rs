//! Registry observer that logs host-driven changes.

use dlshelf_core::{ChangeKind, DownloadId, DownloadRecord, RegistryChange, RegistryObserver};

/// Prints one line per host event that reached the registry.
///
/// Poll, refresh and heartbeat changes are skipped; they arrive several
/// times a second and the panel snapshots already cover them.
#[derive(Debug, Default)]
pub struct ChangeLog {
    lines: usize,
}

impl ChangeLog {
    pub const fn new() -> Self {
        Self { lines: 0 }
    }

    /// Format the line for a change, if it should be shown.
    pub fn describe(change: &RegistryChange, snapshot: &[DownloadRecord]) -> Option<String> {
        if !change.is_host_event() {
            return None;
        }
        let name_of = |id: DownloadId| {
            snapshot
                .iter()
                .find(|record| record.id == id)
                .map_or_else(|| format!("#{id}"), |record| record.display_name().to_string())
        };
        match change.kind {
            ChangeKind::Created(id) => Some(format!("[change] + {}", name_of(id))),
            ChangeKind::Updated(id) => {
                let record = snapshot.iter().find(|record| record.id == id)?;
                let paused = if record.paused { " (paused)" } else { "" };
                Some(format!(
                    "[change] ~ {} {}{paused}",
                    record.display_name(),
                    record.state
                ))
            }
            ChangeKind::Erased(id) => Some(format!("[change] - #{id}")),
            ChangeKind::Loaded | ChangeKind::Touched => None,
        }
    }

    /// Number of lines printed.
    pub const fn lines(&self) -> usize {
        self.lines
    }
}

impl RegistryObserver for ChangeLog {
    fn on_registry_change(&mut self, change: &RegistryChange, snapshot: &[DownloadRecord]) {
        if let Some(line) = Self::describe(change, snapshot) {
            self.lines += 1;
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlshelf_core::ChangeOrigin;

    fn snapshot() -> Vec<DownloadRecord> {
        vec![DownloadRecord::new(3, "https://example.com/a.iso", "/dl/a.iso").with_paused(true)]
    }

    #[test]
    fn test_describes_host_events() {
        let id = DownloadId::new(3);
        let created = RegistryChange {
            kind: ChangeKind::Created(id),
            origin: ChangeOrigin::HostEvent,
        };
        assert_eq!(
            ChangeLog::describe(&created, &snapshot()).as_deref(),
            Some("[change] + a.iso")
        );

        let updated = RegistryChange {
            kind: ChangeKind::Updated(id),
            origin: ChangeOrigin::HostEvent,
        };
        assert_eq!(
            ChangeLog::describe(&updated, &snapshot()).as_deref(),
            Some("[change] ~ a.iso in_progress (paused)")
        );
    }

    #[test]
    fn test_skips_polls_and_heartbeats() {
        let polled = RegistryChange {
            kind: ChangeKind::Updated(DownloadId::new(3)),
            origin: ChangeOrigin::Poll,
        };
        assert_eq!(ChangeLog::describe(&polled, &snapshot()), None);

        let touched = RegistryChange {
            kind: ChangeKind::Touched,
            origin: ChangeOrigin::Heartbeat,
        };
        assert_eq!(ChangeLog::describe(&touched, &snapshot()), None);

        let mut log = ChangeLog::new();
        log.on_registry_change(&polled, &snapshot());
        assert_eq!(log.lines(), 0);
    }
}
