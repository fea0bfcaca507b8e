//! Canonical collection of download records.
//!
//! The registry is the single shared mutable resource of the engine. It is
//! mutated one event at a time and announces every mutation to explicitly
//! subscribed observers, which only ever see the post-mutation snapshot.
//!
//! Records whose filename is still empty are held so later deltas can
//! materialize them, but they are never part of the visible snapshot.

use indexmap::IndexMap;

use crate::download::{DownloadDelta, DownloadId, DownloadRecord, ShelfError, ShelfResult};

/// What caused a registry mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Host push notification (created, changed, erased).
    HostEvent,
    /// Initial bulk listing.
    Listing,
    /// Single-record poll re-fetch.
    Poll,
    /// Heartbeat re-listing of in-progress records.
    Refresh,
    /// Periodic re-render request without new data.
    Heartbeat,
}

/// Which records a mutation touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// Record inserted.
    Created(DownloadId),
    /// Record fields changed.
    Updated(DownloadId),
    /// Record removed.
    Erased(DownloadId),
    /// Bulk population replaced the contents.
    Loaded,
    /// Nothing changed; observers are asked to recompute.
    Touched,
}

/// Post-mutation notification delivered to observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryChange {
    /// Records touched.
    pub kind: ChangeKind,
    /// Cause of the mutation.
    pub origin: ChangeOrigin,
}

impl RegistryChange {
    /// Whether the change came from the host's push feed.
    #[must_use]
    pub fn is_host_event(&self) -> bool {
        self.origin == ChangeOrigin::HostEvent
    }
}

/// Subscriber to registry mutations.
///
/// Called synchronously after each mutation with the visible snapshot,
/// newest first.
pub trait RegistryObserver: Send {
    /// React to a completed mutation.
    fn on_registry_change(&mut self, change: &RegistryChange, snapshot: &[DownloadRecord]);
}

/// The canonical record collection.
#[derive(Default)]
pub struct DownloadRegistry {
    records: IndexMap<DownloadId, DownloadRecord>,
    observers: Vec<Box<dyn RegistryObserver>>,
}

impl DownloadRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for all future mutations.
    pub fn subscribe(&mut self, observer: Box<dyn RegistryObserver>) {
        self.observers.push(observer);
    }

    /// Insert a newly created record.
    ///
    /// Returns `false` without touching anything when the id is already
    /// present, so duplicate creation notifications are harmless.
    pub fn apply_created(&mut self, record: DownloadRecord, origin: ChangeOrigin) -> bool {
        let id = record.id;
        if self.records.contains_key(&id) {
            tracing::debug!(target: "dlshelf.registry", %id, "Duplicate creation ignored");
            return false;
        }
        self.records.insert(id, record);
        self.notify(ChangeKind::Created(id), origin);
        true
    }

    /// Merge a delta into the record it names.
    ///
    /// Returns the merged record.
    pub fn apply_delta(
        &mut self,
        delta: &DownloadDelta,
        origin: ChangeOrigin,
    ) -> ShelfResult<DownloadRecord> {
        let slot = self
            .records
            .get_mut(&delta.id)
            .ok_or_else(|| ShelfError::unknown_record(delta.id))?;
        let merged = delta.apply_to(slot);
        slot.clone_from(&merged);

        tracing::trace!(
            target: "dlshelf.registry",
            id = %delta.id,
            fields = ?delta.changed_fields(),
            "Delta merged"
        );
        self.notify(ChangeKind::Updated(delta.id), origin);
        Ok(merged)
    }

    /// Replace a known record wholesale with a freshly fetched copy.
    pub fn replace(&mut self, record: DownloadRecord, origin: ChangeOrigin) -> ShelfResult<()> {
        let id = record.id;
        let slot = self
            .records
            .get_mut(&id)
            .ok_or_else(|| ShelfError::unknown_record(id))?;
        *slot = record;
        self.notify(ChangeKind::Updated(id), origin);
        Ok(())
    }

    /// Remove a record. Unknown ids are a no-op.
    pub fn apply_erased(&mut self, id: DownloadId, origin: ChangeOrigin) -> Option<DownloadRecord> {
        let removed = self.records.shift_remove(&id)?;
        self.notify(ChangeKind::Erased(id), origin);
        Some(removed)
    }

    /// Populate from a bulk listing.
    ///
    /// The listing is inserted oldest first so the newest-first snapshot
    /// matches host creation order. Records already present are kept.
    pub fn load(&mut self, mut records: Vec<DownloadRecord>) {
        records.sort_by_key(|record| record.start_time);
        let mut inserted = 0usize;
        for record in records {
            if !self.records.contains_key(&record.id) {
                self.records.insert(record.id, record);
                inserted += 1;
            }
        }
        tracing::debug!(target: "dlshelf.registry", inserted, "Registry loaded from listing");
        self.notify(ChangeKind::Loaded, ChangeOrigin::Listing);
    }

    /// Ask observers to recompute without changing any record.
    pub fn touch(&mut self, origin: ChangeOrigin) {
        self.notify(ChangeKind::Touched, origin);
    }

    /// Look up a record, placeholders included.
    #[must_use]
    pub fn get(&self, id: DownloadId) -> Option<&DownloadRecord> {
        self.records.get(&id)
    }

    /// Whether the id is held, placeholders included.
    #[must_use]
    pub fn contains(&self, id: DownloadId) -> bool {
        self.records.contains_key(&id)
    }

    /// Visible records, most recently created first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DownloadRecord> {
        self.visible().cloned().collect()
    }

    /// Visible records that are `in_progress`.
    pub fn in_progress(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.visible().filter(|record| record.is_in_progress())
    }

    /// Number of visible records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.visible().count()
    }

    /// Whether no record is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn visible(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.records
            .values()
            .rev()
            .filter(|record| record.is_materialized())
    }

    fn notify(&mut self, kind: ChangeKind, origin: ChangeOrigin) {
        if self.observers.is_empty() {
            return;
        }
        let change = RegistryChange { kind, origin };
        let snapshot: Vec<DownloadRecord> = self
            .records
            .values()
            .rev()
            .filter(|record| record.is_materialized())
            .cloned()
            .collect();
        for observer in &mut self.observers {
            observer.on_registry_change(&change, &snapshot);
        }
    }
}
