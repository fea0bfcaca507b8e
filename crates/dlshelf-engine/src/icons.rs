//! File-type icon cache.
//!
//! Icons are fetched once per record, after the host has chosen a
//! destination, and kept for the record's lifetime. A failed fetch leaves
//! the placeholder in place for good.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use dlshelf_core::{
    DownloadId, DownloadRecord, HostDownloadService, HostError, IconBitmap, ShelfError,
};

use crate::engine::TaskResult;

/// Cache slot for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconEntry {
    /// Fetch outstanding.
    Pending,
    /// Host icon available.
    Ready(IconBitmap),
    /// Fetch failed; placeholder shown.
    Failed,
}

/// Per-record icon cache.
#[derive(Debug)]
pub struct FileIconCache {
    size: u32,
    entries: HashMap<DownloadId, IconEntry>,
    placeholder: IconBitmap,
}

impl FileIconCache {
    /// Create an empty cache for `size` pixel icons.
    #[must_use]
    pub fn new(size: u32) -> Self {
        Self {
            size,
            entries: HashMap::new(),
            placeholder: IconBitmap::placeholder(size),
        }
    }

    /// Reserve a slot for `record` if it needs a fetch.
    ///
    /// Returns `true` when the caller should issue the fetch.
    pub fn request(&mut self, record: &DownloadRecord) -> bool {
        if !record.is_materialized() || self.entries.contains_key(&record.id) {
            return false;
        }
        self.entries.insert(record.id, IconEntry::Pending);
        true
    }

    /// Store a fetch result. Results for forgotten records are dropped.
    pub fn resolve(&mut self, id: DownloadId, result: Result<IconBitmap, HostError>) {
        let Some(entry) = self.entries.get_mut(&id) else {
            tracing::debug!(target: "dlshelf.engine", %id, "Icon for removed record dropped");
            return;
        };
        *entry = match result {
            Ok(icon) => IconEntry::Ready(icon),
            Err(err) => {
                let err = ShelfError::icon_fetch_failed(id, err.to_string());
                tracing::warn!(target: "dlshelf.engine", %err, "Keeping placeholder icon");
                IconEntry::Failed
            }
        };
    }

    /// Icon to display for `id`: the host icon or the placeholder.
    #[must_use]
    pub fn icon(&self, id: DownloadId) -> &IconBitmap {
        match self.entries.get(&id) {
            Some(IconEntry::Ready(icon)) => icon,
            _ => &self.placeholder,
        }
    }

    /// Cache slot for `id`.
    #[must_use]
    pub fn entry(&self, id: DownloadId) -> Option<&IconEntry> {
        self.entries.get(&id)
    }

    /// Drop the slot of an erased record.
    pub fn forget(&mut self, id: DownloadId) {
        self.entries.remove(&id);
    }

    pub(crate) fn spawn_fetch(
        &self,
        id: DownloadId,
        host: &Arc<dyn HostDownloadService>,
        results: &mpsc::UnboundedSender<TaskResult>,
    ) {
        let host = Arc::clone(host);
        let results = results.clone();
        let size = self.size;
        tokio::spawn(async move {
            let result = host.get_icon(id, size).await;
            let _ = results.send(TaskResult::IconFetched { id, result });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetches_once_after_materialization() {
        let mut cache = FileIconCache::new(16);
        let placeholder = DownloadRecord::new(1, "https://example.com/a", "");
        assert!(!cache.request(&placeholder));

        let record = DownloadRecord::new(1, "https://example.com/a", "/dl/a.zip");
        assert!(cache.request(&record));
        assert!(!cache.request(&record));
        assert_eq!(cache.entry(record.id), Some(&IconEntry::Pending));
    }

    #[test]
    fn test_failure_keeps_placeholder() {
        let mut cache = FileIconCache::new(16);
        let record = DownloadRecord::new(2, "https://example.com/b", "/dl/b");
        cache.request(&record);
        cache.resolve(record.id, Err(HostError::Unavailable("icon service".into())));

        assert_eq!(cache.entry(record.id), Some(&IconEntry::Failed));
        assert_eq!(cache.icon(record.id), &IconBitmap::placeholder(16));
        assert!(!cache.request(&record));
    }

    #[test]
    fn test_ready_icon_and_forget() {
        let mut cache = FileIconCache::new(2);
        let record = DownloadRecord::new(3, "https://example.com/c", "/dl/c.txt");
        cache.request(&record);
        let icon = IconBitmap::from_rgba(2, 2, vec![9; 16]).unwrap();
        cache.resolve(record.id, Ok(icon.clone()));
        assert_eq!(cache.icon(record.id), &icon);

        cache.forget(record.id);
        cache.resolve(record.id, Ok(icon));
        assert_eq!(cache.entry(record.id), None);
    }
}
