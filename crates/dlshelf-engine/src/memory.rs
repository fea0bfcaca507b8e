//! In-memory host download service.
//!
//! Stands in for a real host in simulations and tests. Like a real host it
//! pushes created / changed / erased events for state transitions but never
//! for byte counts: `advance` moves bytes silently and only polling sees it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::{Mutex, mpsc};

use dlshelf_core::{
    DangerType, DownloadDelta, DownloadId, DownloadRecord, DownloadState, HostDownloadService,
    HostError, HostEvent, IconBitmap, ListFilter, StartRequest,
};

const DOWNLOAD_DIR: &str = "/downloads";

#[derive(Debug, Default)]
struct HostState {
    records: IndexMap<DownloadId, DownloadRecord>,
    /// Known sizes by URL, used when a transfer starts.
    sizes: HashMap<String, i64>,
    next_id: u64,
    /// Launch requests (`open`, `show`, `open_url`) in call order.
    launches: Vec<String>,
}

/// A scripted host that keeps its downloads in memory.
pub struct InMemoryHost {
    state: Mutex<HostState>,
    events: mpsc::Sender<HostEvent>,
}

impl InMemoryHost {
    /// Create a host and the receiving end of its event feed.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<HostEvent>) {
        let (events, rx) = mpsc::channel(capacity.max(1));
        let host = Self {
            state: Mutex::new(HostState {
                next_id: 1,
                ..HostState::default()
            }),
            events,
        };
        (host, rx)
    }

    /// Register the size the host will discover for `url`.
    pub async fn set_size(&self, url: impl Into<String>, total_bytes: i64) {
        self.state.lock().await.sizes.insert(url.into(), total_bytes);
    }

    /// Seed an existing download without emitting events, as if it predates
    /// the engine.
    pub async fn seed(&self, record: DownloadRecord) {
        let mut state = self.state.lock().await;
        state.next_id = state.next_id.max(record.id.get() + 1);
        state.records.insert(record.id, record);
    }

    /// Receive `bytes` more for a running transfer. No event is pushed.
    pub async fn advance(&self, id: DownloadId, bytes: u64) -> Result<u64, HostError> {
        let mut state = self.state.lock().await;
        let record = state.records.get_mut(&id).ok_or(HostError::NotFound { id })?;
        if !record.is_transferring() {
            return Err(HostError::rejected("advance", "transfer is not running"));
        }
        record.bytes_received += bytes;
        if let Some(total) = record.known_total() {
            record.bytes_received = record.bytes_received.min(total);
        }
        Ok(record.bytes_received)
    }

    /// Finish a transfer.
    pub async fn finish(&self, id: DownloadId) -> Result<(), HostError> {
        self.transition("finish", id, |record| {
            if !record.is_in_progress() {
                return Err("transfer is not in progress");
            }
            if let Some(total) = record.known_total() {
                record.bytes_received = total;
            }
            record.file_size = record.bytes_received;
            record.total_bytes = i64::try_from(record.bytes_received).unwrap_or(i64::MAX);
            record.state = DownloadState::Complete;
            record.paused = false;
            Ok(())
        })
        .await
    }

    /// Interrupt a transfer with `reason`.
    pub async fn interrupt(
        &self,
        id: DownloadId,
        reason: &str,
        can_resume: bool,
    ) -> Result<(), HostError> {
        self.transition("interrupt", id, |record| {
            if !record.is_in_progress() {
                return Err("transfer is not in progress");
            }
            record.state = DownloadState::Interrupted;
            record.can_resume = can_resume;
            record.error = Some(reason.to_string());
            Ok(())
        })
        .await
    }

    /// Classify a download as dangerous.
    pub async fn flag_danger(&self, id: DownloadId, kind: &str) -> Result<(), HostError> {
        let danger = DangerType::from(kind);
        self.transition("flag_danger", id, move |record| {
            record.danger = danger;
            Ok(())
        })
        .await
    }

    /// Current host-side copy of a record.
    pub async fn record(&self, id: DownloadId) -> Option<DownloadRecord> {
        self.state.lock().await.records.get(&id).cloned()
    }

    /// Launch requests received so far.
    pub async fn launches(&self) -> Vec<String> {
        self.state.lock().await.launches.clone()
    }

    async fn transition<F>(&self, operation: &str, id: DownloadId, apply: F) -> Result<(), HostError>
    where
        F: FnOnce(&mut DownloadRecord) -> Result<(), &'static str> + Send,
    {
        let delta = {
            let mut state = self.state.lock().await;
            let record = state.records.get_mut(&id).ok_or(HostError::NotFound { id })?;
            let before = record.clone();
            apply(record).map_err(|reason| HostError::rejected(operation, reason))?;
            DownloadDelta::between(&before, record)
        };
        if !delta.is_empty() {
            self.emit(HostEvent::changed(delta)).await;
        }
        Ok(())
    }

    async fn launch(&self, operation: &str, id: DownloadId) -> Result<(), HostError> {
        let mut state = self.state.lock().await;
        let record = state.records.get(&id).ok_or(HostError::NotFound { id })?;
        if record.state != DownloadState::Complete || !record.exists {
            return Err(HostError::rejected(operation, "file is not available"));
        }
        state.launches.push(format!("{operation}:{id}"));
        Ok(())
    }

    async fn emit(&self, event: HostEvent) {
        tracing::trace!(target: "dlshelf.engine", event = event.event_name(), id = %event.id(), "Host event");
        if self.events.send(event).await.is_err() {
            tracing::debug!(target: "dlshelf.engine", "Host event dropped, no listener");
        }
    }
}

fn destination_for(url: &str) -> String {
    let name = url
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("download");
    format!("{DOWNLOAD_DIR}/{name}")
}

#[async_trait]
impl HostDownloadService for InMemoryHost {
    async fn list(&self, filter: &ListFilter) -> Result<Vec<DownloadRecord>, HostError> {
        let state = self.state.lock().await;
        let matching = state.records.values().filter(|record| filter.matches(record));
        Ok(match filter.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        })
    }

    async fn start(&self, request: &StartRequest) -> Result<DownloadId, HostError> {
        if request.url.is_empty() {
            return Err(HostError::rejected("start", "empty url"));
        }
        let (created, named) = {
            let mut state = self.state.lock().await;
            let id = DownloadId::new(state.next_id);
            state.next_id += 1;
            let total = state.sizes.get(&request.url).copied().unwrap_or(-1);
            let mut record = DownloadRecord::new(id, request.url.clone(), "").with_bytes(0, total);
            record.start_time = Some(Utc::now());
            let created = record.clone();

            record.filename = request
                .filename
                .clone()
                .unwrap_or_else(|| destination_for(&request.url));
            let named = DownloadDelta::between(&created, &record);
            state.records.insert(id, record);
            (created, named)
        };

        let id = created.id;
        // The destination is chosen after creation, as real hosts do.
        self.emit(HostEvent::created(created)).await;
        self.emit(HostEvent::changed(named)).await;
        Ok(id)
    }

    async fn pause(&self, id: DownloadId) -> Result<(), HostError> {
        self.transition("pause", id, |record| {
            if !record.is_transferring() {
                return Err("transfer is not running");
            }
            record.paused = true;
            Ok(())
        })
        .await
    }

    async fn resume(&self, id: DownloadId) -> Result<(), HostError> {
        self.transition("resume", id, |record| match record.state {
            DownloadState::InProgress if record.paused => {
                record.paused = false;
                Ok(())
            }
            DownloadState::Interrupted if record.can_resume => {
                record.state = DownloadState::InProgress;
                record.paused = false;
                record.error = None;
                Ok(())
            }
            _ => Err("transfer cannot be resumed"),
        })
        .await
    }

    async fn cancel(&self, id: DownloadId) -> Result<(), HostError> {
        self.transition("cancel", id, |record| {
            if !record.is_in_progress() {
                return Err("transfer is not in progress");
            }
            record.state = DownloadState::Interrupted;
            record.paused = false;
            record.can_resume = false;
            record.error = Some("USER_CANCELED".to_string());
            Ok(())
        })
        .await
    }

    async fn erase(&self, id: DownloadId) -> Result<(), HostError> {
        let removed = self.state.lock().await.records.shift_remove(&id);
        if removed.is_none() {
            return Err(HostError::NotFound { id });
        }
        self.emit(HostEvent::erased(id)).await;
        Ok(())
    }

    async fn remove_file(&self, id: DownloadId) -> Result<(), HostError> {
        self.transition("remove_file", id, |record| {
            if record.state != DownloadState::Complete || !record.exists {
                return Err("file is not on disk");
            }
            record.exists = false;
            Ok(())
        })
        .await
    }

    async fn open(&self, id: DownloadId) -> Result<(), HostError> {
        self.launch("open", id).await
    }

    async fn show(&self, id: DownloadId) -> Result<(), HostError> {
        self.launch("show", id).await
    }

    async fn accept_risk(&self, id: DownloadId) -> Result<(), HostError> {
        self.transition("accept_risk", id, |record| {
            if !record.danger.is_pending() {
                return Err("download is not flagged");
            }
            record.danger = DangerType::Accepted;
            Ok(())
        })
        .await
    }

    async fn open_url(&self, url: &str) -> Result<(), HostError> {
        if url.is_empty() {
            return Err(HostError::rejected("open_url", "empty url"));
        }
        self.state.lock().await.launches.push(format!("open_url:{url}"));
        Ok(())
    }

    async fn get_icon(&self, id: DownloadId, size: u32) -> Result<IconBitmap, HostError> {
        let state = self.state.lock().await;
        let record = state.records.get(&id).ok_or(HostError::NotFound { id })?;
        let extension = record
            .display_name()
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| HostError::rejected("get_icon", "no icon for this file type"))?;

        // One flat colour per extension.
        let shade = extension.bytes().fold(0u8, u8::wrapping_add);
        let pixel = [shade, shade.wrapping_mul(3), shade.wrapping_mul(7), 0xff];
        let bytes = pixel.repeat((size * size) as usize);
        IconBitmap::from_rgba(size, size, bytes)
            .ok_or_else(|| HostError::rejected("get_icon", "bad icon dimensions"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_emits_placeholder_then_filename() {
        let (host, mut events) = InMemoryHost::new(8);
        host.set_size("https://example.com/a.iso", 1000).await;
        let id = host
            .start(&StartRequest {
                url: "https://example.com/a.iso".into(),
                filename: None,
            })
            .await
            .unwrap();

        let Some(HostEvent::Created { record }) = events.recv().await else {
            panic!("expected created");
        };
        assert_eq!(record.id, id);
        assert!(!record.is_materialized());
        assert_eq!(record.total_bytes, 1000);

        let Some(HostEvent::Changed { delta }) = events.recv().await else {
            panic!("expected changed");
        };
        assert_eq!(delta.changed_fields(), vec!["filename"]);
        assert_eq!(
            host.record(id).await.unwrap().filename,
            "/downloads/a.iso"
        );
    }

    #[tokio::test]
    async fn test_bytes_move_without_events() {
        let (host, mut events) = InMemoryHost::new(8);
        host.seed(DownloadRecord::new(4, "https://example.com/b", "/dl/b").with_bytes(0, 100))
            .await;
        assert_eq!(host.advance(DownloadId::new(4), 60).await, Ok(60));
        assert_eq!(host.advance(DownloadId::new(4), 60).await, Ok(100));
        assert!(events.try_recv().is_err());

        let listed = host.list(&ListFilter::by_id(DownloadId::new(4))).await.unwrap();
        assert_eq!(listed[0].bytes_received, 100);
    }

    #[tokio::test]
    async fn test_pause_emits_delta_and_rejects_twice() {
        let (host, mut events) = InMemoryHost::new(8);
        host.seed(DownloadRecord::new(1, "https://example.com/c", "/dl/c")).await;
        host.pause(DownloadId::new(1)).await.unwrap();

        let Some(HostEvent::Changed { delta }) = events.recv().await else {
            panic!("expected changed");
        };
        assert_eq!(delta.changed_fields(), vec!["paused"]);
        assert!(matches!(
            host.pause(DownloadId::new(1)).await,
            Err(HostError::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_filters_and_limits() {
        let (host, _events) = InMemoryHost::new(8);
        for id in 1..=3 {
            host.seed(DownloadRecord::new(id, "https://example.com/x", format!("/dl/{id}")))
                .await;
        }
        host.seed(
            DownloadRecord::new(4, "https://example.com/y", "/dl/4")
                .with_state(DownloadState::Complete),
        )
        .await;

        let running = host.list(&ListFilter::in_progress()).await.unwrap();
        assert_eq!(running.len(), 3);
        let limited = host.list(&ListFilter::all().with_limit(Some(2))).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_icon_requires_extension() {
        let (host, _events) = InMemoryHost::new(8);
        host.seed(DownloadRecord::new(1, "u", "/dl/archive.zip")).await;
        host.seed(DownloadRecord::new(2, "u", "/dl/README")).await;

        let icon = host.get_icon(DownloadId::new(1), 16).await.unwrap();
        assert_eq!(icon.width(), 16);
        assert!(host.get_icon(DownloadId::new(2), 16).await.is_err());
    }
}
