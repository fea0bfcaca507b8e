//! The shelf engine event loop.
//!
//! One task owns the registry and everything keyed by download id. It
//! drains host events, poll results, refresh results, icon results,
//! heartbeat ticks and operator requests one message at a time, so no
//! locks guard the registry and observers only ever see it post-mutation.
//!
//! Host calls never run on the loop itself. Polls, refreshes, icon fetches
//! and actions are spawned and report back through an internal channel or
//! a oneshot reply.

mod handle;

pub use handle::EngineHandle;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use dlshelf_core::{
    Action, ChangeOrigin, DownloadId, DownloadRecord, DownloadRegistry, HostDownloadService,
    HostError, HostEvent, IconBitmap, ListFilter, NotificationSurface, PresentationState,
    ProgressRenderer, RegistryObserver, SettingsError, ShelfError, ShelfResult, ShelfSettings,
    validate_settings,
};

use crate::actions::{ActionDispatcher, ActionOutcome};
use crate::icons::FileIconCache;
use crate::poller::PollScheduler;

const COMMAND_BUFFER: usize = 64;

/// Results reported back by spawned host calls.
///
/// Listing results carry the host event sequence number current when the
/// fetch was issued, so snapshots overtaken by a later event can be told
/// apart from fresh ones.
pub(crate) enum TaskResult {
    Polled {
        id: DownloadId,
        issued: u64,
        result: Result<Vec<DownloadRecord>, HostError>,
    },
    Refreshed {
        issued: u64,
        result: Result<Vec<DownloadRecord>, HostError>,
    },
    IconFetched {
        id: DownloadId,
        result: Result<IconBitmap, HostError>,
    },
}

/// Requests sent through an [`EngineHandle`].
pub(crate) enum EngineCommand {
    Perform {
        id: DownloadId,
        action: Action,
        reply: oneshot::Sender<ShelfResult<ActionOutcome>>,
    },
    Panel {
        reply: oneshot::Sender<Vec<PanelRow>>,
    },
    Shutdown,
}

/// One visible download as the panel shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    /// Canonical record.
    pub record: DownloadRecord,
    /// Presentation variant.
    pub state: PresentationState,
    /// Actions offered in that variant.
    pub actions: Vec<Action>,
    /// Smoothed transfer rate in bytes per second.
    pub rate: f64,
    /// File-type icon, or the placeholder.
    pub icon: IconBitmap,
}

impl PanelRow {
    /// Per-record progress, `None` while the total is unknown.
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        self.record.fraction().ok()
    }
}

/// Owns the registry and drives it from the host.
pub struct ShelfEngine {
    host: Arc<dyn HostDownloadService>,
    settings: ShelfSettings,
    registry: DownloadRegistry,
    poller: PollScheduler,
    icons: FileIconCache,
    dispatcher: ActionDispatcher,
    events: mpsc::Receiver<HostEvent>,
    events_open: bool,
    commands: mpsc::Receiver<EngineCommand>,
    results_tx: mpsc::UnboundedSender<TaskResult>,
    results_rx: mpsc::UnboundedReceiver<TaskResult>,
    heartbeat: Option<Interval>,
    refresh_in_flight: bool,
    /// Count of host events handled so far.
    event_seq: u64,
    /// Sequence number of the last host event per record.
    last_event: HashMap<DownloadId, u64>,
}

impl ShelfEngine {
    /// Build an engine over `host` and its event feed.
    ///
    /// Fails when `settings` are out of range.
    pub fn new(
        host: Arc<dyn HostDownloadService>,
        events: mpsc::Receiver<HostEvent>,
        settings: ShelfSettings,
    ) -> Result<(Self, EngineHandle), SettingsError> {
        validate_settings(&settings)?;
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        let engine = Self {
            poller: PollScheduler::new(
                settings.effective_poll_interval(),
                settings.effective_throughput_window_cap(),
            ),
            icons: FileIconCache::new(settings.effective_file_icon_size()),
            dispatcher: ActionDispatcher::new(settings.effective_retry_keeps_filename()),
            registry: DownloadRegistry::new(),
            host,
            events,
            events_open: true,
            commands,
            results_tx,
            results_rx,
            heartbeat: None,
            refresh_in_flight: false,
            event_seq: 0,
            last_event: HashMap::new(),
            settings,
        };
        Ok((engine, EngineHandle::new(command_tx)))
    }

    /// Subscribe an observer to every registry mutation.
    pub fn subscribe(&mut self, observer: Box<dyn RegistryObserver>) {
        self.registry.subscribe(observer);
    }

    /// Attach a progress renderer drawing onto `surface`.
    #[must_use]
    pub fn with_surface(mut self, surface: Arc<dyn NotificationSurface>) -> Self {
        let renderer = ProgressRenderer::new(surface, self.settings.effective_icon_size());
        self.registry.subscribe(Box::new(renderer));
        self
    }

    /// Run the loop on a new task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until shutdown is requested or every handle is dropped.
    pub async fn run(mut self) {
        self.load_initial().await;
        self.sync_heartbeat();

        loop {
            tokio::select! {
                event = self.events.recv(), if self.events_open => match event {
                    Some(event) => self.handle_host_event(event),
                    None => {
                        tracing::info!(target: "dlshelf.engine", "Host event feed closed");
                        self.events_open = false;
                    }
                },
                command = self.commands.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(result) = self.results_rx.recv() => self.handle_task_result(result),
                () = next_tick(self.heartbeat.as_mut()) => self.handle_heartbeat(),
            }
            self.sync_heartbeat();
        }

        tracing::debug!(target: "dlshelf.engine", "Engine stopped");
    }

    async fn load_initial(&mut self) {
        let filter = ListFilter::all().with_limit(self.settings.initial_list_limit);
        match self.host.list(&filter).await {
            Ok(records) => {
                let count = records.len();
                self.registry.load(records);
                for record in self.registry.snapshot() {
                    self.track(&record);
                }
                tracing::info!(target: "dlshelf.engine", count, "Initial listing loaded");
            }
            Err(err) => {
                tracing::warn!(target: "dlshelf.engine", %err, "Initial listing failed, starting empty");
            }
        }
    }

    fn handle_host_event(&mut self, event: HostEvent) {
        tracing::debug!(
            target: "dlshelf.engine",
            event = event.event_name(),
            id = %event.id(),
            "Host event"
        );

        self.event_seq += 1;
        match &event {
            HostEvent::Erased { id } => {
                self.last_event.remove(id);
            }
            other => {
                self.last_event.insert(other.id(), self.event_seq);
            }
        }

        match event {
            HostEvent::Created { record } => {
                if self
                    .registry
                    .apply_created(record.clone(), ChangeOrigin::HostEvent)
                {
                    self.track(&record);
                }
            }
            HostEvent::Changed { delta } => {
                match self.registry.apply_delta(&delta, ChangeOrigin::HostEvent) {
                    Ok(merged) => self.track(&merged),
                    Err(err) => tracing::debug!(target: "dlshelf.engine", %err, "Delta dropped"),
                }
            }
            HostEvent::Erased { id } => {
                self.registry.apply_erased(id, ChangeOrigin::HostEvent);
                self.poller.forget(id);
                self.icons.forget(id);
            }
        }
    }

    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Perform { id, action, reply } => {
                let prepared = self
                    .registry
                    .get(id)
                    .filter(|record| record.is_materialized())
                    .ok_or_else(|| ShelfError::unknown_record(id))
                    .and_then(|record| self.dispatcher.prepare(record, action));

                match prepared {
                    Ok(command) => {
                        tracing::info!(
                            target: "dlshelf.engine",
                            %id,
                            %action,
                            operation = command.operation(),
                            "Dispatching action"
                        );
                        let host = Arc::clone(&self.host);
                        tokio::spawn(async move {
                            let outcome = ActionDispatcher::execute(host.as_ref(), command).await;
                            let _ = reply.send(outcome);
                        });
                    }
                    Err(err) => {
                        tracing::debug!(target: "dlshelf.engine", %err, "Action refused");
                        let _ = reply.send(Err(err));
                    }
                }
            }
            EngineCommand::Panel { reply } => {
                let _ = reply.send(self.panel_rows());
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn handle_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Polled { id, issued, result } => self.handle_poll_result(id, issued, result),
            TaskResult::Refreshed { issued, result } => self.handle_refresh(issued, result),
            TaskResult::IconFetched { id, result } => self.icons.resolve(id, result),
        }
    }

    fn handle_poll_result(
        &mut self,
        id: DownloadId,
        issued: u64,
        result: Result<Vec<DownloadRecord>, HostError>,
    ) {
        self.poller.complete(id);

        let record = match result {
            Ok(records) => records.into_iter().find(|record| record.id == id),
            Err(err) => {
                tracing::warn!(target: "dlshelf.poll", %id, %err, "Poll fetch failed, chain ended");
                self.poller.forget(id);
                return;
            }
        };
        let Some(record) = record else {
            tracing::debug!(target: "dlshelf.poll", %id, "Record vanished from host, chain ended");
            self.poller.forget(id);
            return;
        };

        if self.is_stale(id, issued) {
            tracing::debug!(target: "dlshelf.poll", %id, issued, "Poll result predates a host event, discarded");
            // The event may have stopped or restarted the chain.
            if let Some(current) = self.registry.get(id).cloned() {
                self.track(&current);
            }
            return;
        }

        match self.registry.replace(record.clone(), ChangeOrigin::Poll) {
            Ok(()) => self.track(&record),
            Err(err) => {
                tracing::debug!(target: "dlshelf.poll", %err, "Poll result dropped");
                self.poller.forget(id);
            }
        }
    }

    fn handle_heartbeat(&mut self) {
        if self.registry.in_progress().next().is_none() {
            return;
        }
        self.registry.touch(ChangeOrigin::Heartbeat);

        if !self.settings.effective_refresh_on_heartbeat() || self.refresh_in_flight {
            return;
        }
        self.refresh_in_flight = true;
        let host = Arc::clone(&self.host);
        let results = self.results_tx.clone();
        let issued = self.event_seq;
        tokio::spawn(async move {
            let result = host.list(&ListFilter::in_progress()).await;
            let _ = results.send(TaskResult::Refreshed { issued, result });
        });
    }

    fn handle_refresh(&mut self, issued: u64, result: Result<Vec<DownloadRecord>, HostError>) {
        self.refresh_in_flight = false;
        let records = match result {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(target: "dlshelf.engine", %err, "Heartbeat refresh failed");
                return;
            }
        };

        for record in records {
            if !self.registry.contains(record.id) {
                continue;
            }
            if self.is_stale(record.id, issued) {
                tracing::debug!(target: "dlshelf.engine", id = %record.id, issued, "Refresh entry predates a host event, skipped");
                continue;
            }
            match self.registry.replace(record.clone(), ChangeOrigin::Refresh) {
                Ok(()) => self.track(&record),
                Err(err) => tracing::debug!(target: "dlshelf.engine", %err, "Refresh entry dropped"),
            }
        }
    }

    /// Start polling and icon fetches a record now needs.
    fn track(&mut self, record: &DownloadRecord) {
        let now = Instant::now().into_std();
        if self.poller.sync(record, now) {
            self.poller
                .spawn_fetch(record.id, self.event_seq, &self.host, &self.results_tx);
        }
        if self.icons.request(record) {
            self.icons.spawn_fetch(record.id, &self.host, &self.results_tx);
        }
    }

    /// Whether a host event touched `id` after a fetch issued at `issued`.
    fn is_stale(&self, id: DownloadId, issued: u64) -> bool {
        self.last_event.get(&id).is_some_and(|&seq| seq > issued)
    }

    /// Keep the heartbeat armed exactly while something is in progress.
    fn sync_heartbeat(&mut self) {
        let busy = self.registry.in_progress().next().is_some();
        match (busy, self.heartbeat.is_some()) {
            (true, false) => {
                let period = self.settings.effective_heartbeat_interval();
                let mut interval = tokio::time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.heartbeat = Some(interval);
                tracing::debug!(target: "dlshelf.engine", "Heartbeat armed");
            }
            (false, true) => {
                self.heartbeat = None;
                tracing::debug!(target: "dlshelf.engine", "Heartbeat disarmed");
            }
            _ => {}
        }
    }

    fn panel_rows(&self) -> Vec<PanelRow> {
        self.registry
            .snapshot()
            .into_iter()
            .map(|record| {
                let state = PresentationState::of(&record);
                PanelRow {
                    actions: state.available_actions().to_vec(),
                    rate: self.poller.rate(record.id),
                    icon: self.icons.icon(record.id).clone(),
                    state,
                    record,
                }
            })
            .collect()
    }
}

async fn next_tick(heartbeat: Option<&mut Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
