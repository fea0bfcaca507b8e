//! Operator action dispatch.
//!
//! An action is validated against the record's presentation state at the
//! moment it is requested, turned into a host command, and executed off the
//! engine loop. The local record never changes here; the host's change
//! event is the only source of truth.

use dlshelf_core::{
    Action, DownloadId, DownloadRecord, HostDownloadService, HostError, PresentationState,
    ShelfError, ShelfResult, StartRequest,
};

/// Host call(s) backing one operator action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    AcceptRisk(DownloadId),
    Pause(DownloadId),
    Resume(DownloadId),
    Cancel(DownloadId),
    Erase(DownloadId),
    OpenUrl(String),
    Start(StartRequest),
    Open(DownloadId),
    Show(DownloadId),
    /// Remove the file, then the host entry.
    DeleteFile(DownloadId),
}

impl HostCommand {
    /// Operation name for logs and errors.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::AcceptRisk(_) => "accept_risk",
            Self::Pause(_) => "pause",
            Self::Resume(_) => "resume",
            Self::Cancel(_) => "cancel",
            Self::Erase(_) => "erase",
            Self::OpenUrl(_) => "open_url",
            Self::Start(_) => "start",
            Self::Open(_) => "open",
            Self::Show(_) => "show",
            Self::DeleteFile(_) => "delete_file",
        }
    }
}

/// What an accepted action produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The host acknowledged the command.
    Done,
    /// A retry started a new download.
    Started(DownloadId),
}

/// Maps operator actions onto host commands.
#[derive(Debug, Clone, Copy)]
pub struct ActionDispatcher {
    retry_keeps_filename: bool,
}

impl ActionDispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub const fn new(retry_keeps_filename: bool) -> Self {
        Self {
            retry_keeps_filename,
        }
    }

    /// Validate `action` for `record` and build the host command.
    pub fn prepare(&self, record: &DownloadRecord, action: Action) -> ShelfResult<HostCommand> {
        let state = PresentationState::of(record);
        if !state.allows(action) {
            return Err(ShelfError::ActionNotAvailable {
                id: record.id,
                action,
                state,
            });
        }

        let id = record.id;
        Ok(match action {
            Action::AcceptRisk => HostCommand::AcceptRisk(id),
            Action::Pause => HostCommand::Pause(id),
            Action::Resume => HostCommand::Resume(id),
            Action::Cancel => HostCommand::Cancel(id),
            Action::Erase => HostCommand::Erase(id),
            Action::OpenSourceLink => HostCommand::OpenUrl(record.url.clone()),
            Action::Retry => {
                HostCommand::Start(StartRequest::retry_of(record, self.retry_keeps_filename))
            }
            Action::Open => HostCommand::Open(id),
            Action::Reveal => HostCommand::Show(id),
            Action::DeleteFile => HostCommand::DeleteFile(id),
        })
    }

    /// Run a prepared command against the host.
    ///
    /// Failures are not retried.
    pub async fn execute(
        host: &dyn HostDownloadService,
        command: HostCommand,
    ) -> ShelfResult<ActionOutcome> {
        let operation = command.operation();
        let result: Result<ActionOutcome, HostError> = match command {
            HostCommand::AcceptRisk(id) => host.accept_risk(id).await.map(|()| ActionOutcome::Done),
            HostCommand::Pause(id) => host.pause(id).await.map(|()| ActionOutcome::Done),
            HostCommand::Resume(id) => host.resume(id).await.map(|()| ActionOutcome::Done),
            HostCommand::Cancel(id) => host.cancel(id).await.map(|()| ActionOutcome::Done),
            HostCommand::Erase(id) => host.erase(id).await.map(|()| ActionOutcome::Done),
            HostCommand::OpenUrl(url) => host.open_url(&url).await.map(|()| ActionOutcome::Done),
            HostCommand::Start(request) => host.start(&request).await.map(ActionOutcome::Started),
            HostCommand::Open(id) => host.open(id).await.map(|()| ActionOutcome::Done),
            HostCommand::Show(id) => host.show(id).await.map(|()| ActionOutcome::Done),
            HostCommand::DeleteFile(id) => match host.remove_file(id).await {
                Ok(()) => host.erase(id).await.map(|()| ActionOutcome::Done),
                Err(err) => Err(err),
            },
        };

        result.map_err(|err| {
            let err = err.into_operation_error(operation);
            tracing::warn!(target: "dlshelf.engine", %err, "Host operation failed");
            err
        })
    }
}
