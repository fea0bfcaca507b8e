//! Cloneable front door to a running engine.

use tokio::sync::{mpsc, oneshot};

use dlshelf_core::{Action, DownloadId, ShelfError, ShelfResult};

use super::{EngineCommand, PanelRow};
use crate::actions::ActionOutcome;

/// Sends requests to the engine loop and awaits its replies.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub(super) const fn new(tx: mpsc::Sender<EngineCommand>) -> Self {
        Self { tx }
    }

    /// Perform an operator action on a download.
    ///
    /// Resolves once the host has acknowledged the command. The panel
    /// reflects the result only after the host's change event arrives.
    pub async fn perform(&self, id: DownloadId, action: Action) -> ShelfResult<ActionOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Perform { id, action, reply }).await?;
        rx.await.map_err(|_| ShelfError::EngineStopped)?
    }

    /// Current panel rows, newest first.
    pub async fn panel(&self) -> ShelfResult<Vec<PanelRow>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Panel { reply }).await?;
        rx.await.map_err(|_| ShelfError::EngineStopped)
    }

    /// Ask the loop to exit. Outstanding host calls are abandoned.
    pub async fn shutdown(&self) -> ShelfResult<()> {
        self.send(EngineCommand::Shutdown).await
    }

    async fn send(&self, command: EngineCommand) -> ShelfResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ShelfError::EngineStopped)
    }
}
