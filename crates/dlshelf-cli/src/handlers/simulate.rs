//! Simulate command handler.
//!
//! Runs the engine against the in-memory host and walks through a fixed
//! scenario: two transfers (one with an unknown size), a pause and resume,
//! completion, then actions on older entries.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use dlshelf_core::{
    Action, DownloadId, DownloadRecord, DownloadState, HostDownloadService, ShelfSettings,
    StartRequest,
};
use dlshelf_engine::{ActionOutcome, EngineHandle, InMemoryHost, PanelRow, ShelfEngine};

use crate::error::CliError;
use crate::presentation::{ChangeLog, ConsoleSurface, PanelRowView, print_panel};

/// Default delay between scripted steps.
pub const DEFAULT_STEP_MS: u64 = 200;

const EVENT_CAPACITY: usize = 256;
const MIB: u64 = 1024 * 1024;
const TICKS: u32 = 8;

const REPORT_ID: u64 = 1;
const NIGHTLY_ID: u64 = 2;
const ISO_URL: &str = "https://mirror.example.com/releases/distro-24.04.iso";
const STREAM_URL: &str = "https://media.example.com/live/feed.ts";

/// Run the scripted scenario.
pub async fn execute(settings: ShelfSettings, step_ms: u64, json: bool) -> Result<()> {
    let step = Duration::from_millis(step_ms.max(1));

    let (host, events) = InMemoryHost::new(EVENT_CAPACITY);
    seed_history(&host).await;
    let iso_size = i64::try_from(u64::from(TICKS) * 6 * MIB).unwrap_or(i64::MAX);
    host.set_size(ISO_URL, iso_size).await;
    let host = Arc::new(host);
    let surface = Arc::new(ConsoleSurface::new());

    let service: Arc<dyn HostDownloadService> = host.clone();
    let (mut engine, handle) =
        ShelfEngine::new(service, events, settings).map_err(CliError::from)?;
    engine.subscribe(Box::new(ChangeLog::new()));
    let task = engine.with_surface(surface.clone()).spawn();

    tokio::time::sleep(step).await;
    println!("== Initial panel");
    print_panel(&panel(&handle).await?);

    let iso = host.start(&StartRequest::new(ISO_URL)).await.map_err(CliError::from)?;
    let stream = host
        .start(&StartRequest::new(STREAM_URL))
        .await
        .map_err(CliError::from)?;

    for tick in 1..=TICKS {
        tokio::time::sleep(step).await;
        advance(&host, iso, 6 * MIB).await;
        advance(&host, stream, MIB).await;

        match tick {
            3 => {
                perform(&handle, stream, Action::Pause).await?;
            }
            5 => {
                perform(&handle, stream, Action::Resume).await?;
            }
            _ => {}
        }
        if tick % 2 == 0 {
            println!("== Panel after step {tick}");
            print_panel(&panel(&handle).await?);
        }
    }

    host.finish(iso).await.map_err(CliError::from)?;
    host.finish(stream).await.map_err(CliError::from)?;
    tokio::time::sleep(step).await;
    println!("== Transfers finished");
    print_panel(&panel(&handle).await?);

    perform(&handle, DownloadId::new(REPORT_ID), Action::Open).await?;
    perform(&handle, DownloadId::new(REPORT_ID), Action::DeleteFile).await?;
    if let ActionOutcome::Started(retried) =
        perform(&handle, DownloadId::new(NIGHTLY_ID), Action::Retry).await?
    {
        tokio::time::sleep(step).await;
        advance(&host, retried, 3 * MIB).await;
        tokio::time::sleep(step).await;
        host.finish(retried).await.map_err(CliError::from)?;
    }
    tokio::time::sleep(step).await;

    let rows = panel(&handle).await?;
    println!("== Final panel");
    print_panel(&rows);
    println!(
        "{} icon redraws, {} completion badges, launched: {}",
        surface.redraws(),
        surface.badges_raised(),
        host.launches().await.join(", ")
    );

    if json {
        let views: Vec<PanelRowView> = rows.iter().map(PanelRowView::from).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&views).map_err(CliError::from)?
        );
    }

    handle.shutdown().await.map_err(CliError::from)?;
    task.await
        .map_err(|err| CliError::Engine(format!("engine task failed: {err}")))?;
    Ok(())
}

/// Entries that predate the engine: a finished report and a failed nightly.
async fn seed_history(host: &InMemoryHost) {
    let report_size = 2 * MIB + 300 * 1024;
    let mut report = DownloadRecord::new(
        REPORT_ID,
        "https://example.com/archive/report.pdf",
        "/downloads/report.pdf",
    )
    .with_bytes(report_size, i64::try_from(report_size).unwrap_or(i64::MAX))
    .with_state(DownloadState::Complete);
    report.file_size = report_size;
    host.seed(report).await;

    let mut nightly = DownloadRecord::new(
        NIGHTLY_ID,
        "https://builds.example.com/nightly.tar.gz",
        "/downloads/nightly.tar.gz",
    )
    .with_bytes(MIB, 12 * 1024 * 1024)
    .with_state(DownloadState::Interrupted);
    nightly.error = Some("NETWORK_FAILED".to_string());
    host.seed(nightly).await;
}

async fn advance(host: &InMemoryHost, id: DownloadId, bytes: u64) {
    if let Err(err) = host.advance(id, bytes).await {
        debug!(target: "dlshelf.cli", %id, error = %err, "Skipped transfer step");
    }
}

async fn perform(handle: &EngineHandle, id: DownloadId, action: Action) -> Result<ActionOutcome> {
    let outcome = handle.perform(id, action).await.map_err(CliError::from)?;
    match outcome {
        ActionOutcome::Done => println!("[action] {action} #{id}"),
        ActionOutcome::Started(new_id) => println!("[action] {action} #{id} started #{new_id}"),
    }
    Ok(outcome)
}

async fn panel(handle: &EngineHandle) -> Result<Vec<PanelRow>, CliError> {
    Ok(handle.panel().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlshelf_core::PresentationState;

    #[tokio::test(start_paused = true)]
    async fn test_scenario_runs_to_completion() {
        tokio_test::assert_ok!(execute(ShelfSettings::with_defaults(), 50, true).await);
    }

    #[tokio::test]
    async fn test_seeded_history_is_terminal() {
        let (host, _events) = InMemoryHost::new(4);
        seed_history(&host).await;

        let report = host.record(DownloadId::new(REPORT_ID)).await.unwrap();
        assert_eq!(PresentationState::of(&report), PresentationState::DonePresent);
        let nightly = host.record(DownloadId::new(NIGHTLY_ID)).await.unwrap();
        assert_eq!(PresentationState::of(&nightly), PresentationState::FailedTerminal);
    }
}
