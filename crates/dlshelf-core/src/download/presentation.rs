//! Presentation state machine derived from a record's raw host fields.
//!
//! `state`, `paused`, `canResume`, `exists` and `danger` jointly select one
//! of seven variants, and each variant offers a fixed set of operator
//! actions. A pending danger classification shadows the underlying state
//! until the operator accepts the risk and the host confirms it.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{DownloadRecord, DownloadState};

/// Presentation variant of a download.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresentationState {
    /// Danger not yet accepted.
    DangerPending,
    /// In progress and not paused.
    ActiveRunning,
    /// In progress and paused.
    ActivePaused,
    /// Interrupted, host can resume.
    FailedResumable,
    /// Interrupted, host cannot resume.
    FailedTerminal,
    /// Complete, file still on disk.
    DonePresent,
    /// Complete, file deleted afterwards.
    DoneMissing,
}

impl PresentationState {
    /// Presentation variant for a record, danger gate included.
    #[must_use]
    pub fn of(record: &DownloadRecord) -> Self {
        if record.danger.is_pending() {
            Self::DangerPending
        } else {
            Self::underlying(record)
        }
    }

    /// Variant selected by the transfer fields alone, ignoring danger.
    ///
    /// Polling follows this: a download awaiting risk acceptance may still be
    /// receiving bytes.
    #[must_use]
    pub const fn underlying(record: &DownloadRecord) -> Self {
        match record.state {
            DownloadState::InProgress if record.paused => Self::ActivePaused,
            DownloadState::InProgress => Self::ActiveRunning,
            DownloadState::Interrupted if record.can_resume => Self::FailedResumable,
            DownloadState::Interrupted => Self::FailedTerminal,
            DownloadState::Complete if record.exists => Self::DonePresent,
            DownloadState::Complete => Self::DoneMissing,
        }
    }

    /// Actions the panel offers in this state.
    #[must_use]
    pub const fn available_actions(&self) -> &'static [Action] {
        match self {
            Self::DangerPending => &[Action::AcceptRisk],
            Self::ActiveRunning => &[Action::Pause, Action::Cancel],
            Self::ActivePaused => &[Action::Resume, Action::Cancel],
            Self::FailedResumable => &[Action::Resume, Action::Erase],
            Self::FailedTerminal | Self::DoneMissing => {
                &[Action::OpenSourceLink, Action::Retry, Action::Erase]
            }
            Self::DonePresent => &[Action::Open, Action::Reveal, Action::DeleteFile],
        }
    }

    /// Whether `action` is offered in this state.
    #[must_use]
    pub fn allows(&self, action: Action) -> bool {
        self.available_actions().contains(&action)
    }

    /// Whether no further host events are expected for this record.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::FailedTerminal | Self::DonePresent | Self::DoneMissing)
    }

    /// Stable name used in logs and error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DangerPending => "danger-pending",
            Self::ActiveRunning => "active-running",
            Self::ActivePaused => "active-paused",
            Self::FailedResumable => "failed-resumable",
            Self::FailedTerminal => "failed-terminal",
            Self::DonePresent => "done-present",
            Self::DoneMissing => "done-missing",
        }
    }
}

impl fmt::Display for PresentationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator action on a single download.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Confirm a dangerous download.
    AcceptRisk,
    /// Pause a running transfer.
    Pause,
    /// Resume a paused or resumable transfer.
    Resume,
    /// Cancel an in-progress transfer.
    Cancel,
    /// Remove the entry from the host's list.
    Erase,
    /// Open the source URL.
    OpenSourceLink,
    /// Start the same URL again.
    Retry,
    /// Open the downloaded file.
    Open,
    /// Show the file in its folder.
    Reveal,
    /// Delete the file from disk and drop the entry.
    DeleteFile,
}

impl Action {
    /// Stable name used in logs and error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AcceptRisk => "accept-risk",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Cancel => "cancel",
            Self::Erase => "erase",
            Self::OpenSourceLink => "open-source-link",
            Self::Retry => "retry",
            Self::Open => "open",
            Self::Reveal => "reveal",
            Self::DeleteFile => "delete-file",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DangerType;

    fn record(state: DownloadState) -> DownloadRecord {
        DownloadRecord::new(1, "https://example.com/f", "/tmp/f").with_state(state)
    }

    #[test]
    fn test_variant_selection() {
        assert_eq!(
            PresentationState::of(&record(DownloadState::InProgress)),
            PresentationState::ActiveRunning
        );
        assert_eq!(
            PresentationState::of(&record(DownloadState::InProgress).with_paused(true)),
            PresentationState::ActivePaused
        );

        let mut resumable = record(DownloadState::Interrupted);
        resumable.can_resume = true;
        assert_eq!(
            PresentationState::of(&resumable),
            PresentationState::FailedResumable
        );
        assert_eq!(
            PresentationState::of(&record(DownloadState::Interrupted)),
            PresentationState::FailedTerminal
        );

        assert_eq!(
            PresentationState::of(&record(DownloadState::Complete)),
            PresentationState::DonePresent
        );
        let mut missing = record(DownloadState::Complete);
        missing.exists = false;
        assert_eq!(PresentationState::of(&missing), PresentationState::DoneMissing);
    }

    #[test]
    fn test_danger_shadows_underlying_state() {
        let dangerous = record(DownloadState::InProgress).with_danger("file");
        assert_eq!(
            PresentationState::of(&dangerous),
            PresentationState::DangerPending
        );
        assert_eq!(
            PresentationState::underlying(&dangerous),
            PresentationState::ActiveRunning
        );

        let accepted = dangerous.with_danger(DangerType::Accepted);
        assert_eq!(
            PresentationState::of(&accepted),
            PresentationState::ActiveRunning
        );
    }

    #[test]
    fn test_available_actions() {
        assert!(PresentationState::DangerPending.allows(Action::AcceptRisk));
        assert!(!PresentationState::DangerPending.allows(Action::Pause));
        assert!(PresentationState::ActiveRunning.allows(Action::Pause));
        assert!(!PresentationState::ActiveRunning.allows(Action::Resume));
        assert!(PresentationState::FailedTerminal.allows(Action::Retry));
        assert!(PresentationState::DonePresent.allows(Action::DeleteFile));
        assert!(!PresentationState::DoneMissing.allows(Action::Open));
    }

    #[test]
    fn test_state_names_serialize_kebab_case() {
        let json = serde_json::to_string(&PresentationState::FailedResumable).unwrap();
        assert_eq!(json, "\"failed-resumable\"");
        let json = serde_json::to_string(&Action::OpenSourceLink).unwrap();
        assert_eq!(json, "\"open-source-link\"");
    }
}
