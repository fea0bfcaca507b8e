//! Partial change notifications and the field-sparse merge.
//!
//! The host reports changes as a delta that names only the fields that
//! changed, each wrapped as `{ current, previous }`. Absence means
//! "unchanged", never "cleared". The one exception is `error`, where a
//! present wrapper without `current` clears the reason (the host sends that
//! shape when an interrupted download is resumed).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{DangerType, DownloadId, DownloadRecord, DownloadState};

/// A changed field as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange<T> {
    /// Value after the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<T>,
    /// Value before the change, when the host provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<T>,
}

impl<T> FieldChange<T> {
    /// A change that only carries the new value.
    pub const fn to(current: T) -> Self {
        Self {
            current: Some(current),
            previous: None,
        }
    }

    /// A change carrying both sides.
    pub const fn between(previous: T, current: T) -> Self {
        Self {
            current: Some(current),
            previous: Some(previous),
        }
    }
}

/// Partial update for one download.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadDelta {
    /// Download the delta applies to.
    pub id: DownloadId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<FieldChange<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_received: Option<FieldChange<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<FieldChange<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<FieldChange<DownloadState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<FieldChange<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_resume: Option<FieldChange<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<FieldChange<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danger: Option<FieldChange<DangerType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<FieldChange<DateTime<Utc>>>,
}

/// Overwrite `slot` when the change carries a current value.
fn merge_field<T: Clone>(slot: &mut T, change: Option<&FieldChange<T>>) {
    if let Some(value) = change.and_then(|c| c.current.as_ref()) {
        slot.clone_from(value);
    }
}

/// Diff helper used by `DownloadDelta::between`.
fn diff_field<T: Clone + PartialEq>(old: &T, new: &T) -> Option<FieldChange<T>> {
    (old != new).then(|| FieldChange::between(old.clone(), new.clone()))
}

impl DownloadDelta {
    /// Create an empty delta for `id`.
    pub fn new(id: impl Into<DownloadId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Compute the delta that turns `old` into `new`.
    ///
    /// Used by host adapters that only hold full records.
    #[must_use]
    pub fn between(old: &DownloadRecord, new: &DownloadRecord) -> Self {
        let error = if old.error == new.error {
            None
        } else {
            Some(FieldChange {
                current: new.error.clone(),
                previous: old.error.clone(),
            })
        };
        let start_time = match (old.start_time, new.start_time) {
            (old_time, Some(new_time)) if old_time != Some(new_time) => Some(FieldChange {
                current: Some(new_time),
                previous: old_time,
            }),
            _ => None,
        };

        Self {
            id: new.id,
            filename: diff_field(&old.filename, &new.filename),
            url: diff_field(&old.url, &new.url),
            file_size: diff_field(&old.file_size, &new.file_size),
            bytes_received: diff_field(&old.bytes_received, &new.bytes_received),
            total_bytes: diff_field(&old.total_bytes, &new.total_bytes),
            state: diff_field(&old.state, &new.state),
            paused: diff_field(&old.paused, &new.paused),
            can_resume: diff_field(&old.can_resume, &new.can_resume),
            exists: diff_field(&old.exists, &new.exists),
            danger: diff_field(&old.danger, &new.danger),
            error,
            start_time,
        }
    }

    /// Set the state change.
    #[must_use]
    pub const fn with_state(mut self, state: DownloadState) -> Self {
        self.state = Some(FieldChange::to(state));
        self
    }

    /// Set the paused change.
    #[must_use]
    pub const fn with_paused(mut self, paused: bool) -> Self {
        self.paused = Some(FieldChange::to(paused));
        self
    }

    /// Set the filename change.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(FieldChange::to(filename.into()));
        self
    }

    /// Produce a new record with only the present fields overwritten.
    #[must_use]
    pub fn apply_to(&self, record: &DownloadRecord) -> DownloadRecord {
        let mut merged = record.clone();
        merge_field(&mut merged.filename, self.filename.as_ref());
        merge_field(&mut merged.url, self.url.as_ref());
        merge_field(&mut merged.file_size, self.file_size.as_ref());
        merge_field(&mut merged.bytes_received, self.bytes_received.as_ref());
        merge_field(&mut merged.total_bytes, self.total_bytes.as_ref());
        merge_field(&mut merged.state, self.state.as_ref());
        merge_field(&mut merged.paused, self.paused.as_ref());
        merge_field(&mut merged.can_resume, self.can_resume.as_ref());
        merge_field(&mut merged.exists, self.exists.as_ref());
        merge_field(&mut merged.danger, self.danger.as_ref());
        if let Some(change) = &self.error {
            merged.error.clone_from(&change.current);
        }
        if let Some(time) = self.start_time.as_ref().and_then(|c| c.current) {
            merged.start_time = Some(time);
        }
        merged
    }

    /// Names of the fields this delta touches, in wire form.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let present = [
            ("filename", self.filename.is_some()),
            ("url", self.url.is_some()),
            ("fileSize", self.file_size.is_some()),
            ("bytesReceived", self.bytes_received.is_some()),
            ("totalBytes", self.total_bytes.is_some()),
            ("state", self.state.is_some()),
            ("paused", self.paused.is_some()),
            ("canResume", self.can_resume.is_some()),
            ("exists", self.exists.is_some()),
            ("danger", self.danger.is_some()),
            ("error", self.error.is_some()),
            ("startTime", self.start_time.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(name, is_set)| is_set.then_some(name))
            .collect()
    }

    /// Whether the delta carries no field at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }
}
