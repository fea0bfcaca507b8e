//! Fleet-wide progress fraction.

use crate::download::DownloadRecord;

/// Aggregate progress over all `in_progress` records.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AggregateProgress {
    /// Nothing is in progress.
    Idle,
    /// Something is in progress but no record reports a usable total.
    Indeterminate,
    /// Received over expected bytes, in `[0, 1]`.
    Fraction(f64),
}

impl AggregateProgress {
    /// Compute the aggregate over a registry snapshot.
    ///
    /// Records whose total is unknown (`-1` or `0`) are still "in progress"
    /// but contribute to neither sum, so a single unsized transfer does not
    /// drag the indicator back to zero.
    pub fn compute<'a>(records: impl IntoIterator<Item = &'a DownloadRecord>) -> Self {
        let mut any = false;
        let mut received: u128 = 0;
        let mut total: u128 = 0;

        for record in records.into_iter().filter(|r| r.is_in_progress()) {
            any = true;
            match record.fraction() {
                Ok(_) => {
                    let expected = record.known_total().unwrap_or_default();
                    received += u128::from(record.bytes_received.min(expected));
                    total += u128::from(expected);
                }
                Err(err) => {
                    tracing::trace!(target: "dlshelf.render", %err, "Record excluded from aggregate");
                }
            }
        }

        if !any {
            return Self::Idle;
        }
        if total == 0 {
            return Self::Indeterminate;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = (received as f64 / total as f64).clamp(0.0, 1.0);
        Self::Fraction(fraction)
    }

    /// The fraction, undefined (`None`) when idle or indeterminate.
    #[must_use]
    pub const fn fraction(&self) -> Option<f64> {
        match self {
            Self::Fraction(value) => Some(*value),
            Self::Idle | Self::Indeterminate => None,
        }
    }

    /// Whether the fraction is defined.
    ///
    /// Unsized transfers alone leave the indicator idle, so the completion
    /// edge is keyed on this rather than on `in_progress` membership.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Fraction(_))
    }

    /// Arc sweep rounded to whole degrees.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn sweep_degrees(&self) -> Option<u16> {
        self.fraction().map(|f| (f * 360.0).round() as u16)
    }
}
