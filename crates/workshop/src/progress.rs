//! Progress reporting for a submission.

use crate::service::{UpdateProgress, UpdateStatus};
use crate::types::Phase;

/// Receives progress of a submission.
///
/// Fractions are in `[0, 1]`; `0.0` means indeterminate or starting.
pub trait ProgressSink {
    fn report(&self, fraction: f32);

    /// Called when the submission enters a new phase.
    fn phase(&self, _phase: Phase) {}
}

impl<F> ProgressSink for F
where
    F: Fn(f32),
{
    fn report(&self, fraction: f32) {
        self(fraction)
    }
}

/// Converts SDK byte counters into a fraction.
pub fn normalize(progress: &UpdateProgress) -> f32 {
    if progress.status == UpdateStatus::Invalid || progress.bytes_total == 0 {
        return 0.0;
    }
    let fraction = progress.bytes_done as f64 / progress.bytes_total as f64;
    fraction.clamp(0.0, 1.0) as f32
}
