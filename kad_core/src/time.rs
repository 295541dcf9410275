//! Functions to work with time

use std::time::{Duration, Instant};

/// Returns an `Instant` corresponding to "now".
///
/// Reads the tokio clock so that paused time in tests is respected. Outside
/// of a paused runtime it's the same as `Instant::now()`.
pub fn clock_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Returns the amount of time elapsed since `instant` was created.
pub fn clock_elapsed(instant: Instant) -> Duration {
    clock_now().saturating_duration_since(instant)
}
