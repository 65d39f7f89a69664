//! Time abstractions shared by the sequencer, telemetry, and front-ends.
//!
//! The sequencer never reads a clock on its own. Callers hand it instants
//! produced by whatever monotonic source the platform has (embassy on the
//! MCU, `std::time::Instant` on the host, a virtual clock in tests).

use core::ops::Add;
use core::time::Duration;

/// Monotonic timestamp used to place pattern step boundaries.
pub trait AlertInstant: Copy + Ord + Add<Duration, Output = Self> {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// `Duration` doubles as an instant measured from an arbitrary epoch (boot, session start).
impl AlertInstant for Duration {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        self.saturating_sub(earlier)
    }
}

/// Source of monotonic instants.
pub trait TimeSource {
    type Instant: AlertInstant;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;
}

impl<T: TimeSource> TimeSource for &T {
    type Instant = T::Instant;

    fn now(&self) -> Self::Instant {
        (**self).now()
    }
}

/// Converts a millisecond count from the wire into a [`Duration`].
#[must_use]
pub const fn millis(value: u32) -> Duration {
    Duration::from_millis(value as u64)
}

/// Converts a [`Duration`] back into whole milliseconds, saturating at `u32::MAX`.
#[must_use]
pub fn as_millis_u32(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
