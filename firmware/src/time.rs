use core::ops::Add;
use core::time::Duration as CoreDuration;

use alert_core::time::{AlertInstant, TimeSource};
use embassy_time::{Duration, Instant};

/// Embassy tick-based instant that the shared sequencer can schedule against.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl From<FirmwareInstant> for Instant {
    fn from(instant: FirmwareInstant) -> Self {
        instant.0
    }
}

impl Add<CoreDuration> for FirmwareInstant {
    type Output = Self;

    fn add(self, rhs: CoreDuration) -> Self {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Self(
            self.0
                .checked_add(Duration::from_micros(micros))
                .unwrap_or(Instant::MAX),
        )
    }
}

impl AlertInstant for FirmwareInstant {
    fn saturating_duration_since(&self, earlier: Self) -> CoreDuration {
        self.0
            .checked_duration_since(earlier.0)
            .map_or(CoreDuration::ZERO, |elapsed| {
                CoreDuration::from_micros(elapsed.as_micros())
            })
    }
}

/// Time source backed by the embassy time driver.
#[derive(Copy, Clone, Debug, Default)]
pub struct FirmwareClock;

impl TimeSource for FirmwareClock {
    type Instant = FirmwareInstant;

    fn now(&self) -> FirmwareInstant {
        FirmwareInstant::now()
    }
}
