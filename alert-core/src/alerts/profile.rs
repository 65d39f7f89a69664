//! Canonical level → channel → tone mapping and pattern timing.
//!
//! Every number the sequencer plays lives here so boards with different
//! wiring or buzzers only swap the profile, never the sequencing logic.

use core::time::Duration;

use super::{AlertLevel, ChannelSet, LedChannel, PulsePattern, Site};
use crate::time::millis;

/// Default on-chunk of a pulsed alert.
pub const PULSE_ON_CHUNK: Duration = Duration::from_millis(300);
/// Default off-chunk of a pulsed alert.
pub const PULSE_OFF_CHUNK: Duration = Duration::from_millis(200);
/// Far-level (`*_NEARBY`) alert length.
pub const FAR_TOTAL: Duration = Duration::from_millis(3_000);
/// Middle-level (`*_APPROACH`) alert length.
pub const MIDDLE_TOTAL: Duration = Duration::from_millis(5_000);
/// Closest-level (`*_STOP`) alert length.
pub const CLOSEST_TOTAL: Duration = Duration::from_millis(8_000);
/// Urgent strobe on-time per repetition.
pub const URGENT_ON: Duration = Duration::from_millis(150);
/// Urgent strobe off-time per repetition.
pub const URGENT_OFF: Duration = Duration::from_millis(100);
pub const URGENT_REPETITIONS: u8 = 6;
/// Status ping length; kept well under one second.
pub const STATUS_PING: Duration = Duration::from_millis(80);
/// Indicator-only LED pulse length.
pub const INDICATOR_HOLD: Duration = Duration::from_millis(1_000);
/// Per-channel dwell of the boot self-test sweep.
pub const SELF_TEST_DWELL: Duration = Duration::from_millis(150);

/// Timing shape of a proximity alert.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertShape {
    /// Tone and LEDs held together for the whole duration.
    Simple { duration: Duration },
    /// `total` split into `on`/`off` chunks.
    Pulsed {
        total: Duration,
        on: Duration,
        off: Duration,
    },
}

/// Output mapping for one proximity level.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LevelProfile {
    pub channel: LedChannel,
    pub tone_hz: u32,
    pub shape: AlertShape,
}

impl LevelProfile {
    pub const fn pulsed(channel: LedChannel, tone_hz: u32, total: Duration) -> Self {
        Self {
            channel,
            tone_hz,
            shape: AlertShape::Pulsed {
                total,
                on: PULSE_ON_CHUNK,
                off: PULSE_OFF_CHUNK,
            },
        }
    }

    pub const fn simple(channel: LedChannel, tone_hz: u32, duration: Duration) -> Self {
        Self {
            channel,
            tone_hz,
            shape: AlertShape::Simple { duration },
        }
    }

    /// Level channel plus the status channel.
    pub const fn lit(&self) -> ChannelSet {
        ChannelSet::only(self.channel).with(LedChannel::Status)
    }

    pub const fn pattern(&self) -> PulsePattern {
        match self.shape {
            AlertShape::Simple { duration } => PulsePattern::Hold {
                lit: self.lit(),
                tone_hz: Some(self.tone_hz),
                duration,
            },
            AlertShape::Pulsed { total, on, off } => PulsePattern::Flashing {
                lit: self.lit(),
                tone_hz: self.tone_hz,
                on,
                off,
                total,
            },
        }
    }
}

/// All-channel strobe cadence.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UrgentProfile {
    pub tone_hz: u32,
    pub on: Duration,
    pub off: Duration,
    pub repetitions: u8,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusPingProfile {
    pub tone_hz: u32,
    pub duration: Duration,
}

/// Indicator-only pulse settings for `LED_STATUS_*`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndicatorProfile {
    pub origin: LedChannel,
    pub destination: LedChannel,
    pub duration: Duration,
}

impl IndicatorProfile {
    pub const fn channel(&self, site: Site) -> LedChannel {
        match site {
            Site::Origin => self.origin,
            Site::Destination => self.destination,
        }
    }
}

/// Complete output profile consumed by the sequencer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlertProfile {
    pub far: LevelProfile,
    pub middle: LevelProfile,
    pub closest: LevelProfile,
    pub urgent: UrgentProfile,
    pub status_ping: StatusPingProfile,
    pub indicator: IndicatorProfile,
    /// Channels lit alongside a raw `BUZZ` tone.
    pub raw_buzz_lit: ChannelSet,
    pub self_test_dwell: Duration,
}

impl AlertProfile {
    /// Green/yellow/red mapping with rising pitch toward arrival.
    pub const fn canonical() -> Self {
        Self {
            far: LevelProfile::pulsed(LedChannel::Green, 1_500, FAR_TOTAL),
            middle: LevelProfile::pulsed(LedChannel::Yellow, 2_000, MIDDLE_TOTAL),
            closest: LevelProfile::pulsed(LedChannel::Red, 2_500, CLOSEST_TOTAL),
            urgent: UrgentProfile {
                tone_hz: 3_000,
                on: URGENT_ON,
                off: URGENT_OFF,
                repetitions: URGENT_REPETITIONS,
            },
            status_ping: StatusPingProfile {
                tone_hz: 1_200,
                duration: STATUS_PING,
            },
            indicator: IndicatorProfile {
                origin: LedChannel::Green,
                destination: LedChannel::Yellow,
                duration: INDICATOR_HOLD,
            },
            raw_buzz_lit: ChannelSet::only(LedChannel::Status),
            self_test_dwell: SELF_TEST_DWELL,
        }
    }

    /// Profile entry for a proximity level; `Urgent` and `Idle` have none.
    pub const fn level(&self, level: AlertLevel) -> Option<&LevelProfile> {
        match level {
            AlertLevel::Far => Some(&self.far),
            AlertLevel::Middle => Some(&self.middle),
            AlertLevel::Closest => Some(&self.closest),
            AlertLevel::Urgent | AlertLevel::Idle => None,
        }
    }

    /// Pattern played for `level`, or `None` for `Idle`.
    pub const fn level_pattern(&self, level: AlertLevel) -> Option<PulsePattern> {
        match level {
            AlertLevel::Urgent => Some(self.urgent_pattern()),
            AlertLevel::Idle => None,
            AlertLevel::Far | AlertLevel::Middle | AlertLevel::Closest => match self.level(level) {
                Some(profile) => Some(profile.pattern()),
                None => None,
            },
        }
    }

    pub const fn urgent_pattern(&self) -> PulsePattern {
        PulsePattern::Burst {
            lit: ChannelSet::ALL,
            tone_hz: self.urgent.tone_hz,
            on: self.urgent.on,
            off: self.urgent.off,
            repetitions: self.urgent.repetitions,
        }
    }

    pub const fn status_ping_pattern(&self) -> PulsePattern {
        PulsePattern::Hold {
            lit: ChannelSet::only(LedChannel::Status),
            tone_hz: Some(self.status_ping.tone_hz),
            duration: self.status_ping.duration,
        }
    }

    pub const fn indicator_pattern(&self, site: Site) -> PulsePattern {
        PulsePattern::Hold {
            lit: ChannelSet::only(self.indicator.channel(site)),
            tone_hz: None,
            duration: self.indicator.duration,
        }
    }

    pub const fn raw_buzz_pattern(&self, frequency_hz: u32, duration_ms: u32) -> PulsePattern {
        PulsePattern::Hold {
            lit: self.raw_buzz_lit,
            tone_hz: Some(frequency_hz),
            duration: millis(duration_ms),
        }
    }

    pub const fn self_test_pattern(&self) -> PulsePattern {
        PulsePattern::Sweep {
            dwell: self.self_test_dwell,
        }
    }
}

impl Default for AlertProfile {
    fn default() -> Self {
        Self::canonical()
    }
}
