//! Alert pattern data structures shared by firmware and host targets.
//!
//! The sequencer uses these definitions to drive synchronized LED and buzzer
//! output without embedding any MCU-specific knowledge. Patterns are described
//! by a handful of parameters and expanded into steps on demand, so arbitrarily
//! long alerts never need a step buffer.

use core::time::Duration;

pub mod profile;

pub use profile::{
    AlertProfile, AlertShape, IndicatorProfile, LevelProfile, StatusPingProfile, UrgentProfile,
};

/// Proximity/urgency tier carried by an alert.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertLevel {
    Far,
    Middle,
    Closest,
    Urgent,
    Idle,
}

impl AlertLevel {
    /// Lower-case label used in logs and transcripts.
    pub const fn label(self) -> &'static str {
        match self {
            AlertLevel::Far => "far",
            AlertLevel::Middle => "middle",
            AlertLevel::Closest => "closest",
            AlertLevel::Urgent => "urgent",
            AlertLevel::Idle => "idle",
        }
    }
}

/// Origin or destination side of a trip; selects command tags and gating.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Site {
    Origin,
    Destination,
}

/// Physical indicator outputs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedChannel {
    Green,
    Yellow,
    Red,
    Status,
}

impl LedChannel {
    /// Every channel, in self-test order.
    pub const ALL: [LedChannel; 4] = [
        LedChannel::Green,
        LedChannel::Yellow,
        LedChannel::Red,
        LedChannel::Status,
    ];

    /// Deterministic index for lookups into [`LedChannel::ALL`].
    pub const fn as_index(self) -> usize {
        match self {
            LedChannel::Green => 0,
            LedChannel::Yellow => 1,
            LedChannel::Red => 2,
            LedChannel::Status => 3,
        }
    }

    /// Attempts to construct a [`LedChannel`] from a raw index.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(LedChannel::Green),
            1 => Some(LedChannel::Yellow),
            2 => Some(LedChannel::Red),
            3 => Some(LedChannel::Status),
            _ => None,
        }
    }

    /// Returns `true` for the mutually exclusive alert channels.
    pub const fn is_primary(self) -> bool {
        !matches!(self, LedChannel::Status)
    }

    pub const fn label(self) -> &'static str {
        match self {
            LedChannel::Green => "green",
            LedChannel::Yellow => "yellow",
            LedChannel::Red => "red",
            LedChannel::Status => "status",
        }
    }

    const fn bit(self) -> u8 {
        1 << self.as_index()
    }
}

/// Set of LED channels lit together during a step.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSet(u8);

impl ChannelSet {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    /// A set holding exactly one channel.
    pub const fn only(channel: LedChannel) -> Self {
        Self(channel.bit())
    }

    /// Returns a copy with `channel` added.
    #[must_use]
    pub const fn with(self, channel: LedChannel) -> Self {
        Self(self.0 | channel.bit())
    }

    /// Returns a copy with `channel` removed.
    #[must_use]
    pub const fn without(self, channel: LedChannel) -> Self {
        Self(self.0 & !channel.bit())
    }

    pub const fn contains(self, channel: LedChannel) -> bool {
        self.0 & channel.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of primary (non-status) channels in the set.
    pub const fn primary_count(self) -> u32 {
        (self.0 & !LedChannel::Status.bit()).count_ones()
    }

    /// Iterates the member channels in [`LedChannel::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = LedChannel> {
        LedChannel::ALL
            .into_iter()
            .filter(move |channel| self.contains(*channel))
    }
}

/// One synchronized LED + buzzer state held for a fixed duration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseStep {
    pub lit: ChannelSet,
    pub tone_hz: Option<u32>,
    pub hold: Duration,
}

impl PulseStep {
    pub const fn on(lit: ChannelSet, tone_hz: Option<u32>, hold: Duration) -> Self {
        Self { lit, tone_hz, hold }
    }

    pub const fn off(hold: Duration) -> Self {
        Self {
            lit: ChannelSet::EMPTY,
            tone_hz: None,
            hold,
        }
    }

    /// On-step for `hold`, or a silent placeholder when `hold` is zero.
    pub const fn pulse(lit: ChannelSet, tone_hz: Option<u32>, hold: Duration) -> Self {
        if hold.is_zero() {
            Self::off(hold)
        } else {
            Self::on(lit, tone_hz, hold)
        }
    }

    /// Returns `true` when the step drives any output.
    pub const fn is_on(&self) -> bool {
        self.tone_hz.is_some() || !self.lit.is_empty()
    }
}

const SWEEP_STEPS: u32 = 4;

/// Timed on/off pattern driving synchronized LED and buzzer output.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulsePattern {
    /// Outputs held on for `duration`, then released.
    Hold {
        lit: ChannelSet,
        tone_hz: Option<u32>,
        duration: Duration,
    },
    /// Alternating on/off chunks filling exactly `total`; the final chunk is truncated.
    Flashing {
        lit: ChannelSet,
        tone_hz: u32,
        on: Duration,
        off: Duration,
        total: Duration,
    },
    /// `repetitions` cycles of `on` followed by `off`.
    Burst {
        lit: ChannelSet,
        tone_hz: u32,
        on: Duration,
        off: Duration,
        repetitions: u8,
    },
    /// Each channel lit alone for `dwell`, buzzer silent.
    Sweep { dwell: Duration },
}

impl PulsePattern {
    /// Returns the step at `index`, or `None` once the pattern is exhausted.
    pub fn step(&self, index: usize) -> Option<PulseStep> {
        match *self {
            PulsePattern::Hold {
                lit,
                tone_hz,
                duration,
            } => (index == 0 && !duration.is_zero()).then(|| PulseStep::on(lit, tone_hz, duration)),
            PulsePattern::Flashing {
                lit,
                tone_hz,
                on,
                off,
                total,
            } => flashing_step(lit, tone_hz, on, off, total, index),
            PulsePattern::Burst {
                lit,
                tone_hz,
                on,
                off,
                repetitions,
            } => {
                if (on + off).is_zero() || index >= usize::from(repetitions) * 2 {
                    None
                } else if index % 2 == 0 {
                    Some(PulseStep::pulse(lit, Some(tone_hz), on))
                } else {
                    Some(PulseStep::off(off))
                }
            }
            PulsePattern::Sweep { dwell } => {
                if dwell.is_zero() {
                    return None;
                }
                LedChannel::from_index(index)
                    .map(|channel| PulseStep::on(ChannelSet::only(channel), None, dwell))
            }
        }
    }

    /// Iterates the pattern's steps in order.
    pub fn steps(&self) -> Steps {
        Steps {
            pattern: *self,
            index: 0,
        }
    }

    /// Total wall-clock time covered by the pattern.
    pub fn total_duration(&self) -> Duration {
        match *self {
            PulsePattern::Hold { duration, .. } => duration,
            PulsePattern::Flashing { on, off, total, .. } => {
                if (on + off).is_zero() {
                    Duration::ZERO
                } else {
                    total
                }
            }
            PulsePattern::Burst {
                on,
                off,
                repetitions,
                ..
            } => (on + off) * u32::from(repetitions),
            PulsePattern::Sweep { dwell } => dwell * SWEEP_STEPS,
        }
    }

    /// Time spent with any output driven.
    pub fn on_duration(&self) -> Duration {
        self.steps()
            .filter(PulseStep::is_on)
            .map(|step| step.hold)
            .sum()
    }

    /// Returns `true` when the pattern produces no steps at all.
    pub fn is_empty(&self) -> bool {
        self.step(0).is_none()
    }
}

fn flashing_step(
    lit: ChannelSet,
    tone_hz: u32,
    on: Duration,
    off: Duration,
    total: Duration,
    index: usize,
) -> Option<PulseStep> {
    let period = on.checked_add(off)?;
    if period.is_zero() {
        return None;
    }

    let cycle = u32::try_from(index / 2).ok()?;
    let on_phase = index % 2 == 0;
    let mut start = period.checked_mul(cycle)?;
    if !on_phase {
        start = start.checked_add(on)?;
    }
    if start >= total {
        return None;
    }

    let remaining = total - start;
    if on_phase {
        Some(PulseStep::pulse(lit, Some(tone_hz), on.min(remaining)))
    } else {
        Some(PulseStep::off(off.min(remaining)))
    }
}

/// Iterator over the steps of a [`PulsePattern`].
#[derive(Clone, Debug)]
pub struct Steps {
    pattern: PulsePattern,
    index: usize,
}

impl Iterator for Steps {
    type Item = PulseStep;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.pattern.step(self.index)?;
        self.index += 1;
        Some(step)
    }
}
