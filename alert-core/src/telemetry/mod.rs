//! Actuator trace shared by firmware diagnostics, the emulator and tests.
//!
//! [`TracingActuator`] wraps any backend and timestamps every call into a
//! fixed-size ring so on/off timing can be inspected after the fact without
//! allocating.

use core::fmt;

use heapless::HistoryBuf;

use crate::actuator::{Actuator, ToneMode};
use crate::alerts::{ChannelSet, LedChannel};
use crate::time::TimeSource;

/// Total number of actuator events retained in memory.
pub const ACTUATOR_TRACE_CAPACITY: usize = 256;

/// Identifier assigned to each recorded event.
pub type EventId = u32;

/// Single actuator call as observed by the trace.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorEvent {
    ToneOn { frequency_hz: u32, duration_ms: u32 },
    ToneOff,
    Led { channel: LedChannel, on: bool },
}

impl fmt::Display for ActuatorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorEvent::ToneOn {
                frequency_hz,
                duration_ms,
            } => write!(f, "tone {frequency_hz} Hz for {duration_ms} ms"),
            ActuatorEvent::ToneOff => f.write_str("tone off"),
            ActuatorEvent::Led { channel, on } => {
                write!(f, "led {} {}", channel.label(), if *on { "on" } else { "off" })
            }
        }
    }
}

/// Trace record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActuatorRecord<TInstant> {
    pub id: EventId,
    pub timestamp: TInstant,
    pub event: ActuatorEvent,
}

/// Fixed-capacity history of actuator events plus the resulting output state.
pub struct ActuatorTrace<TInstant, const CAPACITY: usize = ACTUATOR_TRACE_CAPACITY> {
    ring: HistoryBuf<ActuatorRecord<TInstant>, CAPACITY>,
    next_event_id: EventId,
    lit: ChannelSet,
    tone_active: bool,
}

impl<TInstant, const CAPACITY: usize> ActuatorTrace<TInstant, CAPACITY> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
            lit: ChannelSet::EMPTY,
            tone_active: false,
        }
    }

    /// Records an event and updates the tracked output state.
    pub fn record(&mut self, event: ActuatorEvent, timestamp: TInstant) -> EventId {
        match event {
            ActuatorEvent::ToneOn { .. } => self.tone_active = true,
            ActuatorEvent::ToneOff => self.tone_active = false,
            ActuatorEvent::Led { channel, on: true } => self.lit = self.lit.with(channel),
            ActuatorEvent::Led { channel, on: false } => self.lit = self.lit.without(channel),
        }

        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);
        self.ring.write(ActuatorRecord {
            id,
            timestamp,
            event,
        });
        id
    }

    /// Returns an iterator over the retained events in chronological order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &ActuatorRecord<TInstant>> {
        self.ring.oldest_ordered()
    }

    pub fn latest(&self) -> Option<&ActuatorRecord<TInstant>> {
        self.ring.recent()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Total events recorded, including those evicted from the ring.
    pub fn total_recorded(&self) -> EventId {
        self.next_event_id
    }

    /// Channels currently driven on.
    pub fn lit(&self) -> ChannelSet {
        self.lit
    }

    pub fn tone_active(&self) -> bool {
        self.tone_active
    }

    /// Returns `true` when the buzzer is silent and every channel is off.
    pub fn outputs_off(&self) -> bool {
        !self.tone_active && self.lit.is_empty()
    }

    /// Drops retained events; the tracked output state is kept.
    pub fn clear(&mut self) {
        self.ring.clear();
    }
}

impl<TInstant, const CAPACITY: usize> Default for ActuatorTrace<TInstant, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

/// Decorator that timestamps every call before forwarding it to `inner`.
pub struct TracingActuator<A, S, const CAPACITY: usize = ACTUATOR_TRACE_CAPACITY>
where
    S: TimeSource,
{
    inner: A,
    clock: S,
    trace: ActuatorTrace<S::Instant, CAPACITY>,
}

impl<A, S, const CAPACITY: usize> TracingActuator<A, S, CAPACITY>
where
    S: TimeSource,
{
    pub const fn new(inner: A, clock: S) -> Self {
        Self {
            inner,
            clock,
            trace: ActuatorTrace::new(),
        }
    }

    pub fn trace(&self) -> &ActuatorTrace<S::Instant, CAPACITY> {
        &self.trace
    }

    pub fn trace_mut(&mut self) -> &mut ActuatorTrace<S::Instant, CAPACITY> {
        &mut self.trace
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }

    fn record(&mut self, event: ActuatorEvent) {
        let now = self.clock.now();
        self.trace.record(event, now);
    }
}

impl<A, S, const CAPACITY: usize> Actuator for TracingActuator<A, S, CAPACITY>
where
    A: Actuator,
    S: TimeSource,
{
    fn tone_mode(&self) -> ToneMode {
        self.inner.tone_mode()
    }

    fn set_tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        self.record(ActuatorEvent::ToneOn {
            frequency_hz,
            duration_ms,
        });
        self.inner.set_tone(frequency_hz, duration_ms);
        // Blocking backends have already silenced the tone on return.
        if self.inner.tone_mode() == ToneMode::Blocking {
            self.record(ActuatorEvent::ToneOff);
        }
    }

    fn stop_tone(&mut self) {
        self.record(ActuatorEvent::ToneOff);
        self.inner.stop_tone();
    }

    fn set_led(&mut self, channel: LedChannel, on: bool) {
        self.record(ActuatorEvent::Led { channel, on });
        self.inner.set_led(channel, on);
    }
}
