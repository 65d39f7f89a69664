//! Shared test infrastructure for alert-core integration tests.

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use alert_core::actuator::{Actuator, ToneMode};
use alert_core::alerts::LedChannel;
use alert_core::config::ControllerConfig;
use alert_core::controller::Controller;
use alert_core::sequencer::{BlockingRunner, IncrementalRunner};
use alert_core::telemetry::{ActuatorEvent, ActuatorTrace, TracingActuator};
use alert_core::time::TimeSource;
use embedded_hal::delay::DelayNs;

pub const TRACE_CAPACITY: usize = 1024;

// ============================================================================
// Virtual time
// ============================================================================

/// Shared virtual clock; clones observe the same time.
#[derive(Clone, Debug, Default)]
pub struct VirtualClock(Rc<Cell<Duration>>);

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }

    pub fn advance_ms(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    pub fn elapsed(&self) -> Duration {
        self.0.get()
    }
}

impl TimeSource for VirtualClock {
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// Delay that advances the virtual clock instead of sleeping.
#[derive(Clone, Debug)]
pub struct ClockDelay(pub VirtualClock);

impl DelayNs for ClockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.advance_ms(u64::from(ms));
    }
}

// ============================================================================
// Simulated actuator
// ============================================================================

/// Actuator backend whose blocking tone primitive consumes virtual time.
pub struct SimActuator {
    mode: ToneMode,
    clock: VirtualClock,
}

impl SimActuator {
    pub fn new(mode: ToneMode, clock: VirtualClock) -> Self {
        Self { mode, clock }
    }
}

impl Actuator for SimActuator {
    fn tone_mode(&self) -> ToneMode {
        self.mode
    }

    fn set_tone(&mut self, _: u32, duration_ms: u32) {
        if self.mode == ToneMode::Blocking {
            self.clock.advance_ms(u64::from(duration_ms));
        }
    }

    fn stop_tone(&mut self) {}

    fn set_led(&mut self, _: LedChannel, _: bool) {}
}

pub type Traced = TracingActuator<SimActuator, VirtualClock, TRACE_CAPACITY>;
pub type Trace = ActuatorTrace<Duration, TRACE_CAPACITY>;

pub fn traced(mode: ToneMode, clock: &VirtualClock) -> Traced {
    TracingActuator::new(SimActuator::new(mode, clock.clone()), clock.clone())
}

pub type BlockingController = Controller<BlockingRunner<Traced, ClockDelay>>;
pub type IncrementalController = Controller<IncrementalRunner<Traced, VirtualClock>>;

pub fn blocking_controller(
    config: &ControllerConfig,
    mode: ToneMode,
) -> (BlockingController, VirtualClock) {
    let clock = VirtualClock::new();
    let runner = BlockingRunner::new(
        traced(mode, &clock),
        config.profile,
        ClockDelay(clock.clone()),
    );
    (Controller::new(runner, config), clock)
}

pub fn incremental_controller(config: &ControllerConfig) -> (IncrementalController, VirtualClock) {
    let clock = VirtualClock::new();
    let runner = IncrementalRunner::new(
        traced(ToneMode::NonBlocking, &clock),
        config.profile,
        clock.clone(),
    );
    (Controller::new(runner, config), clock)
}

/// Polls every millisecond until the runner goes idle or `limit` elapses.
pub fn run_until_idle(controller: &mut IncrementalController, clock: &VirtualClock, limit: Duration) {
    let deadline = clock.elapsed() + limit;
    while controller.poll().is_active() && clock.elapsed() < deadline {
        clock.advance_ms(1);
    }
}

// ============================================================================
// Trace analysis
// ============================================================================

/// Output whose on-intervals are extracted from a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    Tone,
    Led(LedChannel),
}

/// `(start, end)` pairs during which `output` was driven.
pub fn on_intervals(trace: &Trace, output: Output) -> Vec<(Duration, Duration)> {
    let mut intervals = Vec::new();
    let mut since = None;
    for record in trace.oldest_first() {
        let switched = match (output, record.event) {
            (Output::Tone, ActuatorEvent::ToneOn { .. }) => Some(true),
            (Output::Tone, ActuatorEvent::ToneOff) => Some(false),
            (Output::Led(wanted), ActuatorEvent::Led { channel, on }) if wanted == channel => {
                Some(on)
            }
            _ => None,
        };
        match (switched, since) {
            (Some(true), None) => since = Some(record.timestamp),
            (Some(false), Some(start)) => {
                if record.timestamp > start {
                    intervals.push((start, record.timestamp));
                }
                since = None;
            }
            _ => {}
        }
    }
    intervals
}

pub fn total_on(intervals: &[(Duration, Duration)]) -> Duration {
    intervals.iter().map(|(start, end)| *end - *start).sum()
}

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}
