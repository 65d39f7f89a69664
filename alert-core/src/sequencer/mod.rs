//! Alert sequencer: owns buzzer/LED state and the single in-flight alert.
//!
//! Every start operation silences all outputs before the new pattern's first
//! actuator call, so at most one alert is ever visible. The status ping is the
//! exception: over a running alert it only borrows the buzzer and Status LED. Patterns either run to
//! completion on the caller's timeline ([`AlertSequencer::run_blocking`]) or are
//! advanced from [`AlertSequencer::poll`] at cumulative step boundaries.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::actuator::{Actuator, play_tone};
use crate::alerts::{
    AlertLevel, AlertProfile, ChannelSet, LedChannel, PulsePattern, PulseStep, Site,
};
use crate::time::{AlertInstant, as_millis_u32};

pub mod runner;

pub use runner::{AlertRunner, BlockingRunner, IncrementalRunner};

/// Operation requested from the sequencer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertRequest {
    /// Proximity alert (or the urgent strobe for [`AlertLevel::Urgent`]).
    Level(AlertLevel),
    StatusPing,
    /// Indicator-only LED pulse for a site.
    Indicator(Site),
    RawBuzz { frequency_hz: u32, duration_ms: u32 },
    /// Boot-time sweep across every channel.
    SelfTest,
}

impl AlertRequest {
    /// Level carried by the request, if any.
    pub const fn level(self) -> Option<AlertLevel> {
        match self {
            AlertRequest::Level(level) => Some(level),
            _ => None,
        }
    }
}

/// Observable sequencer phase.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerState {
    Idle,
    RunningSimple,
    RunningPulsed,
    RunningUrgent,
}

impl SequencerState {
    /// Phase used while `pattern` is in flight.
    pub const fn for_pattern(pattern: &PulsePattern) -> Self {
        match pattern {
            PulsePattern::Hold { .. } => SequencerState::RunningSimple,
            PulsePattern::Flashing { .. } | PulsePattern::Sweep { .. } => {
                SequencerState::RunningPulsed
            }
            PulsePattern::Burst { .. } => SequencerState::RunningUrgent,
        }
    }

    pub const fn is_active(self) -> bool {
        !matches!(self, SequencerState::Idle)
    }
}

/// Mutable bookkeeping for the alert currently in flight.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AlertSession<I> {
    pub request: AlertRequest,
    pub pattern: PulsePattern,
    pub started_at: I,
    pub step_index: usize,
    step: PulseStep,
    step_deadline: I,
}

impl<I: AlertInstant> AlertSession<I> {
    /// Alert level of the in-flight request, if it has one.
    pub fn level(&self) -> Option<AlertLevel> {
        self.request.level()
    }

    /// Time since the pattern started.
    pub fn elapsed(&self, now: I) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Step currently driving the outputs.
    pub fn current_step(&self) -> PulseStep {
        self.step
    }

    /// Instant at which the current step ends.
    pub fn step_deadline(&self) -> I {
        self.step_deadline
    }
}

/// Status ping sounding on top of a running alert.
///
/// While it lasts the ping owns the buzzer and the Status channel; the alert
/// keeps advancing on its own timeline underneath.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct StatusOverlay<I> {
    until: I,
}

/// Single-alert state machine written against [`Actuator`].
pub struct AlertSequencer<A, I = Duration> {
    actuator: A,
    profile: AlertProfile,
    session: Option<AlertSession<I>>,
    overlay: Option<StatusOverlay<I>>,
}

impl<A, I> AlertSequencer<A, I> {
    /// Creates an idle sequencer. Outputs are not touched until [`Self::idle`] is called.
    pub const fn new(actuator: A, profile: AlertProfile) -> Self {
        Self {
            actuator,
            profile,
            session: None,
            overlay: None,
        }
    }

    pub fn profile(&self) -> &AlertProfile {
        &self.profile
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    pub fn into_inner(self) -> A {
        self.actuator
    }

    /// Session for the alert in flight, if any.
    pub fn session(&self) -> Option<&AlertSession<I>> {
        self.session.as_ref()
    }

    pub fn state(&self) -> SequencerState {
        match (&self.session, &self.overlay) {
            (Some(session), _) => SequencerState::for_pattern(&session.pattern),
            (None, Some(_)) => SequencerState::RunningSimple,
            (None, None) => SequencerState::Idle,
        }
    }

    /// Returns `true` while a status ping sounds over a running alert.
    pub fn ping_active(&self) -> bool {
        self.overlay.is_some()
    }

    /// Resolves a request into the pattern the profile maps it to.
    pub fn pattern_for(&self, request: AlertRequest) -> Option<PulsePattern> {
        let profile = &self.profile;
        match request {
            AlertRequest::Level(level) => profile.level_pattern(level),
            AlertRequest::StatusPing => Some(profile.status_ping_pattern()),
            AlertRequest::Indicator(site) => Some(profile.indicator_pattern(site)),
            AlertRequest::RawBuzz {
                frequency_hz,
                duration_ms,
            } => Some(profile.raw_buzz_pattern(frequency_hz, duration_ms)),
            AlertRequest::SelfTest => Some(profile.self_test_pattern()),
        }
    }
}

impl<A, I> AlertSequencer<A, I>
where
    A: Actuator,
{
    /// Silences the buzzer, turns every channel off and clears the session.
    ///
    /// Callable from any state; always issues the same fixed set of actuator calls.
    pub fn idle(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("alert {:?} stopped", session.request);
        }
        self.overlay = None;
        self.actuator.all_off();
    }

    /// Plays the status ping on the caller's timeline without touching the
    /// primary channels.
    ///
    /// Nothing is in flight between blocking dispatches, so the ping simply
    /// follows the previous command's output.
    pub fn ping_blocking<D>(&mut self, delay: &mut D)
    where
        D: DelayNs + ?Sized,
    {
        let ping = self.profile.status_ping;
        let hold_ms = as_millis_u32(ping.duration);
        if hold_ms == 0 {
            return;
        }

        debug!("status ping");
        self.actuator.set_led(LedChannel::Status, true);
        play_tone(&mut self.actuator, delay, ping.tone_hz, hold_ms);
        self.actuator.set_led(LedChannel::Status, false);
    }

    /// Preempts whatever is running and plays `request` to completion on the
    /// caller's timeline, holding each step with `delay`.
    pub fn run_blocking<D>(&mut self, request: AlertRequest, delay: &mut D)
    where
        D: DelayNs + ?Sized,
    {
        self.idle();

        let Some(pattern) = self.pattern_for(request).filter(|pattern| !pattern.is_empty()) else {
            debug!("alert {:?} has nothing to play", request);
            return;
        };

        debug!("alert {:?} running to completion", request);
        let mut lit = ChannelSet::EMPTY;
        for step in pattern.steps() {
            switch_leds(&mut self.actuator, lit, step.lit);
            lit = step.lit;

            let hold_ms = as_millis_u32(step.hold);
            match step.tone_hz {
                Some(frequency_hz) => play_tone(&mut self.actuator, delay, frequency_hz, hold_ms),
                None => delay.delay_ms(hold_ms),
            }
        }

        self.actuator.all_off();
        debug!("alert {:?} complete", request);
    }
}

impl<A, I> AlertSequencer<A, I>
where
    A: Actuator,
    I: AlertInstant,
{
    /// Preempts whatever is running and begins `request` at `now`.
    ///
    /// Returns the resulting phase; zero-length patterns leave the sequencer idle.
    pub fn start(&mut self, request: AlertRequest, now: I) -> SequencerState {
        self.idle();

        let Some(pattern) = self.pattern_for(request) else {
            return SequencerState::Idle;
        };
        let Some(first) = pattern.step(0) else {
            debug!("alert {:?} has nothing to play", request);
            return SequencerState::Idle;
        };

        enter_step(&mut self.actuator, None, first, false);
        self.session = Some(AlertSession {
            request,
            pattern,
            started_at: now,
            step_index: 0,
            step: first,
            step_deadline: now + first.hold,
        });
        debug!("alert {:?} started", request);

        // Zero-length leading steps resolve immediately.
        self.poll(now)
    }

    /// Sounds the status ping at `now`.
    ///
    /// From idle this starts an ordinary ping. Over a running alert the ping
    /// only borrows the buzzer and the Status channel; the alert keeps its
    /// session and timeline and gets its outputs back when the ping ends.
    pub fn ping(&mut self, now: I) -> SequencerState {
        let step = match &self.session {
            Some(session) if session.request != AlertRequest::StatusPing => session.step,
            _ => return self.start(AlertRequest::StatusPing, now),
        };
        let ping = self.profile.status_ping;
        if ping.duration.is_zero() {
            return self.state();
        }

        let held = self.overlay.is_some();
        if held || step.tone_hz.is_some() {
            self.actuator.stop_tone();
        }
        if !held && !step.lit.contains(LedChannel::Status) {
            self.actuator.set_led(LedChannel::Status, true);
        }
        self.actuator.set_tone(ping.tone_hz, as_millis_u32(ping.duration));
        self.overlay = Some(StatusOverlay {
            until: now + ping.duration,
        });
        debug!("status ping over running alert");

        self.poll(now)
    }

    /// Advances the in-flight pattern to `now`.
    ///
    /// Step boundaries accumulate from the pattern start, so late polls catch
    /// up without stretching the total. Step and ping boundaries are applied
    /// in time order.
    pub fn poll(&mut self, now: I) -> SequencerState {
        loop {
            let step_due = self
                .session
                .as_ref()
                .map(|session| session.step_deadline)
                .filter(|deadline| now >= *deadline);
            let ping_due = self
                .overlay
                .map(|overlay| overlay.until)
                .filter(|until| now >= *until);

            match (step_due, ping_due) {
                (_, Some(until)) if step_due.is_none_or(|deadline| until <= deadline) => {
                    self.end_ping(until);
                }
                (Some(_), _) => self.advance_step(),
                _ => break,
            }
        }

        self.state()
    }

    fn advance_step(&mut self) {
        let held = self.overlay.is_some();
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let previous = session.step;
        let next_index = session.step_index + 1;
        match session.pattern.step(next_index) {
            Some(next) => {
                session.step_index = next_index;
                session.step = next;
                session.step_deadline = session.step_deadline + next.hold;
                enter_step(&mut self.actuator, Some(previous), next, held);
            }
            None => {
                let request = session.request;
                self.session = None;
                if held {
                    let primary = previous.lit.without(LedChannel::Status);
                    switch_leds(&mut self.actuator, primary, ChannelSet::EMPTY);
                } else {
                    self.actuator.all_off();
                }
                debug!("alert {:?} complete", request);
            }
        }
    }

    /// Hands the buzzer and Status channel back to the running alert, if any.
    fn end_ping(&mut self, at: I) {
        self.overlay = None;
        let Some(session) = self.session.as_ref() else {
            self.actuator.all_off();
            return;
        };

        let step = session.step;
        let remaining = session.step_deadline.saturating_duration_since(at);
        self.actuator.stop_tone();
        if !step.lit.contains(LedChannel::Status) {
            self.actuator.set_led(LedChannel::Status, false);
        }
        if let Some(frequency_hz) = step.tone_hz
            && !remaining.is_zero()
        {
            self.actuator.set_tone(frequency_hz, as_millis_u32(remaining));
        }
    }
}

fn switch_leds<A: Actuator + ?Sized>(actuator: &mut A, from: ChannelSet, to: ChannelSet) {
    for channel in from.iter().filter(|channel| !to.contains(*channel)) {
        actuator.set_led(channel, false);
    }
    for channel in to.iter().filter(|channel| !from.contains(*channel)) {
        actuator.set_led(channel, true);
    }
}

/// Moves outputs from `previous` to `next`. While `held`, a status ping owns
/// the buzzer and the Status channel and both are left alone.
fn enter_step<A: Actuator + ?Sized>(
    actuator: &mut A,
    previous: Option<PulseStep>,
    next: PulseStep,
    held: bool,
) {
    let mut from = previous.map_or(ChannelSet::EMPTY, |step| step.lit);
    let mut to = next.lit;
    if held {
        from = from.without(LedChannel::Status);
        to = to.without(LedChannel::Status);
    } else if previous.is_some_and(|step| step.tone_hz.is_some()) {
        actuator.stop_tone();
    }
    switch_leds(actuator, from, to);
    if !held && let Some(frequency_hz) = next.tone_hz {
        actuator.set_tone(frequency_hz, as_millis_u32(next.hold));
    }
}
