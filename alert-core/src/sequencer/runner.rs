//! Timing backends that pair the sequencer with a delay or a clock.

use embedded_hal::delay::DelayNs;

use super::{AlertRequest, AlertSequencer, SequencerState};
use crate::actuator::Actuator;
use crate::alerts::AlertProfile;
use crate::config::ExecutionModel;
use crate::time::TimeSource;

/// Abstraction over the two execution models used by the dispatcher.
pub trait AlertRunner {
    /// Execution model this runner implements.
    fn model(&self) -> ExecutionModel;

    /// Preempts the current alert and starts `request`.
    ///
    /// Blocking runners return only once the alert has finished playing.
    fn begin(&mut self, request: AlertRequest);

    /// Sounds the status ping without cancelling the alert in flight.
    fn ping(&mut self);

    /// Forces every output off and clears the in-flight alert.
    fn silence(&mut self);

    /// Advances an in-flight alert to the current time.
    fn poll(&mut self) -> SequencerState;

    fn state(&self) -> SequencerState;
}

impl<R: AlertRunner + ?Sized> AlertRunner for &mut R {
    fn model(&self) -> ExecutionModel {
        (**self).model()
    }

    fn begin(&mut self, request: AlertRequest) {
        (**self).begin(request);
    }

    fn ping(&mut self) {
        (**self).ping();
    }

    fn silence(&mut self) {
        (**self).silence();
    }

    fn poll(&mut self) -> SequencerState {
        (**self).poll()
    }

    fn state(&self) -> SequencerState {
        (**self).state()
    }
}

/// Runs each alert to completion on the caller's timeline.
pub struct BlockingRunner<A, D> {
    sequencer: AlertSequencer<A>,
    delay: D,
}

impl<A, D> BlockingRunner<A, D> {
    pub const fn new(actuator: A, profile: AlertProfile, delay: D) -> Self {
        Self {
            sequencer: AlertSequencer::new(actuator, profile),
            delay,
        }
    }

    pub fn sequencer(&self) -> &AlertSequencer<A> {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut AlertSequencer<A> {
        &mut self.sequencer
    }

    pub fn into_parts(self) -> (AlertSequencer<A>, D) {
        (self.sequencer, self.delay)
    }
}

impl<A, D> AlertRunner for BlockingRunner<A, D>
where
    A: Actuator,
    D: DelayNs,
{
    fn model(&self) -> ExecutionModel {
        ExecutionModel::Blocking
    }

    fn begin(&mut self, request: AlertRequest) {
        self.sequencer.run_blocking(request, &mut self.delay);
    }

    fn ping(&mut self) {
        self.sequencer.ping_blocking(&mut self.delay);
    }

    fn silence(&mut self) {
        self.sequencer.idle();
    }

    fn poll(&mut self) -> SequencerState {
        self.sequencer.state()
    }

    fn state(&self) -> SequencerState {
        self.sequencer.state()
    }
}

/// Starts alerts immediately and advances them whenever it is polled.
pub struct IncrementalRunner<A, C: TimeSource> {
    sequencer: AlertSequencer<A, C::Instant>,
    clock: C,
}

impl<A, C: TimeSource> IncrementalRunner<A, C> {
    pub const fn new(actuator: A, profile: AlertProfile, clock: C) -> Self {
        Self {
            sequencer: AlertSequencer::new(actuator, profile),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sequencer(&self) -> &AlertSequencer<A, C::Instant> {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut AlertSequencer<A, C::Instant> {
        &mut self.sequencer
    }

    pub fn into_parts(self) -> (AlertSequencer<A, C::Instant>, C) {
        (self.sequencer, self.clock)
    }
}

impl<A, C> AlertRunner for IncrementalRunner<A, C>
where
    A: Actuator,
    C: TimeSource,
{
    fn model(&self) -> ExecutionModel {
        ExecutionModel::Incremental
    }

    fn begin(&mut self, request: AlertRequest) {
        let now = self.clock.now();
        self.sequencer.start(request, now);
    }

    fn ping(&mut self) {
        let now = self.clock.now();
        self.sequencer.ping(now);
    }

    fn silence(&mut self) {
        self.sequencer.idle();
    }

    fn poll(&mut self) -> SequencerState {
        let now = self.clock.now();
        self.sequencer.poll(now)
    }

    fn state(&self) -> SequencerState {
        self.sequencer.state()
    }
}
