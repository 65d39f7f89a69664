//! Hardware-facing actuator interface.
//!
//! The sequencer is written once against [`Actuator`] and never touches pins,
//! timers, or PWM channels directly. Two tone primitives exist in the field:
//! some backends can only auto-stop a tone by blocking for its duration, others
//! start the tone and return immediately. [`play_tone`] hides that difference
//! so the on-time of a tone is the same on either backend.

use embedded_hal::delay::DelayNs;

use crate::alerts::LedChannel;

/// How a backend's [`Actuator::set_tone`] treats the requested duration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ToneMode {
    /// `set_tone` holds the tone for the full duration and silences it before returning.
    Blocking,
    /// `set_tone` returns immediately; the caller must stop the tone later.
    NonBlocking,
}

/// Abstraction over the buzzer and LED outputs.
///
/// Calls are fire-and-forget: hardware absence is not detectable, so nothing
/// here returns an error.
pub trait Actuator {
    /// Reports which tone primitive this backend provides.
    fn tone_mode(&self) -> ToneMode;

    /// Begins sounding a tone. See [`ToneMode`] for the duration contract.
    fn set_tone(&mut self, frequency_hz: u32, duration_ms: u32);

    /// Silences the buzzer. Idempotent.
    fn stop_tone(&mut self);

    /// Drives a single LED channel. Idempotent and independent per channel.
    fn set_led(&mut self, channel: LedChannel, on: bool);

    /// Silences the buzzer and turns every LED channel off.
    fn all_off(&mut self) {
        self.stop_tone();
        for channel in LedChannel::ALL {
            self.set_led(channel, false);
        }
    }
}

impl<A: Actuator + ?Sized> Actuator for &mut A {
    fn tone_mode(&self) -> ToneMode {
        (**self).tone_mode()
    }

    fn set_tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        (**self).set_tone(frequency_hz, duration_ms);
    }

    fn stop_tone(&mut self) {
        (**self).stop_tone();
    }

    fn set_led(&mut self, channel: LedChannel, on: bool) {
        (**self).set_led(channel, on);
    }

    fn all_off(&mut self) {
        (**self).all_off();
    }
}

/// Plays a tone for exactly `duration_ms` and returns once it has been silenced.
///
/// Blocking backends already hold for the duration. Non-blocking backends are
/// held with `delay` and then stopped explicitly.
pub fn play_tone<A, D>(actuator: &mut A, delay: &mut D, frequency_hz: u32, duration_ms: u32)
where
    A: Actuator + ?Sized,
    D: DelayNs + ?Sized,
{
    if duration_ms == 0 {
        return;
    }

    match actuator.tone_mode() {
        ToneMode::Blocking => actuator.set_tone(frequency_hz, duration_ms),
        ToneMode::NonBlocking => {
            actuator.set_tone(frequency_hz, duration_ms);
            delay.delay_ms(duration_ms);
            actuator.stop_tone();
        }
    }
}

/// Actuator that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopActuator;

impl NoopActuator {
    /// Creates a new no-op actuator.
    pub const fn new() -> Self {
        Self
    }
}

impl Actuator for NoopActuator {
    fn tone_mode(&self) -> ToneMode {
        ToneMode::NonBlocking
    }

    fn set_tone(&mut self, _: u32, _: u32) {}

    fn stop_tone(&mut self) {}

    fn set_led(&mut self, _: LedChannel, _: bool) {}
}
