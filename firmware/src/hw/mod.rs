//! Board outputs: a PWM-driven piezo buzzer and four push-pull LED lines.
//!
//! The buzzer is driven by TIM3 channel 1. Tones never block here; the
//! sequencer ends them with [`Actuator::stop_tone`] at the step boundary.

use alert_core::actuator::{Actuator, ToneMode};
use alert_core::alerts::LedChannel;
use embassy_stm32::gpio::{Level, Output};
use embassy_stm32::peripherals::TIM3;
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::simple_pwm::SimplePwm;

/// Duty cycle for a square-wave tone.
const TONE_DUTY_PERCENT: u8 = 50;

/// LED outputs indexed by [`LedChannel::as_index`].
pub struct LedBank<'d> {
    lines: [Output<'d>; 4],
}

impl<'d> LedBank<'d> {
    pub fn new(green: Output<'d>, yellow: Output<'d>, red: Output<'d>, status: Output<'d>) -> Self {
        Self {
            lines: [green, yellow, red, status],
        }
    }

    fn set(&mut self, channel: LedChannel, on: bool) {
        let level = if on { Level::High } else { Level::Low };
        self.lines[channel.as_index()].set_level(level);
    }
}

pub struct HardwareActuator<'d> {
    buzzer: SimplePwm<'d, TIM3>,
    leds: LedBank<'d>,
    tone_hz: Option<u32>,
}

impl<'d> HardwareActuator<'d> {
    pub fn new(buzzer: SimplePwm<'d, TIM3>, leds: LedBank<'d>) -> Self {
        let mut actuator = Self {
            buzzer,
            leds,
            tone_hz: None,
        };
        actuator.all_off();
        actuator
    }
}

impl Actuator for HardwareActuator<'_> {
    fn tone_mode(&self) -> ToneMode {
        ToneMode::NonBlocking
    }

    fn set_tone(&mut self, frequency_hz: u32, _duration_ms: u32) {
        if frequency_hz == 0 {
            self.stop_tone();
            return;
        }
        if self.tone_hz != Some(frequency_hz) {
            self.buzzer.set_frequency(Hertz(frequency_hz));
            self.tone_hz = Some(frequency_hz);
        }
        // Max duty moves with the period, so duty follows the frequency change.
        let mut channel = self.buzzer.ch1();
        channel.set_duty_cycle_percent(TONE_DUTY_PERCENT);
        channel.enable();
    }

    fn stop_tone(&mut self) {
        self.buzzer.ch1().disable();
    }

    fn set_led(&mut self, channel: LedChannel, on: bool) {
        self.leds.set(channel, on);
    }
}
