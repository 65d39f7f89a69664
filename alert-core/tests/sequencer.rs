mod common;

use alert_core::actuator::ToneMode;
use alert_core::alerts::{AlertLevel, AlertProfile, ChannelSet, LedChannel, LevelProfile, Site};
use alert_core::sequencer::{AlertRequest, AlertSequencer, SequencerState};
use alert_core::telemetry::ActuatorEvent;

use common::{ClockDelay, Output, Traced, VirtualClock, ms, on_intervals, total_on, traced};

const ALL_REQUESTS: [AlertRequest; 8] = [
    AlertRequest::Level(AlertLevel::Far),
    AlertRequest::Level(AlertLevel::Middle),
    AlertRequest::Level(AlertLevel::Closest),
    AlertRequest::Level(AlertLevel::Urgent),
    AlertRequest::StatusPing,
    AlertRequest::Indicator(Site::Origin),
    AlertRequest::RawBuzz {
        frequency_hz: 440,
        duration_ms: 250,
    },
    AlertRequest::SelfTest,
];

fn sequencer(clock: &VirtualClock, profile: AlertProfile) -> AlertSequencer<Traced> {
    AlertSequencer::new(traced(ToneMode::NonBlocking, clock), profile)
}

#[test]
fn idle_silences_everything_from_any_state() {
    for request in ALL_REQUESTS {
        let clock = VirtualClock::new();
        let mut seq = sequencer(&clock, AlertProfile::canonical());

        seq.start(request, clock.elapsed());
        clock.advance_ms(120);
        seq.poll(clock.elapsed());

        let before = seq.actuator().trace().total_recorded();
        seq.idle();
        let calls = seq.actuator().trace().total_recorded() - before;

        assert_eq!(seq.state(), SequencerState::Idle, "{request:?}");
        assert!(seq.actuator().trace().outputs_off(), "{request:?}");
        // One stop plus one call per channel.
        assert_eq!(calls, 5, "{request:?}");

        // A second idle is indistinguishable from the first.
        seq.idle();
        assert!(seq.actuator().trace().outputs_off());
    }
}

#[test]
fn preempting_alert_never_leaves_previous_channels_lit() {
    let clock = VirtualClock::new();
    let mut seq = sequencer(&clock, AlertProfile::canonical());

    seq.start(AlertRequest::Level(AlertLevel::Closest), clock.elapsed());
    clock.advance_ms(100);
    assert!(seq.actuator().trace().lit().contains(LedChannel::Red));

    let preempt_at = seq.actuator().trace().total_recorded();
    seq.start(AlertRequest::Level(AlertLevel::Far), clock.elapsed());

    let mut lit = ChannelSet::ALL;
    let mut first_on_seen = false;
    for record in seq.actuator().trace().oldest_first() {
        if record.id < preempt_at {
            continue;
        }
        match record.event {
            ActuatorEvent::Led { channel, on: false } => lit = lit.without(channel),
            ActuatorEvent::Led { on: true, .. } | ActuatorEvent::ToneOn { .. } => {
                if !first_on_seen {
                    assert!(lit.is_empty(), "outputs still lit at first call of new alert");
                    first_on_seen = true;
                }
            }
            ActuatorEvent::ToneOff => {}
        }
    }
    assert!(first_on_seen);

    while seq.poll(clock.elapsed()).is_active() {
        assert!(!seq.actuator().trace().lit().contains(LedChannel::Red));
        clock.advance_ms(10);
    }
}

#[test]
fn blocking_pulsed_alert_fills_exact_total() {
    for mode in [ToneMode::Blocking, ToneMode::NonBlocking] {
        let clock = VirtualClock::new();
        let mut seq: AlertSequencer<Traced> =
            AlertSequencer::new(traced(mode, &clock), AlertProfile::canonical());

        seq.run_blocking(
            AlertRequest::Level(AlertLevel::Far),
            &mut ClockDelay(clock.clone()),
        );

        assert_eq!(clock.elapsed(), ms(3_000), "{mode:?}");
        let trace = seq.actuator().trace();
        let tone = on_intervals(trace, Output::Tone);
        assert_eq!(tone.len(), 6);
        assert!(tone.iter().all(|(start, end)| *end - *start == ms(300)));
        assert_eq!(total_on(&tone), ms(1_800));
        assert_eq!(on_intervals(trace, Output::Led(LedChannel::Green)), tone);
        assert!(trace.outputs_off());
    }
}

#[test]
fn truncated_final_chunk_keeps_total() {
    let mut profile = AlertProfile::canonical();
    profile.middle = LevelProfile::pulsed(LedChannel::Yellow, 2_000, ms(1_100));
    let clock = VirtualClock::new();
    let mut seq = sequencer(&clock, profile);

    seq.run_blocking(
        AlertRequest::Level(AlertLevel::Middle),
        &mut ClockDelay(clock.clone()),
    );

    let tone = on_intervals(seq.actuator().trace(), Output::Tone);
    assert_eq!(clock.elapsed(), ms(1_100));
    assert_eq!(tone.last(), Some(&(ms(1_000), ms(1_100))));
}

#[test]
fn simple_alert_led_and_tone_share_one_interval() {
    let mut profile = AlertProfile::canonical();
    profile.closest = LevelProfile::simple(LedChannel::Red, 2_500, ms(700));

    for mode in [ToneMode::Blocking, ToneMode::NonBlocking] {
        let clock = VirtualClock::new();
        let mut seq: AlertSequencer<Traced> = AlertSequencer::new(traced(mode, &clock), profile);
        clock.advance_ms(50);

        seq.run_blocking(
            AlertRequest::Level(AlertLevel::Closest),
            &mut ClockDelay(clock.clone()),
        );

        let trace = seq.actuator().trace();
        let expected = vec![(ms(50), ms(750))];
        assert_eq!(on_intervals(trace, Output::Tone), expected, "{mode:?}");
        assert_eq!(on_intervals(trace, Output::Led(LedChannel::Red)), expected);
        assert_eq!(on_intervals(trace, Output::Led(LedChannel::Status)), expected);
    }
}

#[test]
fn incremental_alert_matches_blocking_timing() {
    let clock = VirtualClock::new();
    let mut seq = sequencer(&clock, AlertProfile::canonical());

    assert_eq!(
        seq.start(AlertRequest::Level(AlertLevel::Far), clock.elapsed()),
        SequencerState::RunningPulsed
    );
    while seq.poll(clock.elapsed()).is_active() {
        clock.advance_ms(1);
    }

    assert_eq!(clock.elapsed(), ms(3_000));
    let trace = seq.actuator().trace();
    let tone = on_intervals(trace, Output::Tone);
    assert_eq!(total_on(&tone), ms(1_800));
    assert_eq!(on_intervals(trace, Output::Led(LedChannel::Green)), tone);
    assert!(trace.outputs_off());
}

#[test]
fn urgent_strobes_every_channel() {
    let clock = VirtualClock::new();
    let mut seq = sequencer(&clock, AlertProfile::canonical());

    seq.run_blocking(
        AlertRequest::Level(AlertLevel::Urgent),
        &mut ClockDelay(clock.clone()),
    );

    let trace = seq.actuator().trace();
    let tone = on_intervals(trace, Output::Tone);
    assert_eq!(tone.len(), 6);
    for channel in LedChannel::ALL {
        assert_eq!(on_intervals(trace, Output::Led(channel)), tone, "{channel:?}");
    }
    assert_eq!(clock.elapsed(), ms(1_500));
}

#[test]
fn status_ping_leaves_primary_channels_alone() {
    let clock = VirtualClock::new();
    let mut seq = sequencer(&clock, AlertProfile::canonical());

    seq.run_blocking(AlertRequest::StatusPing, &mut ClockDelay(clock.clone()));

    let trace = seq.actuator().trace();
    assert!(clock.elapsed() < ms(1_000));
    assert_eq!(on_intervals(trace, Output::Led(LedChannel::Status)).len(), 1);
    for channel in [LedChannel::Green, LedChannel::Yellow, LedChannel::Red] {
        assert!(on_intervals(trace, Output::Led(channel)).is_empty());
    }
}

#[test]
fn status_ping_overlays_a_running_alert() {
    let clock = VirtualClock::new();
    let mut seq = sequencer(&clock, AlertProfile::canonical());

    seq.start(AlertRequest::Level(AlertLevel::Far), clock.elapsed());
    clock.advance_ms(350);
    seq.poll(clock.elapsed());
    assert_eq!(seq.ping(clock.elapsed()), SequencerState::RunningPulsed);
    assert_eq!(seq.session().map(|session| session.step_index), Some(1));

    while seq.poll(clock.elapsed()).is_active() {
        clock.advance_ms(10);
    }

    let trace = seq.actuator().trace();
    assert_eq!(clock.elapsed(), ms(3_000));
    let green = on_intervals(trace, Output::Led(LedChannel::Green));
    assert_eq!(green.len(), 6);
    assert!(green.iter().all(|(start, end)| *end - *start == ms(300)));
    assert!(on_intervals(trace, Output::Led(LedChannel::Status)).contains(&(ms(350), ms(430))));
    assert_eq!(total_on(&on_intervals(trace, Output::Tone)), ms(1_880));
    assert!(trace.outputs_off());
}

#[test]
fn zero_duration_raw_buzz_is_silent() {
    let clock = VirtualClock::new();
    let mut seq = sequencer(&clock, AlertProfile::canonical());
    let request = AlertRequest::RawBuzz {
        frequency_hz: 440,
        duration_ms: 0,
    };

    assert_eq!(seq.start(request, clock.elapsed()), SequencerState::Idle);
    seq.run_blocking(request, &mut ClockDelay(clock.clone()));

    let trace = seq.actuator().trace();
    assert!(
        trace
            .oldest_first()
            .all(|record| !matches!(
                record.event,
                ActuatorEvent::ToneOn { .. } | ActuatorEvent::Led { on: true, .. }
            ))
    );
    assert_eq!(clock.elapsed(), ms(0));
}

#[test]
fn zero_on_time_strobe_never_pulses() {
    let mut profile = AlertProfile::canonical();
    profile.urgent.on = ms(0);
    let clock = VirtualClock::new();
    let mut seq = sequencer(&clock, profile);

    seq.start(AlertRequest::Level(AlertLevel::Urgent), clock.elapsed());
    while seq.poll(clock.elapsed()).is_active() {
        clock.advance_ms(10);
    }

    assert_eq!(clock.elapsed(), ms(600));
    assert!(
        seq.actuator()
            .trace()
            .oldest_first()
            .all(|record| !matches!(
                record.event,
                ActuatorEvent::ToneOn { .. } | ActuatorEvent::Led { on: true, .. }
            ))
    );
}
