mod common;

use alert_core::actuator::ToneMode;
use alert_core::alerts::LedChannel;
use alert_core::config::{ControllerConfig, FeatureFlags};
use alert_core::controller::READY_TOKEN;
use alert_core::protocol::MAX_LINE_LEN;
use alert_core::sequencer::{AlertRunner, SequencerState};

use common::{
    BlockingController, IncrementalController, Output, Trace, blocking_controller,
    incremental_controller, ms, on_intervals, run_until_idle, total_on,
};

fn quiet_config() -> ControllerConfig {
    ControllerConfig::new().with_self_test(false)
}

fn blocking_trace(controller: &BlockingController) -> &Trace {
    controller.runner().sequencer().actuator().trace()
}

fn incremental_trace(controller: &IncrementalController) -> &Trace {
    controller.runner().sequencer().actuator().trace()
}

fn lines(output: &str) -> Vec<&str> {
    output.split_terminator("\r\n").collect()
}

#[test]
fn startup_prints_banner_then_ready_then_sweeps() {
    let config = ControllerConfig::new();
    let (mut controller, clock) = incremental_controller(&config);
    let mut out = String::new();

    controller.start(&mut out).expect("write to string");

    let printed = lines(&out);
    assert_eq!(printed.first(), Some(&config.banner));
    assert_eq!(printed.last(), Some(&READY_TOKEN));
    assert_eq!(controller.state(), SequencerState::RunningPulsed);

    run_until_idle(&mut controller, &clock, ms(2_000));
    assert_eq!(clock.elapsed(), ms(600));

    let trace = incremental_trace(&controller);
    for (slot, channel) in (0u64..).zip(LedChannel::ALL) {
        let start = ms(slot * 150);
        assert_eq!(
            on_intervals(trace, Output::Led(channel)),
            vec![(start, start + ms(150))],
            "{channel:?}"
        );
    }
    assert!(on_intervals(trace, Output::Tone).is_empty());
    assert!(trace.outputs_off());
}

#[test]
fn blocking_startup_finishes_sweep_before_returning() {
    let (mut controller, clock) =
        blocking_controller(&ControllerConfig::new(), ToneMode::NonBlocking);
    let mut out = String::new();

    controller.start(&mut out).expect("write to string");

    assert!(out.contains("READY\r\n"));
    assert_eq!(clock.elapsed(), ms(600));
    assert!(blocking_trace(&controller).outputs_off());
}

#[test]
fn every_line_is_echoed_then_answered_once() {
    let (mut controller, _clock) = incremental_controller(&quiet_config());
    let mut out = String::new();

    controller
        .feed(b"ping\r\nbuzz 440 250\nBUZZ 1000\r\n\r\n", &mut out)
        .expect("write to string");

    assert_eq!(
        lines(&out),
        vec![
            "RX: PING",
            "PONG",
            "RX: BUZZ 440 250",
            "OK BUZZ",
            "RX: BUZZ 1000",
            "ERR BUZZ SYNTAX",
        ]
    );
}

#[test]
fn origin_nearby_then_idle_end_to_end() {
    let (mut controller, clock) = blocking_controller(&quiet_config(), ToneMode::Blocking);
    let mut out = String::new();

    controller
        .feed(b"ORIGIN_NEARBY\n", &mut out)
        .expect("write to string");

    assert_eq!(lines(&out), vec!["RX: ORIGIN_NEARBY", "OK ORIGIN_NEARBY"]);
    assert_eq!(clock.elapsed(), ms(3_000));
    let trace = blocking_trace(&controller);
    let tone = on_intervals(trace, Output::Tone);
    assert_eq!(tone.len(), 6);
    assert_eq!(on_intervals(trace, Output::Led(LedChannel::Green)), tone);

    out.clear();
    controller.feed(b"IDLE\n", &mut out).expect("write to string");
    assert_eq!(lines(&out), vec!["RX: IDLE", "OK IDLE"]);
    assert!(blocking_trace(&controller).outputs_off());
}

#[test]
fn incremental_idle_cancels_mid_alert() {
    let (mut controller, clock) = incremental_controller(&quiet_config());
    let mut out = String::new();

    controller
        .feed(b"ORIGIN_NEARBY\n", &mut out)
        .expect("write to string");
    assert_eq!(lines(&out), vec!["RX: ORIGIN_NEARBY", "OK ORIGIN_NEARBY"]);
    assert_eq!(clock.elapsed(), ms(0));

    clock.advance_ms(100);
    controller.poll();
    assert!(incremental_trace(&controller).tone_active());

    controller.feed(b"IDLE\n", &mut out).expect("write to string");
    assert_eq!(controller.state(), SequencerState::Idle);
    assert!(incremental_trace(&controller).outputs_off());

    clock.advance_ms(5_000);
    assert_eq!(controller.poll(), SequencerState::Idle);
    assert!(incremental_trace(&controller).outputs_off());
}

#[test]
fn new_alert_replaces_running_alert() {
    let (mut controller, clock) = incremental_controller(&quiet_config());
    let mut out = String::new();

    controller.feed(b"ORIGIN_STOP\n", &mut out).expect("write");
    clock.advance_ms(250);
    controller.poll();
    controller.feed(b"URGENT\n", &mut out).expect("write");

    assert_eq!(controller.state(), SequencerState::RunningUrgent);
    run_until_idle(&mut controller, &clock, ms(10_000));
    assert_eq!(clock.elapsed(), ms(250 + 1_500));
}

#[test]
fn status_update_does_not_cut_short_a_running_alert() {
    let (mut controller, clock) = incremental_controller(&quiet_config());
    let mut out = String::new();

    controller
        .feed(b"ORIGIN_NEARBY\nSTATUS_UPDATE\n", &mut out)
        .expect("write");
    assert_eq!(lines(&out)[3], "OK STATUS");

    clock.advance_ms(100);
    assert_eq!(controller.poll(), SequencerState::RunningPulsed);
    assert!(incremental_trace(&controller).lit().contains(LedChannel::Green));
    assert!(incremental_trace(&controller).tone_active());

    run_until_idle(&mut controller, &clock, ms(10_000));
    assert_eq!(clock.elapsed(), ms(3_000));

    let trace = incremental_trace(&controller);
    assert_eq!(on_intervals(trace, Output::Led(LedChannel::Green)).len(), 6);
    assert_eq!(total_on(&on_intervals(trace, Output::Tone)), ms(1_800));
    assert!(trace.outputs_off());
}

#[test]
fn blocking_status_update_follows_the_finished_alert() {
    let (mut controller, clock) = blocking_controller(&quiet_config(), ToneMode::NonBlocking);
    let mut out = String::new();

    controller
        .feed(b"ORIGIN_NEARBY\nSTATUS_UPDATE\n", &mut out)
        .expect("write");

    assert_eq!(clock.elapsed(), ms(3_080));
    let trace = blocking_trace(&controller);
    let green = on_intervals(trace, Output::Led(LedChannel::Green));
    assert_eq!(green.len(), 6);
    assert_eq!(green.last().map(|(_, end)| *end), Some(ms(2_800)));
    assert_eq!(
        on_intervals(trace, Output::Led(LedChannel::Status)).last(),
        Some(&(ms(3_000), ms(3_080)))
    );
    assert!(trace.outputs_off());
}

#[test]
fn disabled_destination_alerts_do_not_touch_outputs() {
    let config = quiet_config().with_flags(FeatureFlags::new().with_destination_alerts(false));
    let (mut controller, clock) = blocking_controller(&config, ToneMode::NonBlocking);
    let mut out = String::new();
    controller.start(&mut out).expect("write");
    let before = blocking_trace(&controller).total_recorded();
    out.clear();

    controller
        .feed(b"DEST_STOP\nLED_STATUS_DEST\n", &mut out)
        .expect("write");

    assert_eq!(
        lines(&out),
        vec![
            "RX: DEST_STOP",
            "OK DEST_IGNORED",
            "RX: LED_STATUS_DEST",
            "OK LED_DEST_IGNORED",
        ]
    );
    assert_eq!(blocking_trace(&controller).total_recorded(), before);
    assert_eq!(clock.elapsed(), ms(0));
}

#[test]
fn enabled_destination_alert_plays_closest_sequence() {
    let (mut controller, clock) = blocking_controller(&quiet_config(), ToneMode::NonBlocking);
    let mut out = String::new();

    controller.feed(b"DEST_STOP\n", &mut out).expect("write");

    assert_eq!(lines(&out), vec!["RX: DEST_STOP", "OK DEST_STOP"]);
    assert_eq!(clock.elapsed(), ms(8_000));
    let tone = on_intervals(blocking_trace(&controller), Output::Tone);
    assert_eq!(tone.len(), 16);
    assert_eq!(total_on(&tone), ms(4_800));
}

#[test]
fn unknown_command_makes_no_actuator_call() {
    let (mut controller, _clock) = blocking_controller(&quiet_config(), ToneMode::Blocking);
    let mut out = String::new();
    let before = blocking_trace(&controller).total_recorded();

    controller.feed(b"FOO\nTONE 440\n", &mut out).expect("write");

    assert_eq!(
        lines(&out),
        vec!["RX: FOO", "ERR UNKNOWN", "RX: TONE 440", "ERR UNKNOWN"]
    );
    assert_eq!(blocking_trace(&controller).total_recorded(), before);
}

#[test]
fn status_and_led_commands_acknowledge_with_tags() {
    let (mut controller, _clock) = incremental_controller(&quiet_config());
    let mut out = String::new();

    controller
        .feed(
            b"STATUS_UPDATE\nLED_STATUS_ORIGIN\nLED_STATUS_DEST\nLED_STATUS_NONE\nURGENT\n",
            &mut out,
        )
        .expect("write");

    let responses: Vec<&str> = lines(&out).into_iter().skip(1).step_by(2).collect();
    assert_eq!(
        responses,
        vec![
            "OK STATUS",
            "OK LED_ORIGIN",
            "OK LED_DEST",
            "OK LED_NONE",
            "OK URGENT",
        ]
    );
}

#[test]
fn led_none_turns_indicator_off() {
    let (mut controller, clock) = incremental_controller(&quiet_config());
    let mut out = String::new();

    controller.feed(b"LED_STATUS_ORIGIN\n", &mut out).expect("write");
    assert!(incremental_trace(&controller).lit().contains(LedChannel::Green));
    assert!(!incremental_trace(&controller).tone_active());

    clock.advance_ms(200);
    controller.feed(b"LED_STATUS_NONE\n", &mut out).expect("write");
    assert!(incremental_trace(&controller).outputs_off());
    assert_eq!(controller.state(), SequencerState::Idle);
}

#[test]
fn overlong_and_garbled_lines_are_rejected() {
    let (mut controller, _clock) = incremental_controller(&quiet_config());
    let mut out = String::new();

    let mut long = vec![b'P'; MAX_LINE_LEN + 10];
    long.push(b'\n');
    controller.feed(&long, &mut out).expect("write");
    controller.feed(b"PI\x07NG\n", &mut out).expect("write");

    let printed = lines(&out);
    assert_eq!(printed.len(), 4);
    assert_eq!(printed[0].len(), "RX: ".len() + MAX_LINE_LEN);
    assert_eq!(printed[1], "ERR UNKNOWN");
    assert_eq!(printed[2], "RX: PING");
    assert_eq!(printed[3], "ERR UNKNOWN");
    assert_eq!(controller.runner().state(), SequencerState::Idle);
}

#[test]
fn runner_reports_its_model() {
    let (blocking, _) = blocking_controller(&quiet_config(), ToneMode::Blocking);
    let (incremental, _) = incremental_controller(&quiet_config());
    assert_eq!(blocking.runner().model().label(), "blocking");
    assert_eq!(incremental.runner().model().label(), "incremental");
}
