//! Guard node scenarios: voltage cutoff and restore, tamper debounce,
//! heartbeat cadence and dispatch failure isolation.

use fenceguard::app::events::{MSG_HEARTBEAT, MSG_HIGH_VOLTAGE, MSG_RECONNECTED, MSG_SENSOR_FAULT, MSG_TAMPER};
use fenceguard::app::service::GuardService;
use fenceguard::config::FenceConfig;
use fenceguard::drivers::relay::RelayState;
use fenceguard::error::{DeliveryError, SensorFault};
use fenceguard::node::GuardNode;
use fenceguard::safety::GuardState;
use fenceguard::scheduler::{PollLoop, PollNode};
use fenceguard::adapters::time::SimulatedTime;
use fenceguard::app::ports::Clock;

use crate::mock_hw::{RecordingPin, RecordingSink, ScriptedAdc, ScriptedLine};

type Service = GuardService<ScriptedAdc, ScriptedLine, RecordingPin, RecordingSink>;

fn service(adc: ScriptedAdc, tamper: ScriptedLine, relay: RecordingPin, sink: RecordingSink) -> Service {
    let mut s = GuardService::new(FenceConfig::default(), adc, tamper, relay, sink, 0);
    s.start().unwrap();
    s
}

fn safe_adc() -> ScriptedAdc {
    ScriptedAdc::volts(&[30.0], &FenceConfig::default())
}

// ── Voltage ───────────────────────────────────────────────────

#[test]
fn spike_cuts_power_once_and_recovery_restores_it() {
    let cfg = FenceConfig::default();
    let relay = RecordingPin::new();
    let mut s = service(
        ScriptedAdc::volts(&[30.0, 30.0, 90.0, 90.0, 30.0], &cfg),
        ScriptedLine::tamper_idle(),
        relay.clone(),
        RecordingSink::new(),
    );

    let mut per_cycle = Vec::new();
    for i in 0..5 {
        let cycle = s.poll(i * 500);
        per_cycle.push(cycle.alerts.len());
        let expected = if i == 2 || i == 3 { GuardState::Cutoff } else { GuardState::Energized };
        assert_eq!(cycle.state, expected, "cycle {}", i);
    }

    assert_eq!(per_cycle, vec![0, 0, 1, 0, 1]);
    assert_eq!(
        s.sink().alerts(),
        vec![
            ("CRITICAL".to_owned(), MSG_HIGH_VOLTAGE.to_owned()),
            ("INFO".to_owned(), MSG_RECONNECTED.to_owned()),
        ]
    );
    // start() closes, spike opens, recovery closes.  No chatter.
    assert_eq!(relay.history(), vec![true, false, true]);
    assert_eq!(s.relay_state(), RelayState::Closed);
}

#[test]
fn alert_body_has_type_and_message_fields() {
    let cfg = FenceConfig::default();
    let mut s = service(
        ScriptedAdc::volts(&[90.0], &cfg),
        ScriptedLine::tamper_idle(),
        RecordingPin::new(),
        RecordingSink::new(),
    );
    s.poll(0);
    assert_eq!(
        s.sink().bodies[0],
        format!(r#"{{"type":"CRITICAL","message":"{}"}}"#, MSG_HIGH_VOLTAGE)
    );
}

#[test]
fn sensor_fault_is_treated_as_unsafe() {
    let cfg = FenceConfig::default();
    let raw_safe = fenceguard::sensors::fence_voltage::raw_for_voltage(30.0, &cfg);
    let relay = RecordingPin::new();
    let mut s = service(
        ScriptedAdc::raw([
            Ok(raw_safe),
            Err(SensorFault::AdcReadFailed),
            Ok(4096),
            Ok(raw_safe),
        ]),
        ScriptedLine::tamper_idle(),
        relay.clone(),
        RecordingSink::new(),
    );

    assert_eq!(s.poll(0).state, GuardState::Energized);
    assert_eq!(s.poll(500).state, GuardState::Cutoff);
    // Out-of-range while already cut off: no repeat alert.
    assert_eq!(s.poll(1000).state, GuardState::Cutoff);
    assert_eq!(s.poll(1500).state, GuardState::Energized);

    assert_eq!(
        s.sink().alerts(),
        vec![
            ("CRITICAL".to_owned(), MSG_SENSOR_FAULT.to_owned()),
            ("INFO".to_owned(), MSG_RECONNECTED.to_owned()),
        ]
    );
    assert_eq!(relay.history(), vec![true, false, true]);
}

#[test]
fn relay_write_failure_still_alerts_and_cutoff_is_retried() {
    let cfg = FenceConfig::default();
    let relay = RecordingPin::new();
    let mut s = service(
        ScriptedAdc::volts(&[90.0], &cfg),
        ScriptedLine::tamper_idle(),
        relay.clone(),
        RecordingSink::new(),
    );
    relay.fail.set(true);
    let cycle = s.poll(0);
    assert_eq!(cycle.state, GuardState::Cutoff);
    assert_eq!(s.sink().count("CRITICAL"), 1);
    assert_eq!(s.relay_state(), RelayState::Closed);

    // Still failing: every cycle tries again, no new alert.
    s.poll(500);
    assert_eq!(s.relay_state(), RelayState::Closed);

    relay.fail.set(false);
    for t in [1000, 1500, 2000] {
        s.poll(t);
    }
    assert_eq!(s.state(), GuardState::Cutoff);
    assert_eq!(s.relay_state(), RelayState::Open);
    assert_eq!(relay.history(), vec![true, false]);
    assert_eq!(s.sink().count("CRITICAL"), 1);
}

// ── Tamper ────────────────────────────────────────────────────

#[test]
fn tamper_held_across_three_polls_alerts_once() {
    let tamper = ScriptedLine::tamper_idle();
    let svc = service(safe_adc(), tamper.clone(), RecordingPin::new(), RecordingSink::new());
    let time = SimulatedTime::new();
    let mut lp = PollLoop::new(time.clone(), time.clone(), GuardNode::new(svc));

    tamper.set(false);
    // Default cadence: polls at 0, 500 and 1000 ms.
    lp.run_cycles(3);
    assert_eq!(time.now_ms(), 1500);
    let svc = lp.node().service();
    assert_eq!(svc.sink().count("HIGH"), 1);
    assert_eq!(svc.sink().alerts()[0].1, MSG_TAMPER);
    assert_eq!(svc.tamper_detections(), 1);
}

#[test]
fn tamper_still_held_after_debounce_alerts_again() {
    let tamper = ScriptedLine::tamper_idle();
    let mut s = service(safe_adc(), tamper.clone(), RecordingPin::new(), RecordingSink::new());

    tamper.set(false);
    for t in (0..=3000).step_by(500) {
        s.poll(t);
    }
    // Fires at 0, 1500, 3000.
    assert_eq!(s.sink().count("HIGH"), 3);
}

#[test]
fn tamper_does_not_touch_the_relay() {
    let tamper = ScriptedLine::tamper_idle();
    let relay = RecordingPin::new();
    let mut s = service(safe_adc(), tamper.clone(), relay.clone(), RecordingSink::new());
    tamper.set(false);
    s.poll(0);
    assert_eq!(s.state(), GuardState::Energized);
    assert_eq!(relay.history(), vec![true]);
}

// ── Heartbeat ─────────────────────────────────────────────────

#[test]
fn heartbeat_twice_in_twenty_five_seconds() {
    let mut s = service(safe_adc(), ScriptedLine::tamper_idle(), RecordingPin::new(), RecordingSink::new());
    for t in (0..=25_000).step_by(500) {
        s.poll(t);
    }
    assert_eq!(s.sink().count("INFO"), 2);
    assert!(s.sink().alerts().iter().all(|(_, m)| m == MSG_HEARTBEAT));
}

#[test]
fn heartbeat_through_poll_loop_on_simulated_time() {
    let time = SimulatedTime::new();
    let svc = service(safe_adc(), ScriptedLine::tamper_idle(), RecordingPin::new(), RecordingSink::new());
    let mut lp = PollLoop::new(time.clone(), time, GuardNode::new(svc));
    // 500 ms per cycle: 51 cycles cover 0..=25 000 ms.
    lp.run_cycles(51);
    let sink = lp.node().service().sink();
    assert_eq!(sink.count("INFO"), 2);
    assert_eq!(sink.maintained, 51);
    assert_eq!(lp.node().interval_ms(), 500);
}

// ── Dispatch isolation ────────────────────────────────────────

#[test]
fn failing_sink_does_not_change_guard_state() {
    let cfg = FenceConfig::default();
    let relay = RecordingPin::new();
    let mut s = service(
        ScriptedAdc::volts(&[90.0, 90.0, 30.0], &cfg),
        ScriptedLine::tamper_idle(),
        relay.clone(),
        RecordingSink::failing(DeliveryError::RequestFailed),
    );

    assert_eq!(s.poll(0).state, GuardState::Cutoff);
    assert_eq!(s.poll(500).state, GuardState::Cutoff);
    // The next alert is still attempted after the first failed.
    assert_eq!(s.poll(1000).state, GuardState::Energized);

    assert_eq!(s.sink().attempts, 2);
    let stats = s.dispatch_stats();
    assert_eq!(stats.delivered, 0);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.last_error, Some(DeliveryError::RequestFailed));
    assert_eq!(relay.history(), vec![true, false, true]);
}

#[test]
fn offline_sink_skips_post_but_still_actuates() {
    let cfg = FenceConfig::default();
    let relay = RecordingPin::new();
    let mut s = service(
        ScriptedAdc::volts(&[90.0], &cfg),
        ScriptedLine::tamper_idle(),
        relay.clone(),
        RecordingSink::offline(),
    );
    let cycle = s.poll(0);
    assert_eq!(cycle.state, GuardState::Cutoff);
    assert_eq!(cycle.alerts.len(), 1);
    assert_eq!(s.sink().attempts, 0);
    assert_eq!(s.dispatch_stats().last_error, Some(DeliveryError::NetworkDown));
    assert_eq!(relay.level(), Some(false));
}

#[test]
fn error_status_codes_count_as_delivered() {
    let cfg = FenceConfig::default();
    let mut sink = RecordingSink::new();
    sink.status = 500;
    let mut s = service(ScriptedAdc::volts(&[90.0], &cfg), ScriptedLine::tamper_idle(), RecordingPin::new(), sink);
    s.poll(0);
    let stats = s.dispatch_stats();
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.last_status, Some(500));
}

#[test]
fn one_cycle_can_raise_all_three_alerts_in_order() {
    let cfg = FenceConfig {
        heartbeat_interval_ms: 500,
        ..FenceConfig::default()
    };
    let tamper = ScriptedLine::new(false);
    let mut s = GuardService::new(
        cfg.clone(),
        ScriptedAdc::volts(&[30.0, 90.0], &cfg),
        tamper,
        RecordingPin::new(),
        RecordingSink::new(),
        0,
    );
    s.start().unwrap();
    s.poll(0);
    let cycle = s.poll(1500);
    let order: Vec<_> = cycle.alerts.iter().map(|a| a.message.as_str().to_owned()).collect();
    assert_eq!(order, vec![MSG_HIGH_VOLTAGE, MSG_TAMPER, MSG_HEARTBEAT]);
}
