//! Integration test: trip, warning and confirmation lifecycle.

use std::time::{Duration, Instant};

use vss_common::io::{Channel, IssueKind};
use vss_controller::SafetyState;
use vss_controller::error::{ControllerError, StartupError};

use super::*;

#[test]
fn startup_is_fail_closed() {
    let rig = Rig::start(true);
    assert_eq!(rig.controller.state(), SafetyState::Startup);
    assert_eq!(rig.switches(), (Some(false), Some(false)));
    assert_eq!(rig.led(), Some(true));
    assert_eq!(rig.sim.inputs(), vec![RELAY_A, RELAY_B, RESET]);
    assert_eq!(rig.notifier.calls(), 0);
}

#[test]
fn relay_trip_cuts_power_and_alerts() {
    let rig = Rig::start(true);
    rig.press_reset();
    assert_eq!(rig.controller.state(), SafetyState::Armed);

    rig.sim.set_input(RELAY_A, false);

    assert_eq!(rig.switches(), (Some(false), Some(false)));
    assert_eq!(rig.led(), Some(true));
    assert_eq!(rig.controller.state(), SafetyState::Tripped);

    let bodies = rig.notifier.bodies();
    assert_eq!(
        bodies,
        vec![
            "Emergency shutdown of Cluster, because relay A reported high pressure.",
            "Cluster WARNING: relay A reported high pressure.",
        ]
    );
}

#[test]
fn reset_with_all_relays_safe_arms() {
    let rig = Rig::start(true);
    rig.press_reset();

    assert_eq!(rig.switches(), (Some(true), Some(true)));
    assert_eq!(rig.led(), Some(false));
    assert_eq!(rig.controller.state(), SafetyState::Armed);
    assert_eq!(rig.notifier.calls(), 0);
}

#[test]
fn reset_with_unsafe_relay_is_refused() {
    let rig = Rig::start(true);
    rig.sim.set_input(RELAY_B, false);
    let before = rig.notifier.calls();

    rig.press_reset();

    assert_eq!(rig.switches(), (Some(false), Some(false)));
    assert_eq!(rig.controller.state(), SafetyState::Startup);
    let bodies = rig.notifier.bodies();
    assert_eq!(bodies.len(), before + 1);
    assert_eq!(bodies.last().unwrap(), "Startup failed. Check all pressures.");
}

#[test]
fn unknown_revision_stops_before_any_io() {
    let sim = Arc::new(SimulatedIo::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let toml_str = rig_toml(true).replace("rev2", "rev3");

    let err = try_start(&toml_str, &sim, &notifier).unwrap_err();
    let report = match err {
        StartupError::Configuration(report) => report,
        other => panic!("expected configuration error, got {other}"),
    };
    assert!(report.contains(IssueKind::UnknownRevision));

    assert!(sim.inputs().is_empty());
    assert!(sim.subscriptions().is_empty());
    assert!(sim.writes().is_empty());
    assert_eq!(sim.output_level(TURBO), None);

    let bodies = notifier.bodies();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].starts_with("Configuration failure. Stopping."));
}

#[test]
fn disabled_notification_trip_is_log_only() {
    let rig = Rig::start(false);
    rig.press_reset();
    rig.sim.set_input(RELAY_A, false);

    assert_eq!(rig.controller.state(), SafetyState::Tripped);
    assert_eq!(rig.notifier.calls(), 0);
}

#[test]
fn warning_only_relay_keeps_power() {
    let rig = Rig::start(true);
    rig.press_reset();

    rig.sim.set_input(RELAY_B, false);

    assert_eq!(rig.switches(), (Some(true), Some(true)));
    assert_eq!(rig.led(), Some(true));
    assert_eq!(rig.controller.state(), SafetyState::Armed);
    assert_eq!(
        rig.notifier.bodies(),
        vec!["Cluster WARNING: relay Load lock reported high pressure."]
    );
}

#[test]
fn recovery_after_trip_requires_safe_pressure() {
    let rig = Rig::start(true);
    rig.press_reset();
    rig.sim.set_input(RELAY_A, false);
    assert_eq!(rig.controller.state(), SafetyState::Tripped);

    rig.press_reset();
    assert_eq!(rig.controller.state(), SafetyState::Tripped);
    assert_eq!(rig.switches(), (Some(false), Some(false)));

    rig.sim.set_input(RELAY_A, true);
    rig.press_reset();
    assert_eq!(rig.controller.state(), SafetyState::Armed);
    assert_eq!(rig.switches(), (Some(true), Some(true)));
    assert_eq!(rig.led(), Some(false));
}

#[test]
fn confirm_is_idempotent() {
    let rig = Rig::start(true);
    assert_eq!(rig.controller.on_confirm().unwrap(), SafetyState::Armed);
    let writes = rig.sim.writes().len();

    assert_eq!(rig.controller.on_confirm().unwrap(), SafetyState::Armed);
    assert_eq!(rig.controller.on_confirm().unwrap(), SafetyState::Armed);
    assert_eq!(rig.switches(), (Some(true), Some(true)));
    assert_eq!(rig.led(), Some(false));

    // Each confirm re-drives the same levels.
    let all = rig.sim.writes();
    assert_eq!(all[writes..writes + 3], all[writes + 3..writes + 6]);
}

#[test]
fn unreadable_relay_counts_as_unsafe() {
    let rig = Rig::start(true);
    rig.sim.fail_reads(RELAY_B);

    assert_eq!(rig.controller.on_confirm().unwrap(), SafetyState::Startup);
    assert_eq!(rig.switches(), (Some(false), Some(false)));
}

#[test]
fn output_failure_during_confirm_stays_fail_closed() {
    let rig = Rig::start(true);
    rig.sim.fail_writes(TURBO);
    rig.sim.clear_writes();

    let err = rig.controller.on_confirm().unwrap_err();
    assert!(matches!(err, ControllerError::Hal(_)), "{err}");

    // Gauge was briefly enabled, then cut again with the turbo write refused.
    assert_eq!(
        rig.sim.writes(),
        vec![(GAUGE, true), (GAUGE, false), (LED, true)]
    );
    assert_eq!(rig.sim.output_level(GAUGE), Some(false));
    assert_eq!(rig.led(), Some(true));
    assert_eq!(rig.controller.state(), SafetyState::Startup);
    assert_eq!(
        rig.notifier.bodies(),
        vec!["Startup failed. Check all pressures."]
    );
}

#[test]
fn trip_on_unknown_channel_still_cuts_power() {
    let rig = Rig::start(true);
    rig.press_reset();

    let err = rig.controller.on_trip(Channel(9)).unwrap_err();
    assert!(matches!(err, ControllerError::UnknownChannel(Channel(9))));
    assert_eq!(rig.switches(), (Some(false), Some(false)));
    assert_eq!(rig.led(), Some(true));
    assert_eq!(rig.controller.state(), SafetyState::Tripped);
    assert_eq!(rig.notifier.calls(), 0);
}

#[test]
fn reset_press_within_debounce_is_ignored() {
    let rig = Rig::start(true);
    let t0 = Instant::now();

    // Accepted.
    assert!(rig.sim.set_input_at(RESET, true, t0));
    assert_eq!(rig.controller.state(), SafetyState::Armed);

    rig.sim.set_input(RELAY_A, false);
    rig.sim.set_input(RELAY_A, true);
    assert_eq!(rig.controller.state(), SafetyState::Tripped);

    // Bounce inside the window: suppressed.
    rig.sim.set_input_at(RESET, false, t0 + Duration::from_millis(50));
    assert!(!rig.sim.set_input_at(RESET, true, t0 + Duration::from_millis(900)));
    assert_eq!(rig.controller.state(), SafetyState::Tripped);

    // After the window: accepted.
    rig.sim.set_input_at(RESET, false, t0 + Duration::from_millis(2100));
    assert!(rig.sim.set_input_at(RESET, true, t0 + Duration::from_millis(2200)));
    assert_eq!(rig.controller.state(), SafetyState::Armed);
}
