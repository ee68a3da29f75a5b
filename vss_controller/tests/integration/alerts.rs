//! Integration test: alert delivery, escalation and exit cleanup.

use vss_common::io::Channel;
use vss_controller::SafetyState;
use vss_controller::alert::{AlertDeliveryError, Notifier};
use vss_controller::supervisor::Finalizer;

use super::*;

/// Records the switch levels seen at each delivery.
struct OutputProbe {
    sim: Arc<SimulatedIo>,
    seen: Mutex<Vec<(String, Option<bool>)>>,
}

impl Notifier for OutputProbe {
    fn deliver(
        &self,
        _recipients: &[String],
        _subject: &str,
        _from_identity: &str,
        body: &str,
    ) -> Result<(), AlertDeliveryError> {
        self.seen
            .lock()
            .push((body.to_string(), self.sim.output_level(TURBO)));
        Ok(())
    }
}

#[test]
fn power_is_cut_before_warning_is_sent() {
    let sim = Arc::new(SimulatedIo::new());
    sim.set_input(RELAY_A, true);
    sim.set_input(RELAY_B, true);
    let probe = Arc::new(OutputProbe {
        sim: Arc::clone(&sim),
        seen: Mutex::new(Vec::new()),
    });
    let config = VssConfig::from_toml(&rig_toml(true)).unwrap();
    let controller = Bootstrap::new(&config, sim.clone())
        .with_transport(probe.clone())
        .run()
        .unwrap();
    controller.on_confirm().unwrap();
    assert_eq!(sim.output_level(TURBO), Some(true));

    sim.set_input(RELAY_A, false);

    let seen = probe.seen.lock();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].0.starts_with("Emergency shutdown"));
    assert!(seen[1].0.contains("WARNING"));
    assert!(seen.iter().all(|(_, turbo)| *turbo == Some(false)));
}

#[test]
fn disabled_notification_never_reaches_transport() {
    let rig = Rig::start(false);
    rig.sim.set_input(RELAY_B, false); // warning
    rig.press_reset(); // refused
    rig.sim.set_input(RELAY_B, true);
    rig.press_reset(); // armed
    rig.sim.set_input(RELAY_A, false); // trip
    rig.controller.alerts().send("manual");
    Finalizer::new(Arc::clone(&rig.controller)).run();

    assert_eq!(rig.notifier.calls(), 0);
}

#[test]
fn failed_delivery_lights_indicator() {
    let rig = Rig::start_with(&rig_toml(true), RecordingNotifier::failing());
    rig.press_reset();
    assert_eq!(rig.led(), Some(false));

    rig.controller.alerts().send("test alert");

    assert_eq!(rig.notifier.calls(), 1);
    assert_eq!(rig.led(), Some(true));
    // Escalation only touches the indicator.
    assert_eq!(rig.switches(), (Some(true), Some(true)));
    assert_eq!(rig.controller.state(), SafetyState::Armed);
}

#[test]
fn escalation_only_asserts_indicator() {
    let rig = Rig::start(true);
    rig.press_reset();
    rig.sim.clear_writes();

    rig.controller.escalate();

    assert_eq!(rig.sim.writes(), vec![(LED, true)]);
    assert_eq!(rig.controller.state(), SafetyState::Armed);
    assert_eq!(rig.notifier.calls(), 0);
}

#[test]
fn failed_delivery_does_not_block_trip() {
    let rig = Rig::start_with(&rig_toml(true), RecordingNotifier::failing());
    rig.press_reset();

    rig.sim.set_input(RELAY_A, false);

    assert_eq!(rig.switches(), (Some(false), Some(false)));
    assert_eq!(rig.controller.state(), SafetyState::Tripped);
    // Shutdown and warning alert each tried once, no retry.
    assert_eq!(rig.notifier.calls(), 2);
}

#[test]
fn finalizer_alerts_then_releases_once() {
    let rig = Rig::start(true);
    {
        let mut finalizer = Finalizer::new(Arc::clone(&rig.controller));
        finalizer.run();
        assert!(rig.sim.is_released());
    }

    assert_eq!(
        rig.notifier.bodies(),
        vec!["An exception occurred or the program has been terminated. VSS on Cluster is going down."]
    );
    assert!(rig.sim.subscriptions().is_empty());
    assert!(!rig.sim.set_input(RELAY_A, false));
}

#[test]
fn finalizer_runs_on_drop() {
    let rig = Rig::start(true);
    drop(Finalizer::new(Arc::clone(&rig.controller)));
    assert!(rig.sim.is_released());
    assert_eq!(rig.notifier.calls(), 1);
}

#[test]
fn trip_alert_names_the_relay_on_its_channel() {
    let rig = Rig::start(true);
    assert_eq!(rig.controller.registry().relay_for(RELAY_B).unwrap().name, "Load lock");
    assert!(rig.controller.registry().relay_for(Channel(5)).is_none());

    rig.controller.on_warning(RELAY_B).unwrap();
    assert_eq!(
        rig.notifier.bodies(),
        vec!["Cluster WARNING: relay Load lock reported high pressure."]
    );
}
