//! Shared rig for the integration tests.

mod alerts;
mod concurrency;
mod scenarios;

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use vss_common::config::VssConfig;
use vss_common::io::Channel;
use vss_controller::alert::{AlertDeliveryError, Notifier};
use vss_controller::error::StartupError;
use vss_controller::{Bootstrap, SafetyController};
use vss_hal::SimulatedIo;

// Rev2 header pin → BCM channel for the standard rig.
pub const RELAY_A: Channel = Channel(4); // pin 7, shutdown + warning
pub const RELAY_B: Channel = Channel(14); // pin 8, warning only
pub const TURBO: Channel = Channel(17); // pin 11
pub const GAUGE: Channel = Channel(18); // pin 12
pub const LED: Channel = Channel(22); // pin 15
pub const RESET: Channel = Channel(23); // pin 16

pub fn rig_toml(email_enabled: bool) -> String {
    format!(
        r#"
[general]
experiment_name = "Cluster"
revision = "rev2"
debounce_ms = 2000

[operators]
alice = "alice@example.org"

[email]
enabled = {email_enabled}

[relay.A]
pin = 7
name = "A"
warning = true
shutdown = true
active = true

[relay.B]
pin = 8
name = "Load lock"
warning = true
shutdown = false
active = true

[relay.C]
active = false
[relay.D]
active = false
[relay.E]
active = false
[relay.F]
active = false

[shutdown]
turbo = 11
gauge = 12

[error_led]
pin = 15

[reset_button]
pin = 16
"#
    )
}

/// Transport stub that records every delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    pub bodies: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.bodies.lock().len()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(
        &self,
        _recipients: &[String],
        _subject: &str,
        _from_identity: &str,
        body: &str,
    ) -> Result<(), AlertDeliveryError> {
        self.bodies.lock().push(body.to_string());
        if self.fail {
            Err(AlertDeliveryError("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

/// A started controller on the simulation driver.
pub struct Rig {
    pub sim: Arc<SimulatedIo>,
    pub notifier: Arc<RecordingNotifier>,
    pub controller: Arc<SafetyController>,
    clock: Mutex<Instant>,
}

impl Rig {
    /// Start with both relays reading safe.
    pub fn start(email_enabled: bool) -> Self {
        Self::start_with(&rig_toml(email_enabled), RecordingNotifier::default())
    }

    pub fn start_with(toml_str: &str, notifier: RecordingNotifier) -> Self {
        let sim = Arc::new(SimulatedIo::new());
        sim.set_input(RELAY_A, true);
        sim.set_input(RELAY_B, true);
        let notifier = Arc::new(notifier);
        let controller = try_start(toml_str, &sim, &notifier).expect("startup");
        Self {
            sim,
            notifier,
            controller,
            clock: Mutex::new(Instant::now()),
        }
    }

    /// Full button press, spaced beyond the debounce window from the last one.
    pub fn press_reset(&self) {
        let mut clock = self.clock.lock();
        *clock += Duration::from_secs(3);
        self.sim.set_input_at(RESET, true, *clock);
        self.sim
            .set_input_at(RESET, false, *clock + Duration::from_millis(100));
    }

    pub fn switches(&self) -> (Option<bool>, Option<bool>) {
        (self.sim.output_level(TURBO), self.sim.output_level(GAUGE))
    }

    pub fn led(&self) -> Option<bool> {
        self.sim.output_level(LED)
    }
}

pub fn try_start(
    toml_str: &str,
    sim: &Arc<SimulatedIo>,
    notifier: &Arc<RecordingNotifier>,
) -> Result<Arc<SafetyController>, StartupError> {
    let config = VssConfig::from_toml(toml_str).expect("parse");
    Bootstrap::new(&config, sim.clone())
        .with_transport(notifier.clone())
        .run()
}
