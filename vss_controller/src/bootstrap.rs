//! Startup sequence.
//!
//! 1. Resolve the registry and the alert gateway, collecting every problem.
//! 2. Any problem: log it, send one alert, stop. No channel is touched.
//! 3. Claim outputs, force power off and the indicator on, then claim inputs.
//! 4. Register relay and reset-button handlers, attach them to the driver.
//!
//! Nothing is monitored until every step succeeded.

use std::sync::{Arc, Weak};

use tracing::{error, info, warn};
use vss_common::config::VssConfig;
use vss_common::consts::CONFIG_FAILURE_MESSAGE;
use vss_common::hal::DigitalIo;
use vss_common::io::{ErrorReport, IssueKind, RelayRegistry, TripAction};

use crate::alert::{AlertGateway, Notifier};
use crate::dispatch::EdgeEventDispatcher;
use crate::error::StartupError;
use crate::safety::SafetyController;

/// Check a configuration without touching any hardware.
pub fn validate(config: &VssConfig) -> ErrorReport {
    let (_, mut report) = RelayRegistry::load(config);
    let (_, alerts) = AlertGateway::from_config(config, None);
    report.merge(alerts);
    report
}

/// Builder for a running [`SafetyController`].
pub struct Bootstrap<'a> {
    config: &'a VssConfig,
    io: Arc<dyn DigitalIo>,
    transport: Option<Arc<dyn Notifier>>,
}

impl<'a> Bootstrap<'a> {
    pub fn new(config: &'a VssConfig, io: Arc<dyn DigitalIo>) -> Self {
        Self {
            config,
            io,
            transport: None,
        }
    }

    /// Use `transport` instead of the SMTP transport built from `[email]`.
    pub fn with_transport(mut self, transport: Arc<dyn Notifier>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Run the startup sequence.
    ///
    /// On success the controller is in `Startup` with power cut and every
    /// handler attached; pressing the reset button arms it.
    pub fn run(self) -> Result<Arc<SafetyController>, StartupError> {
        let (registry, mut report) = RelayRegistry::load(self.config);
        let (gateway, alert_report) = AlertGateway::from_config(self.config, self.transport);
        report.merge(alert_report);

        if !report.is_empty() {
            return Err(abort(&gateway, report));
        }

        info!(
            experiment = registry.experiment(),
            revision = ?registry.revision(),
            relays = registry.active_relays().count(),
            switches = registry.switches().len(),
            "Configuration valid"
        );

        let io = self.io;
        let indicator = registry.indicator();

        // Outputs first so power is off before any input is watched.
        let outputs = registry
            .switches()
            .iter()
            .map(|(name, ch)| (format!("shutdown.{name}"), *ch))
            .chain(indicator.map(|ch| ("error_led".to_string(), ch)));
        for (entity, ch) in outputs {
            if let Err(e) = io.configure_output(ch) {
                report.push(entity, IssueKind::IoSetup, e.to_string());
            }
        }

        let registry = Arc::new(registry);
        // Escalation goes through the controller so it takes the interlock lock.
        let controller = Arc::new_cyclic(|weak: &Weak<SafetyController>| {
            let weak = weak.clone();
            let gateway = gateway.with_escalation(move || {
                if let Some(controller) = weak.upgrade() {
                    controller.escalate();
                }
            });
            SafetyController::new(Arc::clone(&registry), Arc::clone(&io), gateway)
        });
        if report.is_empty() {
            if let Err(e) = controller.fail_closed() {
                report.push("outputs", IssueKind::IoSetup, e.to_string());
            }
        }

        let inputs = registry
            .active_relays()
            .map(|r| (format!("relay.{}", r.slot), r.channel))
            .chain(registry.reset_button().map(|ch| ("reset_button".to_string(), ch)));
        for (entity, ch) in inputs {
            if let Err(e) = io.configure_input(ch) {
                report.push(entity, IssueKind::IoSetup, e.to_string());
            }
        }

        if !report.is_empty() {
            let err = abort(controller.alerts(), report);
            io.release_all();
            return Err(err);
        }

        let mut dispatcher = EdgeEventDispatcher::new();
        for relay in registry.active_relays() {
            let actions = relay.trip_actions();
            if actions.is_empty() {
                warn!(relay = %relay.slot, "Relay is active but neither warns nor shuts down");
            }
            for action in actions {
                let c = Arc::clone(&controller);
                match action {
                    TripAction::Shutdown => dispatcher.on_falling_edge(relay.channel, move |ch| {
                        if let Err(e) = c.on_trip(ch) {
                            error!("Trip handling incomplete: {e}");
                        }
                    })?,
                    TripAction::Warn => dispatcher.on_falling_edge(relay.channel, move |ch| {
                        if let Err(e) = c.on_warning(ch) {
                            error!("Warning handling incomplete: {e}");
                        }
                    })?,
                }
            }
        }
        if let Some(button) = registry.reset_button() {
            let c = Arc::clone(&controller);
            dispatcher.on_rising_edge(
                button,
                move |_| {
                    if let Err(e) = c.on_confirm() {
                        error!("Confirmation failed: {e}");
                    }
                },
                self.config.general.debounce_ms,
            )?;
        }

        if let Err(e) = dispatcher.attach(io.as_ref()) {
            io.release_all();
            return Err(e.into());
        }

        info!("Monitoring started; press the reset button to arm");
        Ok(controller)
    }
}

/// Log every problem, send one alert, and wrap the report.
fn abort(gateway: &AlertGateway, report: ErrorReport) -> StartupError {
    for issue in report.iter() {
        error!(entity = %issue.entity, kind = %issue.kind, "{}", issue.message);
    }
    error!("{CONFIG_FAILURE_MESSAGE}");
    gateway.send(&format!("{CONFIG_FAILURE_MESSAGE}\n\n{report}"));
    StartupError::Configuration(report)
}
