//! Safety controller: the trip, warning and confirmation algorithms.
//!
//! Output writes and the state transition of one event happen under a single
//! lock, so concurrent edge callbacks take effect in some serial order. Alerts
//! are sent after the lock is released; a slow or failing transport never
//! delays a power cut.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};
use vss_common::consts::{
    RELAY_SAFE_LEVEL, STARTUP_COMPLETE_MESSAGE, STARTUP_FAILED_MESSAGE, trip_message,
    warning_message,
};
use vss_common::hal::{DigitalIo, HalError};
use vss_common::io::{Channel, RelayRegistry};

use crate::actuator::ShutdownActuator;
use crate::alert::AlertGateway;
use crate::error::ControllerError;
use crate::state::{SafetyEvent, SafetyState, SafetyStateMachine, TransitionResult};

struct Interlock {
    machine: SafetyStateMachine,
    actuator: ShutdownActuator,
}

/// Owns the interlock state. Shared with every edge callback through `Arc`.
pub struct SafetyController {
    registry: Arc<RelayRegistry>,
    io: Arc<dyn DigitalIo>,
    interlock: Mutex<Interlock>,
    alerts: AlertGateway,
}

impl std::fmt::Debug for SafetyController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyController")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl SafetyController {
    pub fn new(registry: Arc<RelayRegistry>, io: Arc<dyn DigitalIo>, alerts: AlertGateway) -> Self {
        let actuator = ShutdownActuator::new(Arc::clone(&io), &registry);
        Self {
            registry,
            io,
            interlock: Mutex::new(Interlock {
                machine: SafetyStateMachine::new(),
                actuator,
            }),
            alerts,
        }
    }

    /// Force the startup output state: power cut, indicator on.
    pub fn fail_closed(&self) -> Result<(), HalError> {
        let lock = self.interlock.lock();
        let cut = lock.actuator.cut_power();
        let led = lock.actuator.set_indicator(true);
        cut.and(led)
    }

    /// A shutdown relay tripped on `channel`.
    ///
    /// Power is cut before the relay is even looked up. An unknown channel
    /// still cuts power but sends no relay-specific alert.
    pub fn on_trip(&self, channel: Channel) -> Result<(), ControllerError> {
        let hal_result = {
            let mut lock = self.interlock.lock();
            let cut = lock.actuator.cut_power();
            let led = lock.actuator.set_indicator(true);
            if let TransitionResult::Changed { from, to } =
                lock.machine.handle_event(SafetyEvent::Trip)
            {
                info!(%from, %to, "Safety state changed");
            }
            cut.and(led)
        };

        let relay = self
            .registry
            .relay_for(channel)
            .ok_or(ControllerError::UnknownChannel(channel))?;

        let msg = trip_message(self.registry.experiment(), &relay.name);
        error!(relay = %relay.slot, %channel, "{msg}");
        self.alerts.send(&msg);

        hal_result.map_err(ControllerError::from)
    }

    /// A warning relay tripped on `channel`. State is kept.
    pub fn on_warning(&self, channel: Channel) -> Result<(), ControllerError> {
        let hal_result = {
            let mut lock = self.interlock.lock();
            let led = lock.actuator.set_indicator(true);
            lock.machine.handle_event(SafetyEvent::Warning);
            led
        };

        let relay = self
            .registry
            .relay_for(channel)
            .ok_or(ControllerError::UnknownChannel(channel))?;

        let msg = warning_message(self.registry.experiment(), &relay.name);
        warn!(relay = %relay.slot, %channel, "{msg}");
        self.alerts.send(&msg);

        hal_result.map_err(ControllerError::from)
    }

    /// Operator pressed the reset button.
    ///
    /// Arms only if every active relay reads safe; otherwise outputs are
    /// left untouched. Returns the resulting state.
    pub fn on_confirm(&self) -> Result<SafetyState, ControllerError> {
        let (state, unsafe_relays, hal_result) = {
            let mut lock = self.interlock.lock();

            let mut unsafe_relays = Vec::new();
            for relay in self.registry.active_relays() {
                match self.io.read_level(relay.channel) {
                    Ok(level) if level == RELAY_SAFE_LEVEL => {}
                    Ok(_) => unsafe_relays.push(relay.name.clone()),
                    Err(e) => {
                        warn!(relay = %relay.slot, "Cannot read relay, treating as unsafe: {e}");
                        unsafe_relays.push(relay.name.clone());
                    }
                }
            }

            if !unsafe_relays.is_empty() {
                let state = lock.machine.handle_event(SafetyEvent::ConfirmFailed).state();
                (state, unsafe_relays, Ok(()))
            } else {
                let armed = lock
                    .actuator
                    .restore_power()
                    .and_then(|()| lock.actuator.set_indicator(false));
                match armed {
                    Ok(()) => {
                        let result = lock.machine.handle_event(SafetyEvent::ConfirmSucceeded);
                        if let TransitionResult::Changed { from, to } = result {
                            info!(%from, %to, "Safety state changed");
                        }
                        (result.state(), unsafe_relays, Ok(()))
                    }
                    Err(e) => {
                        // Never stay half-armed.
                        let _ = lock.actuator.cut_power();
                        let _ = lock.actuator.set_indicator(true);
                        let state = lock.machine.handle_event(SafetyEvent::ConfirmFailed).state();
                        (state, unsafe_relays, Err(e))
                    }
                }
            }
        };

        if let Err(e) = hal_result {
            error!("{STARTUP_FAILED_MESSAGE} Output write failed: {e}");
            self.alerts.send(STARTUP_FAILED_MESSAGE);
            return Err(e.into());
        }

        if unsafe_relays.is_empty() {
            info!("{STARTUP_COMPLETE_MESSAGE}");
        } else {
            warn!(relays = ?unsafe_relays, "{STARTUP_FAILED_MESSAGE}");
            self.alerts.send(STARTUP_FAILED_MESSAGE);
        }
        Ok(state)
    }

    /// Assert the indicator after an alert could not be delivered. State is kept.
    pub fn escalate(&self) {
        let lock = self.interlock.lock();
        if let Err(e) = lock.actuator.set_indicator(true) {
            error!("Cannot assert error indicator: {e}");
        }
    }

    /// Current operating state.
    pub fn state(&self) -> SafetyState {
        self.interlock.lock().machine.state()
    }

    pub fn registry(&self) -> &RelayRegistry {
        &self.registry
    }

    pub fn io(&self) -> &Arc<dyn DigitalIo> {
        &self.io
    }

    pub fn alerts(&self) -> &AlertGateway {
        &self.alerts
    }
}
