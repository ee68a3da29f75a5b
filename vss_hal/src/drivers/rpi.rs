//! Raspberry Pi GPIO driver.
//!
//! Channels are BCM line numbers. Interrupt callbacks run on the per-pin
//! threads `rppal` spawns for asynchronous interrupts. Output and input pins
//! reset to their power-on state when dropped, which is how
//! [`release_all`](DigitalIo::release_all) returns the header to a safe state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use tracing::{debug, info, trace};
use vss_common::hal::{DigitalIo, Edge, EdgeHandler, HalError};
use vss_common::io::{Channel, Debouncer};

/// Factory function to create a GPIO driver instance.
pub fn create_driver() -> Result<Arc<dyn DigitalIo>, HalError> {
    Ok(Arc::new(RpiIo::new()?))
}

/// GPIO header access through `/dev/gpiomem`.
pub struct RpiIo {
    gpio: Gpio,
    inputs: Mutex<HashMap<Channel, InputPin>>,
    outputs: Mutex<HashMap<Channel, OutputPin>>,
}

impl RpiIo {
    pub fn new() -> Result<Self, HalError> {
        let gpio = Gpio::new().map_err(|e| HalError::InitFailed(e.to_string()))?;
        info!("GPIO driver initialized");
        Ok(Self {
            gpio,
            inputs: Mutex::new(HashMap::new()),
            outputs: Mutex::new(HashMap::new()),
        })
    }

    fn setup_error(channel: Channel, e: rppal::gpio::Error) -> HalError {
        HalError::Setup {
            channel,
            reason: e.to_string(),
        }
    }
}

impl DigitalIo for RpiIo {
    fn name(&self) -> &'static str {
        "rpi"
    }

    fn configure_input(&self, channel: Channel) -> Result<(), HalError> {
        let pin = self
            .gpio
            .get(channel.number())
            .map_err(|e| Self::setup_error(channel, e))?
            .into_input();
        self.inputs.lock().insert(channel, pin);
        debug!(%channel, "Input configured");
        Ok(())
    }

    fn configure_output(&self, channel: Channel) -> Result<(), HalError> {
        let pin = self
            .gpio
            .get(channel.number())
            .map_err(|e| Self::setup_error(channel, e))?
            .into_output_low();
        self.outputs.lock().insert(channel, pin);
        debug!(%channel, "Output configured");
        Ok(())
    }

    fn read_level(&self, channel: Channel) -> Result<bool, HalError> {
        if let Some(pin) = self.inputs.lock().get(&channel) {
            return Ok(pin.is_high());
        }
        self.outputs
            .lock()
            .get(&channel)
            .map(OutputPin::is_set_high)
            .ok_or(HalError::NotConfigured(channel))
    }

    fn write_level(&self, channel: Channel, level: bool) -> Result<(), HalError> {
        let mut outputs = self.outputs.lock();
        let pin = outputs
            .get_mut(&channel)
            .ok_or(HalError::NotConfigured(channel))?;
        pin.write(if level { Level::High } else { Level::Low });
        trace!(%channel, level, "Output written");
        Ok(())
    }

    fn on_edge(
        &self,
        channel: Channel,
        edge: Edge,
        debounce: Option<Duration>,
        handler: EdgeHandler,
    ) -> Result<(), HalError> {
        let mut inputs = self.inputs.lock();
        let pin = inputs
            .get_mut(&channel)
            .ok_or(HalError::NotConfigured(channel))?;

        let trigger = match edge {
            Edge::Rising => Trigger::RisingEdge,
            Edge::Falling => Trigger::FallingEdge,
        };
        let mut debouncer = debounce.map(Debouncer::new);
        pin.set_async_interrupt(trigger, move |_level: Level| {
            if let Some(d) = debouncer.as_mut() {
                if !d.accept(Instant::now()) {
                    return;
                }
            }
            handler(channel);
        })
        .map_err(|e| Self::setup_error(channel, e))?;

        debug!(%channel, ?edge, ?debounce, "Edge interrupt registered");
        Ok(())
    }

    fn release_all(&self) {
        let mut inputs = self.inputs.lock();
        for pin in inputs.values_mut() {
            // Errors here only mean no interrupt was set.
            let _ = pin.clear_async_interrupt();
        }
        inputs.clear();
        self.outputs.lock().clear();
        info!("GPIO released");
    }
}
