//! Shutdown switch and error indicator outputs.
//!
//! Switch outputs: low = power cut (safe), high = power enabled.
//! Indicator: high = alarm visible. Every operation is idempotent.

use std::sync::Arc;

use tracing::{debug, error};
use vss_common::hal::{DigitalIo, HalError};
use vss_common::io::{Channel, RelayRegistry};

pub struct ShutdownActuator {
    io: Arc<dyn DigitalIo>,
    switches: Vec<(String, Channel)>,
    indicator: Option<Channel>,
}

impl ShutdownActuator {
    pub fn new(io: Arc<dyn DigitalIo>, registry: &RelayRegistry) -> Self {
        Self {
            io,
            switches: registry.switches().to_vec(),
            indicator: registry.indicator(),
        }
    }

    /// Drive every shutdown switch low.
    ///
    /// A failing switch does not stop the others; the first error is returned.
    pub fn cut_power(&self) -> Result<(), HalError> {
        debug!("Cutting power");
        self.drive_switches(false)
    }

    /// Drive every shutdown switch high.
    pub fn restore_power(&self) -> Result<(), HalError> {
        debug!("Restoring power");
        self.drive_switches(true)
    }

    pub fn set_indicator(&self, on: bool) -> Result<(), HalError> {
        match self.indicator {
            Some(ch) => self.io.write_level(ch, on),
            None => Ok(()),
        }
    }

    fn drive_switches(&self, level: bool) -> Result<(), HalError> {
        let mut first_err = None;
        for (name, ch) in &self.switches {
            if let Err(e) = self.io.write_level(*ch, level) {
                error!(switch = %name, channel = %ch, level, "Switch write failed: {e}");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
