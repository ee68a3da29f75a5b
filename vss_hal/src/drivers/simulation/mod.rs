//! Simulation driver module.
//!
//! Software stand-in for the GPIO header. Inputs are driven by the caller
//! through [`SimulatedIo::set_input`]; every output write is recorded so the
//! sequence of actuator operations can be inspected.

mod driver;

pub use driver::SimulatedIo;

use std::sync::Arc;
use vss_common::hal::{DigitalIo, HalError};

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Result<Arc<dyn DigitalIo>, HalError> {
    Ok(Arc::new(SimulatedIo::new()))
}
