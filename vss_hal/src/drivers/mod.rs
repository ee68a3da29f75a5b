//! I/O driver implementations.
//!
//! - [`simulation`] - In-memory driver for development and testing
//! - [`rpi`] - Raspberry Pi GPIO driver (`gpio` feature)
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `DigitalIo` trait from `vss_common::hal::driver`
//! 3. Register the driver in [`register_all_drivers`]

#[cfg(feature = "gpio")]
pub mod rpi;
pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register every driver compiled into this build.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register("simulation", simulation::create_driver);

    #[cfg(feature = "gpio")]
    registry.register("rpi", rpi::create_driver);
}
