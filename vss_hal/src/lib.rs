//! # VSS HAL Library
//!
//! Digital I/O drivers behind the `DigitalIo` trait defined in
//! `vss_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations
//!
//! # Drivers
//!
//! | Name         | Feature | Backend                          |
//! |--------------|---------|----------------------------------|
//! | `simulation` | -       | In-memory levels, injected edges |
//! | `rpi`        | `gpio`  | Raspberry Pi GPIO via `rppal`    |

pub mod driver_registry;
pub mod drivers;

pub use driver_registry::DriverRegistry;
pub use drivers::simulation::SimulatedIo;
