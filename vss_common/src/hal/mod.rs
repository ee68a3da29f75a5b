//! Digital I/O driver contract.
//!
//! Drivers live in `vss_hal`; the controller only sees [`DigitalIo`].

pub mod driver;

pub use driver::{DigitalIo, DriverFactory, Edge, EdgeHandler, HalError};
