//! I/O driver trait and error types.
//!
//! This module defines:
//! - `DigitalIo` trait - Interface for pluggable digital I/O drivers
//! - `HalError` enum - Error types for driver operations
//! - `DriverFactory` type alias - Factory function type
//! - `Edge` / `EdgeHandler` - Edge subscription types

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::io::Channel;

/// Error types for I/O driver operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// A channel could not be configured
    #[error("Cannot configure {channel}: {reason}")]
    Setup { channel: Channel, reason: String },

    /// Hardware communication error
    #[error("I/O error on {channel}: {reason}")]
    Io { channel: Channel, reason: String },

    /// Channel used before being configured in the required direction
    #[error("{0} is not configured for this operation")]
    NotConfigured(Channel),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

/// Signal transition direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Low → high.
    Rising,
    /// High → low.
    Falling,
}

/// Callback invoked with the channel that changed.
pub type EdgeHandler = Box<dyn Fn(Channel) + Send + Sync>;

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Result<Arc<dyn DigitalIo>, HalError>;

/// Trait defining the interface for digital I/O drivers.
///
/// Levels are plain booleans: `true` = high. Handlers registered with
/// [`on_edge`](DigitalIo::on_edge) may be called from driver-owned threads
/// and concurrently with each other.
///
/// # Lifecycle
///
/// 1. `configure_output()` / `configure_input()` - once per channel at startup
/// 2. `on_edge()` - once per monitored input
/// 3. `read_level()` / `write_level()` - any time after configuration
/// 4. `release_all()` - on process exit; the driver returns every channel to
///    its power-on state
pub trait DigitalIo: Send + Sync {
    /// Returns the driver's unique identifier (e.g., "simulation", "rpi").
    fn name(&self) -> &'static str;

    /// Claim `channel` as an input.
    fn configure_input(&self, channel: Channel) -> Result<(), HalError>;

    /// Claim `channel` as an output. The initial level is low.
    fn configure_output(&self, channel: Channel) -> Result<(), HalError>;

    /// Current level of an input or output.
    fn read_level(&self, channel: Channel) -> Result<bool, HalError>;

    /// Drive an output.
    fn write_level(&self, channel: Channel, level: bool) -> Result<(), HalError>;

    /// Subscribe to `edge` transitions on an input.
    ///
    /// With `debounce`, a transition arriving within the window of the last
    /// delivered one is dropped. One subscription per channel.
    fn on_edge(
        &self,
        channel: Channel,
        edge: Edge,
        debounce: Option<Duration>,
        handler: EdgeHandler,
    ) -> Result<(), HalError>;

    /// Drop every subscription and release every claimed channel.
    fn release_all(&self);
}
