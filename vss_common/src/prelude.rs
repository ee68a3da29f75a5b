//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use vss_common::prelude::*;` and get
//! the most important types without listing individual paths.
//!
//! # Usage
//!
//! ```rust
//! use vss_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, VssConfig};

// ─── I/O ────────────────────────────────────────────────────────────
pub use crate::io::{
    Channel, ConfigIssue, Debouncer, ErrorReport, IssueKind, RelayConfig, RelayRegistry,
    RelaySlot, TripAction,
};

// ─── Driver contract ────────────────────────────────────────────────
pub use crate::hal::{DigitalIo, DriverFactory, Edge, EdgeHandler, HalError};
