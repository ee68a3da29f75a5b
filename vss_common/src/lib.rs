//! VSS Common Library
//!
//! Shared types for the vacuum safety system workspace.
//!
//! # Module Structure
//!
//! - [`config`] - TOML configuration surface and loader
//! - [`consts`] - System-wide defaults and message texts
//! - [`io`] - Channel map, relay model, registry and validation report
//! - [`hal`] - Digital I/O driver contract
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use vss_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod io;
pub mod prelude;
