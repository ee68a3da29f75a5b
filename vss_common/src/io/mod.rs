//! Apparatus I/O model.
//!
//! Physical header pins are resolved to logical [`Channel`]s through the
//! [`channel_map`]. The [`registry`] builds the relay, switch, indicator and
//! reset-button bindings once at startup and accumulates every problem into
//! an [`ErrorReport`]. Immutable after construction.

pub mod channel_map;
pub mod debounce;
pub mod registry;
pub mod relay;
pub mod report;

pub use channel_map::{Channel, ChannelMapError, HardwareRevision};
pub use debounce::Debouncer;
pub use registry::RelayRegistry;
pub use relay::{RelayConfig, RelaySlot, TripAction};
pub use report::{ConfigIssue, ErrorReport, IssueKind};
