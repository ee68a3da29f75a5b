//! Controller error types.

use thiserror::Error;
use vss_common::hal::{Edge, HalError};
use vss_common::io::{Channel, ErrorReport};

/// Runtime anomaly while handling an event. Logged, never fatal.
#[derive(Debug, Clone, Error)]
pub enum ControllerError {
    /// An edge arrived on a channel no active relay owns.
    #[error("no active relay is wired to {0}")]
    UnknownChannel(Channel),

    #[error(transparent)]
    Hal(#[from] HalError),
}

/// Handler registration conflict.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("{channel} already has {existing:?}-edge handlers, cannot add {requested:?}")]
    EdgeConflict {
        channel: Channel,
        existing: Edge,
        requested: Edge,
    },

    #[error("driver refused edge subscription: {0}")]
    Hal(#[from] HalError),
}

/// Startup did not reach the monitoring phase. The process must exit.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Every configuration and I/O setup problem found.
    #[error("configuration invalid:\n{0}")]
    Configuration(ErrorReport),

    #[error("edge dispatch setup failed: {0}")]
    Dispatch(#[from] DispatchError),
}
