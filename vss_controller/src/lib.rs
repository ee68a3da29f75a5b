//! # VSS Controller
//!
//! Safety interlock for a vacuum apparatus. Pressure-gauge relays are watched
//! for falling edges; a trip cuts power to every shutdown switch, lights the
//! error indicator and alerts the operators. Power comes back only after the
//! operator presses the reset button and every active relay reads safe.
//!
//! # Module Structure
//!
//! - [`bootstrap`] - Validated, fail-closed startup sequence
//! - [`safety`] - Trip, warning and confirmation algorithms
//! - [`state`] - Operating state machine
//! - [`dispatch`] - Edge handler registration
//! - [`actuator`] - Shutdown switch and indicator outputs
//! - [`alert`] - Best-effort operator notification
//! - [`supervisor`] - Heartbeat loop, termination signal, exit cleanup
//! - [`error`] - Error types
//!
//! # Flow
//!
//! ```text
//!  relay ──falling edge──► dispatch ──► SafetyController::on_trip ──► actuator
//!                                   └─► SafetyController::on_warning     │
//!  reset ──rising edge (debounced)──► SafetyController::on_confirm       ▼
//!                                                                  AlertGateway
//! ```

pub mod actuator;
pub mod alert;
pub mod bootstrap;
pub mod dispatch;
pub mod error;
pub mod safety;
pub mod state;
pub mod supervisor;

pub use bootstrap::Bootstrap;
pub use safety::SafetyController;
pub use state::SafetyState;
