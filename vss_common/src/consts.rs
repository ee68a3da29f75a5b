//! System-wide defaults and operator-facing message texts.

/// Default heartbeat interval of the supervisor loop [s].
pub const DEFAULT_HEARTBEAT_SECS: u64 = 3600;

/// Longest accepted heartbeat interval [s] (one year).
pub const MAX_HEARTBEAT_SECS: u64 = 365 * 24 * 3600;

/// Default reset-button debounce window [ms].
pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;

/// Default SMTP submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Input level reported by a relay contact when pressure is within limits.
pub const RELAY_SAFE_LEVEL: bool = true;

/// Heartbeat log line emitted by the supervisor loop.
pub const HEARTBEAT_MESSAGE: &str = "VSS status is good. Going to sleep.";

/// Logged after a successful confirmation.
pub const STARTUP_COMPLETE_MESSAGE: &str = "Startup complete.";

/// Logged and alerted after a refused confirmation.
pub const STARTUP_FAILED_MESSAGE: &str = "Startup failed. Check all pressures.";

/// Alert sent before the process stops on a configuration failure.
pub const CONFIG_FAILURE_MESSAGE: &str = "Configuration failure. Stopping.";

/// Alert text for an emergency shutdown.
pub fn trip_message(experiment: &str, relay_name: &str) -> String {
    format!(
        "Emergency shutdown of {experiment}, because relay {relay_name} reported high pressure."
    )
}

/// Alert text for a warning-only relay.
pub fn warning_message(experiment: &str, relay_name: &str) -> String {
    format!("{experiment} WARNING: relay {relay_name} reported high pressure.")
}

/// Alert text sent by the finalizer when the process goes down.
pub fn going_down_message(experiment: &str) -> String {
    format!(
        "An exception occurred or the program has been terminated. VSS on {experiment} is going down."
    )
}

/// Subject line of every notification.
pub fn alert_subject(experiment: &str) -> String {
    format!("{experiment} Vacuum System Warning")
}
