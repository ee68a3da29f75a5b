//! Main loop, termination signal and exit cleanup.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{info, warn};
use vss_common::consts::{HEARTBEAT_MESSAGE, going_down_message};

use crate::safety::SafetyController;

/// One-shot termination flag that wakes the main loop.
#[derive(Default)]
pub struct ShutdownSignal {
    triggered: Mutex<bool>,
    cv: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        *self.triggered.lock() = true;
        self.cv.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.triggered.lock()
    }

    /// Block for up to `timeout`. Returns `true` once triggered.
    ///
    /// A timeout past the representable clock range waits for the trigger only.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut triggered = self.triggered.lock();
        while !*triggered {
            match deadline {
                Some(deadline) => {
                    if self.cv.wait_until(&mut triggered, deadline).timed_out() {
                        break;
                    }
                }
                None => self.cv.wait(&mut triggered),
            }
        }
        *triggered
    }
}

/// Heartbeat loop. Edge handling happens on driver threads meanwhile.
pub struct Supervisor {
    heartbeat: Duration,
    signal: Arc<ShutdownSignal>,
}

impl Supervisor {
    pub fn new(heartbeat: Duration, signal: Arc<ShutdownSignal>) -> Self {
        Self { heartbeat, signal }
    }

    /// Run until the signal is triggered. Returns the number of heartbeats.
    pub fn run(&self) -> u64 {
        let mut beats = 0;
        loop {
            info!("{HEARTBEAT_MESSAGE}");
            beats += 1;
            if self.signal.wait_timeout(self.heartbeat) {
                info!("Termination requested");
                return beats;
            }
        }
    }
}

/// Exit cleanup: "going down" alert, then release every channel.
///
/// Runs once, either explicitly through [`run`](Self::run) or on drop, so an
/// early return or unwinding panic still releases the header.
pub struct Finalizer {
    controller: Arc<SafetyController>,
    done: bool,
}

impl Finalizer {
    pub fn new(controller: Arc<SafetyController>) -> Self {
        Self {
            controller,
            done: false,
        }
    }

    pub fn run(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        let msg = going_down_message(self.controller.alerts().experiment());
        warn!("{msg}");
        self.controller.alerts().send(&msg);
        self.controller.io().release_all();
        info!("I/O released");
    }
}

impl Drop for Finalizer {
    fn drop(&mut self) {
        self.run();
    }
}
