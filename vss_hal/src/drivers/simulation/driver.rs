//! Simulation driver implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};
use vss_common::hal::{DigitalIo, Edge, EdgeHandler, HalError};
use vss_common::io::{Channel, Debouncer};

struct Subscription {
    edge: Edge,
    debouncer: Option<Debouncer>,
    handler: Arc<dyn Fn(Channel) + Send + Sync>,
}

#[derive(Default)]
struct SimState {
    inputs: HashMap<Channel, bool>,
    outputs: HashMap<Channel, bool>,
    /// Levels preset before the channel was configured.
    wired: HashMap<Channel, bool>,
    subscriptions: HashMap<Channel, Subscription>,
    writes: Vec<(Channel, bool)>,
    fail_setup: HashSet<Channel>,
    fail_reads: HashSet<Channel>,
    fail_writes: HashSet<Channel>,
    released: bool,
}

/// In-memory digital I/O.
///
/// Edge handlers run on the thread that calls [`set_input`](Self::set_input),
/// after the driver lock has been released.
#[derive(Default)]
pub struct SimulatedIo {
    state: Mutex<SimState>,
}

impl SimulatedIo {
    /// Create a new simulation driver instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive an input to `level`, delivering an edge if one is subscribed.
    ///
    /// Returns `true` if a handler ran.
    pub fn set_input(&self, channel: Channel, level: bool) -> bool {
        self.set_input_at(channel, level, Instant::now())
    }

    /// [`set_input`](Self::set_input) with an explicit timestamp for debounce.
    pub fn set_input_at(&self, channel: Channel, level: bool, now: Instant) -> bool {
        let handler = {
            let mut state = self.state.lock();
            let Some(previous) = state.inputs.get(&channel).copied() else {
                // Not configured yet: remember the wiring level.
                state.wired.insert(channel, level);
                return false;
            };
            state.inputs.insert(channel, level);

            let edge = match (previous, level) {
                (false, true) => Edge::Rising,
                (true, false) => Edge::Falling,
                _ => return false,
            };
            let Some(sub) = state.subscriptions.get_mut(&channel) else {
                return false;
            };
            if sub.edge != edge {
                return false;
            }
            if let Some(debouncer) = sub.debouncer.as_mut() {
                if !debouncer.accept(now) {
                    trace!(%channel, ?edge, "Edge suppressed by debounce");
                    return false;
                }
            }
            Arc::clone(&sub.handler)
        };

        debug!(%channel, level, "Delivering simulated edge");
        handler(channel);
        true
    }

    /// Make `configure_input`/`configure_output` fail for `channel`.
    pub fn fail_setup(&self, channel: Channel) {
        self.state.lock().fail_setup.insert(channel);
    }

    /// Make `read_level` fail for `channel`.
    pub fn fail_reads(&self, channel: Channel) {
        self.state.lock().fail_reads.insert(channel);
    }

    /// Make `write_level` fail for `channel`.
    pub fn fail_writes(&self, channel: Channel) {
        self.state.lock().fail_writes.insert(channel);
    }

    /// Every successful output write, in order.
    pub fn writes(&self) -> Vec<(Channel, bool)> {
        self.state.lock().writes.clone()
    }

    /// Forget the recorded writes.
    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    /// Current level of an output.
    pub fn output_level(&self, channel: Channel) -> Option<bool> {
        self.state.lock().outputs.get(&channel).copied()
    }

    /// Configured inputs, sorted.
    pub fn inputs(&self) -> Vec<Channel> {
        let mut v: Vec<_> = self.state.lock().inputs.keys().copied().collect();
        v.sort_unstable();
        v
    }

    /// Active subscriptions as `(channel, edge, debounce)`, sorted by channel.
    pub fn subscriptions(&self) -> Vec<(Channel, Edge, Option<Duration>)> {
        let state = self.state.lock();
        let mut v: Vec<_> = state
            .subscriptions
            .iter()
            .map(|(ch, sub)| (*ch, sub.edge, sub.debouncer.as_ref().map(Debouncer::window)))
            .collect();
        v.sort_unstable_by_key(|(ch, _, _)| *ch);
        v
    }

    /// Whether `release_all` has run.
    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }
}

impl DigitalIo for SimulatedIo {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn configure_input(&self, channel: Channel) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if state.fail_setup.contains(&channel) {
            return Err(HalError::Setup {
                channel,
                reason: "simulated setup failure".to_string(),
            });
        }
        let level = state.wired.get(&channel).copied().unwrap_or(false);
        state.inputs.insert(channel, level);
        debug!(%channel, level, "Input configured");
        Ok(())
    }

    fn configure_output(&self, channel: Channel) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if state.fail_setup.contains(&channel) {
            return Err(HalError::Setup {
                channel,
                reason: "simulated setup failure".to_string(),
            });
        }
        state.outputs.insert(channel, false);
        debug!(%channel, "Output configured");
        Ok(())
    }

    fn read_level(&self, channel: Channel) -> Result<bool, HalError> {
        let state = self.state.lock();
        if state.fail_reads.contains(&channel) {
            return Err(HalError::Io {
                channel,
                reason: "simulated read failure".to_string(),
            });
        }
        state
            .inputs
            .get(&channel)
            .or_else(|| state.outputs.get(&channel))
            .copied()
            .ok_or(HalError::NotConfigured(channel))
    }

    fn write_level(&self, channel: Channel, level: bool) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if state.fail_writes.contains(&channel) {
            return Err(HalError::Io {
                channel,
                reason: "simulated write failure".to_string(),
            });
        }
        let Some(slot) = state.outputs.get_mut(&channel) else {
            return Err(HalError::NotConfigured(channel));
        };
        *slot = level;
        state.writes.push((channel, level));
        trace!(%channel, level, "Output written");
        Ok(())
    }

    fn on_edge(
        &self,
        channel: Channel,
        edge: Edge,
        debounce: Option<Duration>,
        handler: EdgeHandler,
    ) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if !state.inputs.contains_key(&channel) {
            return Err(HalError::NotConfigured(channel));
        }
        if state.subscriptions.contains_key(&channel) {
            return Err(HalError::Setup {
                channel,
                reason: "edge handler already registered".to_string(),
            });
        }
        state.subscriptions.insert(
            channel,
            Subscription {
                edge,
                debouncer: debounce.map(Debouncer::new),
                handler: Arc::from(handler),
            },
        );
        Ok(())
    }

    fn release_all(&self) {
        let mut state = self.state.lock();
        state.subscriptions.clear();
        state.inputs.clear();
        state.outputs.clear();
        state.released = true;
        debug!("All channels released");
    }
}
