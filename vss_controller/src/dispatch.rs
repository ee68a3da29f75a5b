//! Edge event dispatch.
//!
//! Handlers are collected per channel first and attached to the driver in
//! one step. Each channel gets a single driver subscription whose callback
//! runs that channel's handlers in registration order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use vss_common::hal::{DigitalIo, Edge};
use vss_common::io::Channel;

use crate::error::DispatchError;

type Handler = Arc<dyn Fn(Channel) + Send + Sync>;

struct Binding {
    edge: Edge,
    debounce: Option<Duration>,
    handlers: Vec<Handler>,
}

/// Per-channel edge handler table.
#[derive(Default)]
pub struct EdgeEventDispatcher {
    bindings: BTreeMap<Channel, Binding>,
}

impl EdgeEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` on every high → low transition of `channel`.
    pub fn on_falling_edge<F>(&mut self, channel: Channel, handler: F) -> Result<(), DispatchError>
    where
        F: Fn(Channel) + Send + Sync + 'static,
    {
        self.register(channel, Edge::Falling, None, Arc::new(handler))
    }

    /// Run `handler` on low → high transitions of `channel`, dropping any
    /// transition within `debounce_ms` of the last delivered one.
    ///
    /// The first registration on a channel fixes its debounce window.
    pub fn on_rising_edge<F>(
        &mut self,
        channel: Channel,
        handler: F,
        debounce_ms: u64,
    ) -> Result<(), DispatchError>
    where
        F: Fn(Channel) + Send + Sync + 'static,
    {
        let debounce = (debounce_ms > 0).then(|| Duration::from_millis(debounce_ms));
        self.register(channel, Edge::Rising, debounce, Arc::new(handler))
    }

    fn register(
        &mut self,
        channel: Channel,
        edge: Edge,
        debounce: Option<Duration>,
        handler: Handler,
    ) -> Result<(), DispatchError> {
        let binding = self.bindings.entry(channel).or_insert_with(|| Binding {
            edge,
            debounce,
            handlers: Vec::new(),
        });
        if binding.edge != edge {
            return Err(DispatchError::EdgeConflict {
                channel,
                existing: binding.edge,
                requested: edge,
            });
        }
        binding.handlers.push(handler);
        Ok(())
    }

    /// Number of handlers registered on `channel`.
    pub fn handler_count(&self, channel: Channel) -> usize {
        self.bindings.get(&channel).map_or(0, |b| b.handlers.len())
    }

    /// Channels with at least one handler, ascending.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.bindings.keys().copied()
    }

    /// Subscribe every channel on `io`. Consumes the table.
    pub fn attach(self, io: &dyn DigitalIo) -> Result<(), DispatchError> {
        for (channel, binding) in self.bindings {
            let Binding {
                edge,
                debounce,
                handlers,
            } = binding;
            debug!(
                %channel,
                ?edge,
                ?debounce,
                handlers = handlers.len(),
                "Attaching edge handlers"
            );
            io.on_edge(
                channel,
                edge,
                debounce,
                Box::new(move |ch| {
                    for handler in &handlers {
                        handler(ch);
                    }
                }),
            )?;
        }
        Ok(())
    }
}
