//! Reactor events and their delivery.
//!
//! Events are queued during a tick and flushed once at the end of it: the
//! monitor drains the queue, then each event is fanned out to external
//! subscribers over unbounded channels. Subscribers whose receiver has been
//! dropped are pruned on the next flush.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::fuel_rod::{FuelRodFlags, FuelRodState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReactorEvent {
    /// One actual fuel-rod transition.
    FuelRodStateChanged {
        index: usize,
        from: FuelRodState,
        to: FuelRodState,
        flags: FuelRodFlags,
    },
    FuelAssemblyInserted { rows: usize, columns: usize },
    FuelAssemblyDestroyed,
}

#[derive(Debug, Default)]
pub struct EventBus {
    pending: Vec<ReactorEvent>,
    subscribers: Vec<UnboundedSender<ReactorEvent>>,
}

impl EventBus {
    pub fn publish(&mut self, event: ReactorEvent) {
        self.pending.push(event);
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<ReactorEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn take_subscribers(&mut self) -> Vec<UnboundedSender<ReactorEvent>> {
        std::mem::take(&mut self.subscribers)
    }

    pub fn adopt_subscribers(&mut self, subscribers: Vec<UnboundedSender<ReactorEvent>>) {
        self.subscribers.extend(subscribers);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn pending(&self) -> &[ReactorEvent] {
        &self.pending
    }

    /// Take the queued events and forward each to every live subscriber.
    pub fn flush(&mut self) -> Vec<ReactorEvent> {
        let events = std::mem::take(&mut self.pending);
        if !events.is_empty() {
            self.subscribers.retain(|tx| {
                events.iter().all(|event| tx.send(event.clone()).is_ok())
            });
        }
        events
    }
}
