// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only communication log with query and processed-marking (spec §4.3).
//!
//! Delivery is at-least-once in notification (via the broadcast channel,
//! used to wake the Supervisor Loop and feed the dashboard) and
//! exactly-once in the log (the State Store).

use apmas_core::{AgentMessage, Clock, MessageId, Role, SupervisorError};
use apmas_storage::StateStore;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Bound on the broadcast channel; a lagging subscriber misses old
/// notifications but the log itself (the store) never loses anything.
const CHANNEL_CAPACITY: usize = 256;

pub struct MessageBus<C: Clock> {
    store: Arc<StateStore>,
    clock: C,
    notify: broadcast::Sender<AgentMessage>,
}

impl<C: Clock> MessageBus<C> {
    pub fn new(store: Arc<StateStore>, clock: C) -> Self {
        let (notify, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { store, clock, notify }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentMessage> {
        self.notify.subscribe()
    }

    /// Assigns a fresh id/timestamp if unset, persists, and notifies
    /// subscribers.
    pub fn publish(&self, mut message: AgentMessage) -> Result<AgentMessage, SupervisorError> {
        if message.timestamp_ms == 0 {
            message.timestamp_ms = self.clock.epoch_ms();
        }
        self.store
            .append_message(message.clone())
            .map_err(|e| SupervisorError::StorageError(e.to_string()))?;
        let _ = self.notify.send(message.clone());
        Ok(message)
    }

    /// Messages addressed to `role` (directly, or via the "all" broadcast
    /// recipient) that have not yet been marked processed.
    pub fn unprocessed_for(&self, role: &Role) -> Vec<AgentMessage> {
        self.store.unprocessed_messages_for(role)
    }

    /// Idempotent: marking an already-processed message is a no-op.
    pub fn mark_processed(&self, id: MessageId, at_ms: u64) -> Result<(), SupervisorError> {
        let Some(message) = self.store.message(&id) else {
            return Err(SupervisorError::NotFound(format!("message {id} not found")));
        };
        if message.is_processed() {
            return Ok(());
        }
        self.store
            .mark_message_processed(id, at_ms)
            .map_err(|e| SupervisorError::StorageError(e.to_string()))
    }
}

#[cfg(test)]
#[path = "message_bus_tests.rs"]
mod tests;
