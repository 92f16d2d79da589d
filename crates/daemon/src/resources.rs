// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource Registry: the read-only `apmas://` URI surface (spec §4.8).
//!
//! Reads are served from the State Store with a short in-memory cache so a
//! burst of polling agents doesn't re-serialize the same view repeatedly.

use crate::checkpoint::CheckpointService;
use apmas_core::{Clock, Role, SupervisorError};
use apmas_storage::StateStore;
use apmas_wire::ResourceReadResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const CACHE_TTL: Duration = Duration::from_secs(3);
const DEFAULT_MESSAGE_CAP: usize = 100;

pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: &'static str,
}

struct CacheEntry {
    result: ResourceReadResult,
    cached_at: Instant,
}

pub struct ResourceRegistry<C: Clock> {
    store: Arc<StateStore>,
    checkpoints: Arc<CheckpointService>,
    clock: C,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl<C: Clock> ResourceRegistry<C> {
    pub fn new(store: Arc<StateStore>, checkpoints: Arc<CheckpointService>, clock: C) -> Self {
        Self { store, checkpoints, clock, cache: Mutex::new(HashMap::new()) }
    }

    /// One instance for the project, plus messages/checkpoints/history per
    /// known agent role.
    pub fn list(&self) -> Vec<ResourceDescriptor> {
        let mut roles: Vec<Role> = self.store.read().agents.keys().cloned().collect();
        roles.sort();

        let mut descriptors = vec![
            ResourceDescriptor {
                uri: "apmas://project/state".to_string(),
                name: "project-state".to_string(),
                description: "Current project state",
            },
            ResourceDescriptor {
                uri: "apmas://messages".to_string(),
                name: "messages".to_string(),
                description: "Recent messages across all roles",
            },
        ];

        for role in roles {
            descriptors.push(ResourceDescriptor {
                uri: format!("apmas://messages/{role}"),
                name: format!("messages-{role}"),
                description: "Recent messages for one role",
            });
            descriptors.push(ResourceDescriptor {
                uri: format!("apmas://checkpoints/{role}"),
                name: format!("checkpoints-{role}"),
                description: "Latest checkpoint for one agent",
            });
            descriptors.push(ResourceDescriptor {
                uri: format!("apmas://checkpoints/{role}/history"),
                name: format!("checkpoints-{role}-history"),
                description: "Bounded checkpoint history for one agent",
            });
        }

        descriptors
    }

    pub fn read(&self, uri: &str) -> Result<ResourceReadResult, SupervisorError> {
        if let Some(entry) = self.cache.lock().get(uri) {
            if self.clock.now().duration_since(entry.cached_at) < CACHE_TTL {
                return Ok(entry.result.clone());
            }
        }

        let result = self.read_uncached(uri)?;
        self.cache.lock().insert(uri.to_string(), CacheEntry { result: result.clone(), cached_at: self.clock.now() });
        Ok(result)
    }

    fn read_uncached(&self, uri: &str) -> Result<ResourceReadResult, SupervisorError> {
        if uri == "apmas://project/state" {
            let project = self.store.project();
            let text = serde_json::to_string_pretty(&project)
                .map_err(|err| SupervisorError::ValidationError(err.to_string()))?;
            return Ok(ResourceReadResult::json(uri, text));
        }

        if uri == "apmas://messages" {
            return self.render_messages(uri, None);
        }

        if let Some(role) = uri.strip_prefix("apmas://messages/") {
            return self.render_messages(uri, Some(Role::new(role)));
        }

        if let Some(role) = uri.strip_prefix("apmas://checkpoints/").and_then(|rest| rest.strip_suffix("/history")) {
            let history = self.checkpoints.history(&Role::new(role));
            let text = serde_json::to_string_pretty(&history)
                .map_err(|err| SupervisorError::ValidationError(err.to_string()))?;
            return Ok(ResourceReadResult::json(uri, text));
        }

        if let Some(role) = uri.strip_prefix("apmas://checkpoints/") {
            let latest = self.checkpoints.latest(&Role::new(role));
            let text = serde_json::to_string_pretty(&latest)
                .map_err(|err| SupervisorError::ValidationError(err.to_string()))?;
            return Ok(ResourceReadResult::json(uri, text));
        }

        Err(SupervisorError::ValidationError(format!("no resource matches uri {uri}")))
    }

    fn render_messages(&self, uri: &str, role: Option<Role>) -> Result<ResourceReadResult, SupervisorError> {
        let state = self.store.read();
        let mut messages: Vec<_> = state
            .messages
            .iter()
            .filter(|m| role.as_ref().map(|r| m.from == *r || m.to == *r).unwrap_or(true))
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        messages.truncate(DEFAULT_MESSAGE_CAP);
        let text = serde_json::to_string_pretty(&messages)
            .map_err(|err| SupervisorError::ValidationError(err.to_string()))?;
        Ok(ResourceReadResult::json(uri, text))
    }
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
