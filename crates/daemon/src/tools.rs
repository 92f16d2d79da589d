// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool Registry: the agent-callable operations (spec §4.7).
//!
//! Each tool validates its input, converts expected domain failures into
//! `isError: true` results, and lets unexpected failures bubble up to the
//! JSON-RPC host as an internal error.

use crate::agent_manager::{AgentStateManager, TransitionKind};
use crate::checkpoint::CheckpointService;
use crate::message_bus::MessageBus;
use apmas_adapters::{DashboardEvent, DashboardEventKind, DashboardPublisher, NoopDashboardPublisher};
use apmas_core::{
    noop_metrics, AgentMessage, AgentStatus, Checkpoint, Clock, HeartbeatStatus, MessageType, Role,
    SharedMetrics, SupervisorError,
};
use apmas_storage::StateStore;
use apmas_wire::ToolResult;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub struct ToolRegistry<C: Clock> {
    store: Arc<StateStore>,
    agents: Arc<AgentStateManager<C>>,
    bus: Arc<MessageBus<C>>,
    checkpoints: Arc<CheckpointService>,
    clock: C,
    heartbeat_grace_ms: u64,
    dashboard: Arc<dyn DashboardPublisher>,
    metrics: SharedMetrics,
    descriptors: HashMap<&'static str, ToolDescriptor>,
    order: Vec<&'static str>,
}

impl<C: Clock> ToolRegistry<C> {
    pub fn new(
        store: Arc<StateStore>,
        agents: Arc<AgentStateManager<C>>,
        bus: Arc<MessageBus<C>>,
        checkpoints: Arc<CheckpointService>,
        clock: C,
        heartbeat_grace_ms: u64,
    ) -> Self {
        Self::with_observability(store, agents, bus, checkpoints, clock, heartbeat_grace_ms, Arc::new(NoopDashboardPublisher), noop_metrics())
    }

    /// Same as [`Self::new`] but with explicit dashboard/metrics sinks
    /// (spec §6, §7 — every transition/message/checkpoint fans out to both).
    #[allow(clippy::too_many_arguments)]
    pub fn with_observability(
        store: Arc<StateStore>,
        agents: Arc<AgentStateManager<C>>,
        bus: Arc<MessageBus<C>>,
        checkpoints: Arc<CheckpointService>,
        clock: C,
        heartbeat_grace_ms: u64,
        dashboard: Arc<dyn DashboardPublisher>,
        metrics: SharedMetrics,
    ) -> Self {
        let mut registry = Self {
            store,
            agents,
            bus,
            checkpoints,
            clock,
            heartbeat_grace_ms,
            dashboard,
            metrics,
            descriptors: HashMap::new(),
            order: Vec::new(),
        };
        registry.register(ToolDescriptor {
            name: "heartbeat",
            description: "Report liveness and extend the watchdog timeout.",
            input_schema: heartbeat_schema(),
        });
        registry.register(ToolDescriptor {
            name: "checkpoint",
            description: "Persist a progress snapshot and return percent-complete.",
            input_schema: checkpoint_schema(),
        });
        registry.register(ToolDescriptor {
            name: "send-message",
            description: "Publish a message to another agent or to the supervisor.",
            input_schema: send_message_schema(),
        });
        registry.register(ToolDescriptor {
            name: "complete",
            description: "Mark the calling agent Completed with a summary and artifacts.",
            input_schema: complete_schema(),
        });
        registry.register(ToolDescriptor {
            name: "pause",
            description: "Pause a Running agent so it stops consuming watchdog budget.",
            input_schema: role_only_schema(),
        });
        registry.register(ToolDescriptor {
            name: "resume",
            description: "Resume a Paused agent back to Running.",
            input_schema: role_only_schema(),
        });
        registry.register(ToolDescriptor {
            name: "list-agents",
            description: "List every known agent role and its current status.",
            input_schema: serde_json::json!({"type": "object", "properties": {}}),
        });
        registry
    }

    /// First-registered wins; a duplicate name is dropped with a warning.
    fn register(&mut self, descriptor: ToolDescriptor) {
        if self.descriptors.contains_key(descriptor.name) {
            tracing::warn!(name = descriptor.name, "duplicate tool registration ignored");
            return;
        }
        self.order.push(descriptor.name);
        self.descriptors.insert(descriptor.name, descriptor);
    }

    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.order.iter().map(|name| &self.descriptors[name]).collect()
    }

    pub async fn call(&self, name: &str, arguments: Value) -> Result<ToolResult, SupervisorError> {
        if !self.descriptors.contains_key(name) {
            return Err(SupervisorError::ValidationError(format!("unknown tool {name}")));
        }
        match name {
            "heartbeat" => self.heartbeat(arguments),
            "checkpoint" => self.checkpoint(arguments),
            "send-message" => self.send_message(arguments),
            "complete" => self.complete(arguments),
            "pause" => self.pause(arguments),
            "resume" => self.resume(arguments),
            "list-agents" => self.list_agents(),
            _ => unreachable!("registered name without a handler"),
        }
    }

    fn heartbeat(&self, arguments: Value) -> Result<ToolResult, SupervisorError> {
        #[derive(Deserialize)]
        struct Input {
            #[serde(rename = "agentRole")]
            agent_role: String,
            status: String,
            progress: Option<String>,
            #[serde(rename = "estimatedContextUsage")]
            estimated_context_usage: Option<f64>,
        }
        let input: Input = match serde_json::from_value(arguments) {
            Ok(v) => v,
            Err(_) => return Ok(ToolResult::error("Invalid status")),
        };
        if heartbeat_status_from_str(&input.status).is_none() {
            return Ok(ToolResult::error("Invalid status"));
        }

        let role = Role::new(input.agent_role);
        let now_ms = self.clock.epoch_ms();
        let grace_ms = self.heartbeat_grace_ms;
        let outcome = self.agents.update(&role, TransitionKind::Normal, move |a| {
            a.last_heartbeat_ms = Some(now_ms);
            if let Some(progress) = input.progress {
                a.last_progress_message = Some(progress);
            }
            if let Some(usage) = input.estimated_context_usage {
                a.estimated_context_usage = Some(usage);
            }
            a.timeout_at_ms = Some(now_ms.saturating_add(grace_ms));
        });
        match outcome {
            Ok(after) => {
                self.metrics.counter("apmas.heartbeats", 1);
                self.publish_agent_update(&after);
                Ok(ToolResult::ok("heartbeat recorded"))
            }
            Err(err) if err.is_tool_error() => Ok(ToolResult::error(err.to_string())),
            Err(err) => Err(err),
        }
    }

    fn checkpoint(&self, arguments: Value) -> Result<ToolResult, SupervisorError> {
        #[derive(Deserialize)]
        struct Input {
            #[serde(rename = "agentRole")]
            agent_role: String,
            summary: String,
            #[serde(rename = "completedItems", default)]
            completed_items: Vec<String>,
            #[serde(rename = "pendingItems", default)]
            pending_items: Vec<String>,
            #[serde(rename = "activeFiles", default)]
            active_files: Vec<String>,
            notes: Option<String>,
            #[serde(rename = "estimatedContextUsage")]
            estimated_context_usage: Option<f64>,
        }
        let input: Input = match serde_json::from_value(arguments) {
            Ok(v) => v,
            Err(err) => return Ok(ToolResult::error(format!("invalid checkpoint input: {err}"))),
        };
        let role = Role::new(input.agent_role);
        let agent = match self.agents.get(&role) {
            Ok(a) => a,
            Err(err) if err.is_tool_error() => return Ok(ToolResult::error(err.to_string())),
            Err(err) => return Err(err),
        };

        let strip_empty = |items: Vec<String>| items.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>();
        let completed_items = strip_empty(input.completed_items);
        let pending_items = strip_empty(input.pending_items);
        let active_files = strip_empty(input.active_files);
        let completed_task_count = completed_items.len() as u32;
        let total_task_count = completed_task_count + pending_items.len() as u32;

        let checkpoint = Checkpoint {
            id: apmas_core::CheckpointId::new(),
            role: role.clone(),
            created_at_ms: self.clock.epoch_ms(),
            summary: input.summary,
            completed_task_count,
            total_task_count,
            completed_items,
            pending_items,
            active_files,
            notes: input.notes,
            estimated_context_usage: input.estimated_context_usage,
        };

        let summary = checkpoint.progress_summary();
        self.checkpoints.save(&agent.role, checkpoint.clone())?;
        self.metrics.counter("apmas.checkpoints", 1);
        self.dashboard.publish(DashboardEvent::new(
            DashboardEventKind::Checkpoint,
            checkpoint.created_at_ms,
            serde_json::json!({"role": agent.role.as_str(), "summary": summary}),
        ));
        Ok(ToolResult::ok(summary))
    }

    fn send_message(&self, arguments: Value) -> Result<ToolResult, SupervisorError> {
        #[derive(Deserialize)]
        struct Input {
            from: String,
            to: String,
            #[serde(rename = "type")]
            kind: String,
            content: String,
            #[serde(default)]
            artifacts: Vec<String>,
            #[serde(default)]
            metadata: Option<std::collections::HashMap<String, Value>>,
        }
        let input: Input = match serde_json::from_value(arguments) {
            Ok(v) => v,
            Err(err) => return Ok(ToolResult::error(format!("invalid send-message input: {err}"))),
        };
        let kind = match message_type_from_str(&input.kind) {
            Some(k) => k,
            None => return Ok(ToolResult::error(format!("unknown message type {}", input.kind))),
        };

        let from = Role::new(input.from);
        let to = Role::new(input.to);

        if kind == MessageType::ChangesRequested {
            let sender = match self.agents.get(&from) {
                Ok(a) => a,
                Err(err) if err.is_tool_error() => return Ok(ToolResult::error(err.to_string())),
                Err(err) => return Err(err),
            };
            if !sender.dependencies.contains(&to) {
                return Ok(ToolResult::error(format!(
                    "{from} has no dependency edge onto {to}; rework cannot reset {from} without it"
                )));
            }
        }

        let mut message = AgentMessage::new(from, to, kind, input.content, self.clock.epoch_ms());
        message.artifacts = input.artifacts;
        message.metadata = input.metadata;
        self.metrics.counter("apmas.messages", 1);
        self.dashboard.publish(DashboardEvent::new(
            DashboardEventKind::Message,
            message.timestamp_ms,
            serde_json::json!({"from": message.from.as_str(), "to": message.to.as_str(), "type": message.kind}),
        ));
        self.bus.publish(message)?;
        Ok(ToolResult::ok("message published"))
    }

    fn complete(&self, arguments: Value) -> Result<ToolResult, SupervisorError> {
        #[derive(Deserialize)]
        struct Input {
            #[serde(rename = "agentRole")]
            agent_role: String,
            summary: String,
            #[serde(default)]
            artifacts: Vec<String>,
        }
        let input: Input = match serde_json::from_value(arguments) {
            Ok(v) => v,
            Err(err) => return Ok(ToolResult::error(format!("invalid complete input: {err}"))),
        };
        let role = Role::new(input.agent_role);
        let agent = match self.agents.get(&role) {
            Ok(a) => a,
            Err(err) if err.is_tool_error() => return Ok(ToolResult::error(err.to_string())),
            Err(err) => return Err(err),
        };
        if agent.status != AgentStatus::Running {
            return Ok(ToolResult::error(format!("{role} is not Running")));
        }

        let now_ms = self.clock.epoch_ms();
        let summary = input.summary.clone();
        let outcome = self.agents.update(&role, TransitionKind::Normal, move |a| {
            a.status = AgentStatus::Completed;
            a.completed_at_ms = Some(now_ms);
            a.artifacts = input.artifacts;
            a.last_progress_message = Some(input.summary);
        });
        match outcome {
            Ok(after) => {
                self.metrics.counter("apmas.completions", 1);
                self.publish_agent_update(&after);
                Ok(ToolResult::ok(format!("{role} completed: {summary}")))
            }
            Err(err) if err.is_tool_error() => Ok(ToolResult::error(err.to_string())),
            Err(err) => Err(err),
        }
    }

    fn pause(&self, arguments: Value) -> Result<ToolResult, SupervisorError> {
        let role = role_from_arguments(arguments)?;
        let outcome = self.agents.update(&role, TransitionKind::Normal, |a| a.status = AgentStatus::Paused);
        match outcome {
            Ok(after) => {
                self.publish_agent_update(&after);
                Ok(ToolResult::ok(format!("{role} paused")))
            }
            Err(err) if err.is_tool_error() => Ok(ToolResult::error(err.to_string())),
            Err(err) => Err(err),
        }
    }

    fn resume(&self, arguments: Value) -> Result<ToolResult, SupervisorError> {
        let role = role_from_arguments(arguments)?;
        let outcome = self.agents.update(&role, TransitionKind::Normal, |a| a.status = AgentStatus::Running);
        match outcome {
            Ok(after) => {
                self.publish_agent_update(&after);
                Ok(ToolResult::ok(format!("{role} resumed")))
            }
            Err(err) if err.is_tool_error() => Ok(ToolResult::error(err.to_string())),
            Err(err) => Err(err),
        }
    }

    fn publish_agent_update(&self, agent: &apmas_core::AgentState) {
        self.dashboard.publish(DashboardEvent::new(
            DashboardEventKind::AgentUpdate,
            self.clock.epoch_ms(),
            serde_json::json!({"role": agent.role.as_str(), "status": agent.status.to_string()}),
        ));
    }

    fn list_agents(&self) -> Result<ToolResult, SupervisorError> {
        let mut roles: Vec<Role> = self.store.read().agents.keys().cloned().collect();
        roles.sort();
        let summaries: Vec<Value> = roles
            .into_iter()
            .filter_map(|role| self.agents.get(&role).ok())
            .map(|a| serde_json::json!({"role": a.role.as_str(), "status": a.status.to_string()}))
            .collect();
        Ok(ToolResult::ok(serde_json::to_string_pretty(&summaries).unwrap_or_default()))
    }
}

fn role_from_arguments(arguments: Value) -> Result<Role, SupervisorError> {
    #[derive(Deserialize)]
    struct Input {
        #[serde(rename = "agentRole")]
        agent_role: String,
    }
    let input: Input = serde_json::from_value(arguments)
        .map_err(|err| SupervisorError::ValidationError(format!("invalid input: {err}")))?;
    Ok(Role::new(input.agent_role))
}

fn heartbeat_status_from_str(status: &str) -> Option<HeartbeatStatus> {
    Some(match status {
        "working" => HeartbeatStatus::Working,
        "thinking" => HeartbeatStatus::Thinking,
        "writing" => HeartbeatStatus::Writing,
        _ => return None,
    })
}

fn message_type_from_str(kind: &str) -> Option<MessageType> {
    Some(match kind {
        "assignment" => MessageType::Assignment,
        "progress" => MessageType::Progress,
        "question" => MessageType::Question,
        "answer" => MessageType::Answer,
        "heartbeat" => MessageType::Heartbeat,
        "checkpoint" => MessageType::Checkpoint,
        "done" => MessageType::Done,
        "needs_review" => MessageType::NeedsReview,
        "approved" => MessageType::Approved,
        "changes_requested" => MessageType::ChangesRequested,
        "blocked" => MessageType::Blocked,
        "context_limit" => MessageType::ContextLimit,
        "error" => MessageType::Error,
        "info" => MessageType::Info,
        "request" => MessageType::Request,
        _ => return None,
    })
}

fn heartbeat_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "agentRole": {"type": "string"},
            "status": {"type": "string", "enum": ["working", "thinking", "writing"]},
            "progress": {"type": "string"},
            "estimatedContextUsage": {"type": "number"}
        },
        "required": ["agentRole", "status"]
    })
}

fn checkpoint_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "agentRole": {"type": "string"},
            "summary": {"type": "string"},
            "completedItems": {"type": "array", "items": {"type": "string"}},
            "pendingItems": {"type": "array", "items": {"type": "string"}},
            "activeFiles": {"type": "array", "items": {"type": "string"}},
            "notes": {"type": "string"},
            "estimatedContextUsage": {"type": "number"}
        },
        "required": ["agentRole", "summary", "completedItems", "pendingItems"]
    })
}

fn send_message_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "from": {"type": "string", "description": "calling agent's role"},
            "to": {"type": "string"},
            "type": {"type": "string"},
            "content": {"type": "string"},
            "artifacts": {"type": "array", "items": {"type": "string"}},
            "metadata": {"type": "object"}
        },
        "required": ["from", "to", "type", "content"]
    })
}

fn complete_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "agentRole": {"type": "string"},
            "summary": {"type": "string"},
            "artifacts": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["agentRole", "summary"]
    })
}

fn role_only_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {"agentRole": {"type": "string"}},
        "required": ["agentRole"]
    })
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
