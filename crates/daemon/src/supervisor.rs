// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor Loop: the heart of the control plane (spec §4.4).
//!
//! One tick runs six ordered phases. A failure in one phase is logged and
//! never blocks the others; the loop retries everything on the next tick.

use crate::agent_manager::{AgentStateManager, TransitionKind};
use crate::checkpoint::CheckpointService;
use crate::message_bus::MessageBus;
use apmas_adapters::{
    DashboardEvent, DashboardEventKind, DashboardPublisher, EscalationNotification, NoopDashboardPublisher,
    NotificationService, Spawner,
};
use apmas_core::{
    noop_metrics, AgentMessage, AgentState, AgentStatus, Clock, Config, MessageType, ProjectPhase, Role,
    SharedMetrics, SUPERVISOR,
};
use apmas_storage::StateStore;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

pub struct SupervisorLoop<C: Clock, S: Spawner, N: NotificationService> {
    store: Arc<StateStore>,
    agents: Arc<AgentStateManager<C>>,
    bus: Arc<MessageBus<C>>,
    checkpoints: Arc<CheckpointService>,
    spawner: Arc<S>,
    notifier: Arc<N>,
    clock: C,
    config: Config,
    dashboard: Arc<dyn DashboardPublisher>,
    metrics: SharedMetrics,
    notified_escalations: Mutex<HashSet<Role>>,
}

impl<C: Clock, S: Spawner, N: NotificationService> SupervisorLoop<C, S, N> {
    pub fn new(
        store: Arc<StateStore>,
        agents: Arc<AgentStateManager<C>>,
        bus: Arc<MessageBus<C>>,
        checkpoints: Arc<CheckpointService>,
        spawner: Arc<S>,
        notifier: Arc<N>,
        clock: C,
        config: Config,
    ) -> Self {
        Self::with_observability(
            store,
            agents,
            bus,
            checkpoints,
            spawner,
            notifier,
            clock,
            config,
            Arc::new(NoopDashboardPublisher),
            noop_metrics(),
        )
    }

    /// Same as [`Self::new`] but with explicit dashboard/metrics sinks
    /// (spec §6, §7 — every transition, escalation, and phase change fans
    /// out to both).
    #[allow(clippy::too_many_arguments)]
    pub fn with_observability(
        store: Arc<StateStore>,
        agents: Arc<AgentStateManager<C>>,
        bus: Arc<MessageBus<C>>,
        checkpoints: Arc<CheckpointService>,
        spawner: Arc<S>,
        notifier: Arc<N>,
        clock: C,
        config: Config,
        dashboard: Arc<dyn DashboardPublisher>,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            store,
            agents,
            bus,
            checkpoints,
            spawner,
            notifier,
            clock,
            config,
            dashboard,
            metrics,
            notified_escalations: Mutex::new(HashSet::new()),
        }
    }

    fn publish_agent_update(&self, agent: &AgentState) {
        self.dashboard.publish(DashboardEvent::new(
            DashboardEventKind::AgentUpdate,
            self.clock.epoch_ms(),
            serde_json::json!({"role": agent.role.as_str(), "status": agent.status.to_string()}),
        ));
    }

    /// Runs ticks on `config.poll_interval` until `shutdown` fires.
    pub async fn run(&self, shutdown: tokio_util::sync::CancellationToken) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = interval.tick() => self.tick().await,
            }
        }
    }

    /// One iteration of the six-phase control loop. Each phase is
    /// independently fallible; failures are logged, not propagated.
    pub async fn tick(&self) {
        self.promote_dependencies();
        self.spawn_queued().await;
        self.sweep_timeouts();
        self.apply_review_feedback();
        self.scan_escalations().await;
        self.check_terminal_phase();
    }

    fn roles_in_declaration_order(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.store.read().agents.keys().cloned().collect();
        roles.sort();
        roles
    }

    /// (1) Pending → Queued once every declared dependency is Completed.
    fn promote_dependencies(&self) {
        for role in self.roles_in_declaration_order() {
            let Some(agent) = self.store.agent(&role) else { continue };
            if agent.status != AgentStatus::Pending {
                continue;
            }
            let satisfied = agent.dependencies_satisfied(|dep| self.store.agent(dep).map(|a| a.status == AgentStatus::Completed).unwrap_or(false));
            if !satisfied {
                continue;
            }
            if let Err(err) = self.agents.update(&role, TransitionKind::Normal, |a| a.status = AgentStatus::Queued) {
                tracing::warn!(%role, %err, "dependency promotion failed");
            }
        }
    }

    /// (2) Queued → Spawning → Running via the external [`Spawner`].
    async fn spawn_queued(&self) {
        for role in self.roles_in_declaration_order() {
            let Some(agent) = self.store.agent(&role) else { continue };
            if agent.status != AgentStatus::Queued {
                continue;
            }
            let result = self
                .spawner
                .spawn(&role, &agent.subagent_type, agent.recovery_context.as_deref())
                .await;
            let now_ms = self.clock.epoch_ms();
            let max_retries = self.config.max_retries;
            let outcome = if result.success {
                let spawn_timeout = self.config.spawn_timeout;
                self.agents.update(&role, TransitionKind::Normal, move |a| {
                    a.status = AgentStatus::Running;
                    a.task_id = result.task_id.clone();
                    a.process_id = result.process_id.clone();
                    a.spawned_at_ms = Some(now_ms);
                    a.timeout_at_ms = Some(now_ms + spawn_timeout.as_millis() as u64);
                })
            } else {
                self.agents.update(&role, TransitionKind::Normal, move |a| {
                    a.retry_count += 1;
                    a.last_error = result.error_message.clone();
                    a.status = if a.retry_count < max_retries { AgentStatus::Queued } else { AgentStatus::Failed };
                })
            };
            match outcome {
                Ok(after) => {
                    self.metrics.counter(if after.status == AgentStatus::Running { "apmas.spawns" } else { "apmas.spawn_failures" }, 1);
                    self.publish_agent_update(&after);
                }
                Err(err) => tracing::warn!(%role, %err, "spawn transition failed"),
            }
        }
    }

    /// (3) Watchdog: requeues last tick's `TimedOut` agents, then flags
    /// agents whose `timeout_at_ms` has elapsed.
    fn sweep_timeouts(&self) {
        let now_ms = self.clock.epoch_ms();
        let max_retries = self.config.max_retries;

        for role in self.roles_in_declaration_order() {
            let Some(agent) = self.store.agent(&role) else { continue };
            if agent.status != AgentStatus::TimedOut {
                continue;
            }
            let outcome = self.agents.update(&role, TransitionKind::Normal, move |a| {
                a.retry_count += 1;
                a.status = if a.retry_count < max_retries { AgentStatus::Queued } else { AgentStatus::Failed };
            });
            if let Err(err) = outcome {
                tracing::warn!(%role, %err, "timeout retry transition failed");
            }
        }

        for role in self.roles_in_declaration_order() {
            let Some(agent) = self.store.agent(&role) else { continue };
            let running_or_spawning = matches!(agent.status, AgentStatus::Running | AgentStatus::Spawning);
            let timed_out = agent.timeout_at_ms.map(|t| t < now_ms).unwrap_or(false);
            if !running_or_spawning || !timed_out {
                continue;
            }
            match self.agents.update(&role, TransitionKind::Normal, |a| a.status = AgentStatus::TimedOut) {
                Ok(after) => {
                    self.metrics.counter("apmas.timeouts", 1);
                    self.publish_agent_update(&after);
                }
                Err(err) => {
                    tracing::warn!(%role, %err, "timeout transition failed");
                    continue;
                }
            }
            let message = AgentMessage::new(
                Role::new(SUPERVISOR),
                role.clone(),
                MessageType::Error,
                "agent timed out waiting for heartbeat or completion",
                now_ms,
            );
            if let Err(err) = self.bus.publish(message) {
                tracing::warn!(%role, %err, "failed to publish timeout notice");
            }
        }
    }

    /// (4) ChangesRequested drives the rework protocol, the only sanctioned
    /// back-transition out of a terminal status.
    fn apply_review_feedback(&self) {
        let mut pending: Vec<AgentMessage> = self
            .store
            .read()
            .messages
            .iter()
            .filter(|m| !m.is_processed() && m.kind == MessageType::ChangesRequested && m.to.is_real())
            .cloned()
            .collect();
        pending.sort_by_key(|m| m.timestamp_ms);

        for message in pending {
            let now_ms = self.clock.epoch_ms();
            let Some(target) = self.store.agent(&message.to) else {
                tracing::warn!(to = %message.to, "ChangesRequested targets unknown role");
                if let Err(err) = self.bus.mark_processed(message.id.clone(), now_ms) {
                    tracing::warn!(%err, "failed to mark orphaned review message processed");
                }
                continue;
            };
            if target.status != AgentStatus::Completed {
                continue;
            }

            if target.review_iteration_count >= self.config.max_review_iterations {
                match self.agents.update(&message.to, TransitionKind::Rework, |a| a.status = AgentStatus::Escalated) {
                    Ok(after) => {
                        self.metrics.counter("apmas.escalations", 1);
                        self.publish_agent_update(&after);
                    }
                    Err(err) => {
                        tracing::warn!(to = %message.to, %err, "escalation transition failed");
                        continue;
                    }
                }
            } else {
                let content = message.content.clone();
                let outcome = self.agents.update(&message.to, TransitionKind::Rework, move |a| {
                    a.status = AgentStatus::Queued;
                    a.recovery_context = Some(format!("Reviewer feedback: {content}"));
                    a.review_iteration_count += 1;
                });
                match outcome {
                    Ok(after) => {
                        self.metrics.counter("apmas.reworks", 1);
                        self.publish_agent_update(&after);
                    }
                    Err(err) => {
                        tracing::warn!(to = %message.to, %err, "rework transition failed");
                        continue;
                    }
                }
                let reset = self.agents.update(&message.from, TransitionKind::Rework, |a| {
                    a.status = AgentStatus::Pending;
                    a.completed_at_ms = None;
                    a.spawned_at_ms = None;
                    a.task_id = None;
                });
                match reset {
                    Ok(after) => self.publish_agent_update(&after),
                    Err(err) => tracing::warn!(from = %message.from, %err, "reviewer reset failed"),
                }
            }

            if let Err(err) = self.bus.mark_processed(message.id.clone(), now_ms) {
                tracing::warn!(%err, "failed to mark review message processed");
            }
        }
    }

    /// (5) Emits one [`EscalationNotification`] per role newly in `Escalated`.
    async fn scan_escalations(&self) {
        let escalated: Vec<Role> = self
            .store
            .read()
            .agents
            .values()
            .filter(|a| a.status == AgentStatus::Escalated)
            .map(|a| a.role.clone())
            .collect();
        let escalated_set: HashSet<Role> = escalated.iter().cloned().collect();

        {
            let mut notified = self.notified_escalations.lock();
            notified.retain(|role| escalated_set.contains(role));
        }

        for role in escalated {
            let already_notified = self.notified_escalations.lock().contains(&role);
            if already_notified {
                continue;
            }
            let Some(agent) = self.store.agent(&role) else { continue };
            let feedback_context = self
                .store
                .read()
                .messages
                .iter()
                .filter(|m| m.to == role && m.kind == MessageType::ChangesRequested)
                .map(|m| m.content.clone())
                .collect::<Vec<_>>()
                .join("\n");
            let notification = EscalationNotification {
                role: role.clone(),
                failure_count: agent.retry_count,
                last_error: agent.last_error.clone(),
                latest_checkpoint_summary: self.checkpoints.latest(&role).map(|c| c.summary),
                artifacts: agent.artifacts.clone(),
                feedback_context,
            };
            self.notifier.notify(notification).await;
            self.notified_escalations.lock().insert(role);
        }
    }

    /// (6) Aggregate-status check: every agent Completed means the project
    /// is Completed; any Failed agent fails the project.
    fn check_terminal_phase(&self) {
        let Some(project) = self.store.project() else { return };
        if project.phase.is_terminal() {
            return;
        }
        let state = self.store.read();
        if state.agents.is_empty() {
            return;
        }
        let statuses: Vec<AgentStatus> = state.agents.values().map(|a| a.status).collect();
        drop(state);

        let next_phase = if statuses.iter().all(|s| *s == AgentStatus::Completed) {
            Some(ProjectPhase::Completed)
        } else if statuses.iter().any(|s| *s == AgentStatus::Failed) {
            Some(ProjectPhase::Failed)
        } else {
            None
        };

        if let Some(phase) = next_phase {
            let now_ms = self.clock.epoch_ms();
            let mut updated = project;
            updated.phase = phase;
            updated.completed_at_ms = Some(now_ms);
            if let Err(err) = self.store.upsert_project(updated.clone()) {
                tracing::warn!(%err, "terminal-phase update failed");
                return;
            }
            self.metrics.counter(if phase == ProjectPhase::Completed { "apmas.projects_completed" } else { "apmas.projects_failed" }, 1);
            self.dashboard.publish(DashboardEvent::new(
                DashboardEventKind::ProjectUpdate,
                now_ms,
                serde_json::json!({"name": updated.name, "phase": phase.to_string()}),
            ));
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
