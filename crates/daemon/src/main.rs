// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! apmasd: the supervisor process.
//!
//! Talks JSON-RPC over framed stdio (spec §4.6), so nothing but protocol
//! frames may ever reach stdout — diagnostics go to a rolling log file.

use apmas_adapters::{NoopNotificationService, NoopSpawner};
use apmas_core::{Config, SystemClock};
use apmas_daemon::{AgentStateManager, CheckpointService, JsonRpcHost, MessageBus, ResourceRegistry, SupervisorLoop, ToolRegistry};
use apmas_storage::StateStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::default().data_directory(data_directory_from_args());
    let _log_guard = init_logging(&config.data_directory);

    let store = match StateStore::open(&config.data_directory) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!(%err, "failed to open state store");
            std::process::exit(1);
        }
    };

    let clock = SystemClock::default();
    let agents = Arc::new(AgentStateManager::new(store.clone(), clock.clone()));
    let bus = Arc::new(MessageBus::new(store.clone(), clock.clone()));
    let checkpoints = Arc::new(CheckpointService::new(store.clone()));
    let tools = Arc::new(ToolRegistry::new(
        store.clone(),
        agents.clone(),
        bus.clone(),
        checkpoints.clone(),
        clock.clone(),
        config.heartbeat_grace.as_millis() as u64,
    ));
    let resources = Arc::new(ResourceRegistry::new(store.clone(), checkpoints.clone(), clock.clone()));
    let host = Arc::new(JsonRpcHost::new(tools, resources, config.protocol_version.clone()));

    let supervisor = Arc::new(SupervisorLoop::new(
        store.clone(),
        agents,
        bus,
        checkpoints,
        Arc::new(NoopSpawner),
        Arc::new(NoopNotificationService),
        clock,
        config,
    ));

    let shutdown = CancellationToken::new();

    let mut host_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            host.run(stdin, tokio::io::stdout(), shutdown).await;
        })
    };

    let supervisor_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { supervisor.run(shutdown).await })
    };

    let mut host_finished = false;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
        }
        result = &mut host_task => {
            host_finished = true;
            if let Err(err) = result {
                tracing::error!(%err, "stdio transport task panicked");
            } else {
                tracing::info!("stdio transport closed, shutting down");
            }
        }
    }

    shutdown.cancel();

    if !host_finished {
        if let Err(err) = host_task.await {
            tracing::error!(%err, "stdio transport task panicked during shutdown");
        }
    }
    if let Err(err) = supervisor_task.await {
        tracing::error!(%err, "supervisor loop task panicked during shutdown");
    }

    if let Err(err) = store.shutdown() {
        tracing::error!(%err, "failed to flush state store on shutdown");
        std::process::exit(1);
    }
}

fn data_directory_from_args() -> PathBuf {
    std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./.apmas"))
}

fn init_logging(data_directory: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let log_directory = data_directory.join("logs");
    let _ = std::fs::create_dir_all(&log_directory);
    let file_appender = tracing_appender::rolling::daily(log_directory, "apmasd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_writer(non_blocking).with_ansi(false).with_env_filter(filter).init();
    guard
}
