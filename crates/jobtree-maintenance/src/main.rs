// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Jobtree Maintenance - standalone retention worker
//!
//! Opens the SQLite-backed job tree and runs maintenance on a fixed interval
//! until interrupted.

use std::sync::Arc;
use tracing::{info, warn};

use jobtree_maintenance::capabilities::{self, TopologyCapabilities};
use jobtree_maintenance::{ClusterCapabilities, Config, MaintenanceTask, MaintenanceWorker};
use jobtree_store::{ResourceStore, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobtree_maintenance=info,jobtree_store=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    let config = Config::from_env()?;

    info!(
        database_path = %config.database_path.display(),
        jobs_root = config.layout.root(),
        instance_id = config.layout.instance_id(),
        leader = config.leader,
        "Starting Jobtree Maintenance"
    );

    let store = Arc::new(SqliteStore::from_path(&config.database_path).await?);
    info!(store_type = store.store_type(), "Job tree opened");

    let caps = Arc::new(ClusterCapabilities::new(config.leader));
    let snapshot: Arc<dyn TopologyCapabilities> = caps.clone();
    let (_topology, topology_rx) = capabilities::channel(Some(snapshot));

    let task = Arc::new(MaintenanceTask::new(
        store,
        config.layout.clone(),
        config.maintenance.clone(),
    ));
    let worker = Arc::new(MaintenanceWorker::new(task, topology_rx, config.worker.clone()));
    let shutdown = worker.shutdown_handle();

    let handle = tokio::spawn({
        let worker = worker.clone();
        async move { worker.run().await }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // Stop any sweep in flight, then the loop
    caps.deactivate();
    shutdown.notify_one();
    handle.await?;

    info!("Jobtree Maintenance shut down");

    Ok(())
}
