// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Background worker driving periodic maintenance.
//!
//! Every poll interval the worker advances its tick counter and hands the
//! latest published capabilities to [`MaintenanceTask::run`]. The counter
//! starts at zero and the first run uses tick 1, so the first full sweep
//! happens on the sixtieth run rather than at startup.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::info;

use crate::capabilities::CapabilitiesReceiver;
use crate::config::parse_bool;
use crate::maintenance::MaintenanceTask;

/// Configuration for the maintenance worker.
#[derive(Debug, Clone)]
pub struct MaintenanceWorkerConfig {
    /// Whether maintenance runs at all.
    pub enabled: bool,
    /// Time between maintenance runs.
    pub poll_interval: Duration,
}

impl Default for MaintenanceWorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval: Duration::from_secs(60), // 1 minute
        }
    }
}

impl MaintenanceWorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `JOBTREE_MAINTENANCE_ENABLED`: "false" or "0" to disable (default: true)
    /// - `JOBTREE_MAINTENANCE_INTERVAL_SECS`: seconds between runs (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enabled = std::env::var("JOBTREE_MAINTENANCE_ENABLED")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.enabled);

        let poll_interval = std::env::var("JOBTREE_MAINTENANCE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);

        Self {
            enabled,
            poll_interval,
        }
    }
}

/// Background worker that runs maintenance on a fixed interval.
pub struct MaintenanceWorker {
    task: Arc<MaintenanceTask>,
    topology: CapabilitiesReceiver,
    config: MaintenanceWorkerConfig,
    shutdown: Arc<Notify>,
    ticks: AtomicU64,
}

impl MaintenanceWorker {
    /// Create a new maintenance worker.
    pub fn new(
        task: Arc<MaintenanceTask>,
        topology: CapabilitiesReceiver,
        config: MaintenanceWorkerConfig,
    ) -> Self {
        Self {
            task,
            topology,
            config,
            shutdown: Arc::new(Notify::new()),
            ticks: AtomicU64::new(0),
        }
    }

    /// Get a handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Run the worker loop until shutdown is signalled.
    pub async fn run(&self) {
        if !self.config.enabled {
            info!("Maintenance worker disabled");
            return;
        }

        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            instance_id = self.task.layout().instance_id(),
            "Maintenance worker started"
        );

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    info!("Maintenance worker received shutdown signal");
                    break;
                }

                _ = tokio::time::sleep(self.config.poll_interval) => {
                    self.tick().await;
                }
            }
        }

        info!("Maintenance worker stopped");
    }

    /// Advance the tick counter and run maintenance once.
    pub async fn tick(&self) {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        let caps = self.topology.borrow().clone();
        self.task.run(caps.as_deref(), tick).await;
    }

    /// Number of runs started so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }
}
