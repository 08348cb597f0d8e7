// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Periodic maintenance of the jobs tree.
//!
//! One [`MaintenanceTask::run`] per scheduler tick. Every tick the leader
//! removes expired locks; every fifth tick the incremental folder sweep
//! probes the minute buckets that closed an hour ago; every sixtieth tick
//! the full folder sweep walks the whole tree instead.
//!
//! Folder sweeps always cover this instance's own jobs. The leader also
//! sweeps the unassigned jobs, so shared state has exactly one deleter.
//!
//! Work stops as soon as the capabilities report inactive. Every delete that
//! already happened was committed on its own (or in a lock batch), so an
//! interrupted sweep leaves a valid, partially pruned tree behind.

mod folders;
mod locks;

use std::sync::Arc;
use std::time::Duration;

use jobtree_store::ResourceStore;
use jobtree_store::batch::DEFAULT_BATCH_SIZE;
use tracing::{debug, info, warn};

use crate::cadence::SweepPhase;
use crate::capabilities::TopologyCapabilities;
use crate::clock::{Clock, SystemClock};
use crate::config::JobsLayout;
use crate::error::Result;
use crate::job::Job;
use crate::relocator::JobRelocator;

/// Sweep tuning.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Locks older than this are removed.
    pub lock_max_age: Duration,
    /// Expired locks deleted per commit.
    pub lock_batch_size: usize,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            lock_max_age: Duration::from_secs(120), // 2 minutes
            lock_batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl MaintenanceConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `JOBTREE_LOCK_MAX_AGE_SECS`: lock age before removal (default: 120)
    /// - `JOBTREE_LOCK_BATCH_SIZE`: expired locks deleted per commit (default: 50)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let lock_max_age = std::env::var("JOBTREE_LOCK_MAX_AGE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.lock_max_age);

        let lock_batch_size = std::env::var("JOBTREE_LOCK_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.lock_batch_size);

        Self {
            lock_max_age,
            lock_batch_size,
        }
    }
}

/// What a sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Nodes removed by committed deletes.
    pub deleted: u64,
    /// The sweep stopped early because the capabilities went inactive.
    pub interrupted: bool,
}

impl SweepReport {
    fn interrupted(mut self) -> Self {
        self.interrupted = true;
        self
    }
}

/// Maintenance of the jobs tree.
pub struct MaintenanceTask {
    store: Arc<dyn ResourceStore>,
    layout: JobsLayout,
    config: MaintenanceConfig,
    clock: Arc<dyn Clock>,
    relocator: JobRelocator,
}

impl MaintenanceTask {
    /// Create a maintenance task using the wall clock.
    pub fn new(
        store: Arc<dyn ResourceStore>,
        layout: JobsLayout,
        config: MaintenanceConfig,
    ) -> Self {
        let relocator = JobRelocator::new(store.clone(), layout.clone());
        Self {
            store,
            layout,
            config,
            clock: Arc::new(SystemClock),
            relocator,
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Jobs tree layout.
    pub fn layout(&self) -> &JobsLayout {
        &self.layout
    }

    /// One maintenance run.
    ///
    /// Without capabilities nothing happens. Outcomes are only logged.
    pub async fn run(&self, capabilities: Option<&dyn TopologyCapabilities>, tick: u64) {
        let Some(caps) = capabilities else {
            debug!(tick, "No topology known, skipping maintenance");
            return;
        };

        let phase = SweepPhase::for_tick(tick);
        let mut folder_paths = vec![self.layout.local_jobs_path()];
        if caps.is_leader() {
            folder_paths.push(self.layout.unassigned_jobs_path());
        }

        debug!(tick, phase = phase.as_str(), leader = caps.is_leader(), "Maintenance run");

        for base_path in &folder_paths {
            let result = match phase {
                SweepPhase::Full => self.full_folder_sweep(caps, base_path).await,
                SweepPhase::Incremental => self.incremental_folder_sweep(caps, base_path).await,
                SweepPhase::LocksOnly => break,
            };
            log_sweep(phase.as_str(), base_path, result);
        }

        let locks_path = self.layout.locks_path();
        log_sweep("locks", &locks_path, self.lock_sweep(caps).await);
    }

    /// Move a job to where it belongs for `target`, or to the unassigned
    /// jobs when `target` is `None`. See [`JobRelocator::reassign`].
    pub async fn reassign_job(&self, job: &Job, target: Option<&str>) {
        self.relocator.reassign(job, target).await;
    }
}

fn log_sweep(sweep: &str, path: &str, result: Result<SweepReport>) {
    match result {
        Ok(report) if report.deleted > 0 => info!(
            sweep,
            path,
            deleted = report.deleted,
            interrupted = report.interrupted,
            "Job resource tree cleanup removed resources"
        ),
        Ok(report) => debug!(
            sweep,
            path,
            interrupted = report.interrupted,
            "Job resource tree cleanup found nothing to remove"
        ),
        Err(e) => warn!(
            sweep,
            path,
            transient = e.is_transient(),
            error = %e,
            "Exception during job resource tree cleanup"
        ),
    }
}
