// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared fixtures for jobtree-maintenance integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use jobtree_maintenance::bucket::TimeBucket;
use jobtree_maintenance::job::PROPERTY_LOCK_CREATED;
use jobtree_maintenance::{
    FixedClock, JobsLayout, MaintenanceConfig, MaintenanceTask, TopologyCapabilities,
};
use jobtree_store::{MemoryStore, Properties, ResourceStore, SqliteStore};
use serde_json::json;
use tempfile::TempDir;

pub const JOBS_ROOT: &str = "/var/eventing/jobs";
pub const INSTANCE_ID: &str = "inst-a";

/// The instant every test runs at: 2025-03-07 10:00:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 7, 10, 0, 0).unwrap()
}

/// `now()` shifted by a number of minutes.
pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    now() - chrono::Duration::minutes(minutes)
}

pub fn layout() -> JobsLayout {
    JobsLayout::new(JOBS_ROOT, INSTANCE_ID).unwrap()
}

pub fn task(store: Arc<dyn ResourceStore>) -> MaintenanceTask {
    task_with_config(store, MaintenanceConfig::default())
}

pub fn task_with_config(
    store: Arc<dyn ResourceStore>,
    config: MaintenanceConfig,
) -> MaintenanceTask {
    MaintenanceTask::new(store, layout(), config).with_clock(Arc::new(FixedClock::new(now())))
}

/// A task whose clock reads `at` instead of `now()`.
pub fn task_at(store: Arc<dyn ResourceStore>, at: DateTime<Utc>) -> MaintenanceTask {
    MaintenanceTask::new(store, layout(), MaintenanceConfig::default())
        .with_clock(Arc::new(FixedClock::new(at)))
}

/// Capabilities whose liveness runs out after a fixed number of checks.
pub struct ScriptedCapabilities {
    leader: bool,
    remaining: Option<AtomicUsize>,
    checks: AtomicUsize,
}

impl ScriptedCapabilities {
    /// Always active.
    pub fn active(leader: bool) -> Self {
        Self {
            leader,
            remaining: None,
            checks: AtomicUsize::new(0),
        }
    }

    /// Active for the first `checks` liveness checks, inactive afterwards.
    pub fn active_for(leader: bool, checks: usize) -> Self {
        Self {
            leader,
            remaining: Some(AtomicUsize::new(checks)),
            checks: AtomicUsize::new(0),
        }
    }

    /// Liveness checks made so far.
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl TopologyCapabilities for ScriptedCapabilities {
    fn is_leader(&self) -> bool {
        self.leader
    }

    fn is_active(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        match &self.remaining {
            None => true,
            Some(remaining) => remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok(),
        }
    }
}

/// Path of the minute folder for `at` below `<base>/<topic>`.
pub fn minute_folder(base: &str, topic: &str, at: DateTime<Utc>) -> String {
    TimeBucket::minute_of(at).path_under(&format!("{}/{}", base, topic))
}

/// Path of the hour folder for `at` below `<base>/<topic>`.
pub fn hour_folder(base: &str, topic: &str, at: DateTime<Utc>) -> String {
    TimeBucket::hour_of(at).path_under(&format!("{}/{}", base, topic))
}

/// Insert an empty folder, creating its ancestors.
pub async fn folder(store: &MemoryStore, path: &str) {
    store.insert(path, Properties::new()).await.unwrap();
}

/// Insert a lock taken at `created`.
pub async fn lock(store: &MemoryStore, path: &str, created: DateTime<Utc>) {
    let properties = json!({ PROPERTY_LOCK_CREATED: created.to_rfc3339() })
        .as_object()
        .cloned()
        .unwrap();
    store.insert(path, properties).await.unwrap();
}

/// A SQLite store on a temporary file.
pub async fn sqlite_store() -> (Arc<dyn ResourceStore>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::from_path(temp_dir.path().join("jobtree.db"))
        .await
        .expect("Failed to open SQLite store");
    (Arc::new(store), temp_dir)
}

/// Create and commit a node through a session.
pub async fn seed(store: &Arc<dyn ResourceStore>, path: &str, properties: Properties) {
    let mut session = store.open().await.expect("Failed to open session");
    session
        .create(path, properties)
        .await
        .expect("Failed to stage create");
    session.commit().await.expect("Failed to commit seed");
}

/// Whether a node exists, read through a fresh session.
pub async fn exists(store: &Arc<dyn ResourceStore>, path: &str) -> bool {
    let mut session = store.open().await.expect("Failed to open session");
    session.get(path).await.expect("Failed to read").is_some()
}
