// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tests for moving jobs between instances.

mod common;

use std::sync::Arc;

use common::*;
use jobtree_maintenance::Job;
use jobtree_maintenance::bucket::job_id;
use jobtree_maintenance::job::{
    PROPERTY_JOB_QUEUE_NAME, PROPERTY_JOB_STARTED_TIME, PROPERTY_JOB_TARGET_INSTANCE,
};
use jobtree_store::{MemoryStore, Properties, ResourceStore};
use serde_json::json;

const TOPIC: &str = "org/example/import";

fn started_job_properties() -> Properties {
    json!({
        PROPERTY_JOB_TARGET_INSTANCE: INSTANCE_ID,
        PROPERTY_JOB_QUEUE_NAME: "main",
        PROPERTY_JOB_STARTED_TIME: "2025-03-07T09:58:00Z",
        "attempt": 2,
    })
    .as_object()
    .cloned()
    .unwrap()
}

/// Seed a started job assigned to this instance and return its handle.
async fn started_job(store: &Arc<dyn ResourceStore>) -> Job {
    let id = job_id(minutes_ago(5), "inst-a_17");
    let path = layout().unique_path(Some(INSTANCE_ID), TOPIC, &id);
    seed(store, &path, started_job_properties()).await;
    Job::new(id, TOPIC, path, started_job_properties())
}

async fn read(store: &Arc<dyn ResourceStore>, path: &str) -> Option<Properties> {
    let mut session = store.open().await.unwrap();
    session.get(path).await.unwrap().map(|r| r.properties)
}

#[tokio::test]
async fn test_reassign_to_other_instance() {
    let store: Arc<dyn ResourceStore> = Arc::new(MemoryStore::new());
    let job = started_job(&store).await;

    task(store.clone()).reassign_job(&job, Some("inst-b")).await;

    let new_path = format!(
        "{}/assigned/inst-b/org.example.import/2025/3/7/9/55/inst-a_17",
        JOBS_ROOT
    );
    let props = read(&store, &new_path).await.expect("job should have moved");
    assert_eq!(props[PROPERTY_JOB_TARGET_INSTANCE], "inst-b");
    assert_eq!(props["attempt"], 2);
    assert!(!props.contains_key(PROPERTY_JOB_QUEUE_NAME));
    assert!(!props.contains_key(PROPERTY_JOB_STARTED_TIME));
    assert!(read(&store, &job.resource_path).await.is_none());
}

#[tokio::test]
async fn test_reassign_to_unassigned() {
    let store: Arc<dyn ResourceStore> = Arc::new(MemoryStore::new());
    let job = started_job(&store).await;

    task(store.clone()).reassign_job(&job, None).await;

    let new_path = format!(
        "{}/unassigned/org.example.import/2025/3/7/9/55/inst-a_17",
        JOBS_ROOT
    );
    let props = read(&store, &new_path).await.expect("job should have moved");
    assert!(!props.contains_key(PROPERTY_JOB_TARGET_INSTANCE));
    assert!(read(&store, &job.resource_path).await.is_none());
}

#[tokio::test]
async fn test_reassign_missing_job_is_noop() {
    let memory = MemoryStore::new();
    let store: Arc<dyn ResourceStore> = Arc::new(memory.clone());
    let id = job_id(minutes_ago(5), "inst-a_17");
    let path = layout().unique_path(Some(INSTANCE_ID), TOPIC, &id);
    let job = Job::new(id, TOPIC, path, Properties::new());

    task(store).reassign_job(&job, Some("inst-b")).await;

    assert_eq!(memory.commit_count(), 0);
    assert!(memory.paths().await.is_empty());
}

#[tokio::test]
async fn test_reassign_conflict_is_abandoned() {
    let store: Arc<dyn ResourceStore> = Arc::new(MemoryStore::new());
    let job = started_job(&store).await;
    let taken = layout().unique_path(Some("inst-b"), TOPIC, &job.id);
    seed(&store, &taken, Properties::new()).await;

    task(store.clone()).reassign_job(&job, Some("inst-b")).await;

    assert!(read(&store, &job.resource_path).await.is_some());
    assert_eq!(read(&store, &taken).await, Some(Properties::new()));
}

#[tokio::test]
async fn test_reassign_sqlite() {
    let (store, _temp_dir) = sqlite_store().await;
    let job = started_job(&store).await;

    task(store.clone()).reassign_job(&job, Some("inst-b")).await;

    let new_path = layout().unique_path(Some("inst-b"), TOPIC, &job.id);
    let props = read(&store, &new_path).await.expect("job should have moved");
    assert_eq!(props[PROPERTY_JOB_TARGET_INSTANCE], "inst-b");
    assert!(!props.contains_key(PROPERTY_JOB_QUEUE_NAME));
    assert!(read(&store, &job.resource_path).await.is_none());
}
