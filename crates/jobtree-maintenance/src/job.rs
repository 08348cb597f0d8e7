// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Job and lock property keys, and the job handle maintenance works with.

use jobtree_store::Properties;
use serde::{Deserialize, Serialize};

/// Queue the job was picked up by.
pub const PROPERTY_JOB_QUEUE_NAME: &str = "event.job.queuename";

/// Instance the job is assigned to.
pub const PROPERTY_JOB_TARGET_INSTANCE: &str = "event.job.application";

/// When processing of the job started.
pub const PROPERTY_JOB_STARTED_TIME: &str = "event.job.started.time";

/// When a lock was taken. Only lock nodes carry it.
pub const PROPERTY_LOCK_CREATED: &str = "lock.created";

/// A persisted job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job id, `year/month/day/hour/minute/<suffix>`.
    pub id: String,
    /// Job topic, e.g. `org/example/import`.
    pub topic: String,
    /// Where the job is currently stored.
    pub resource_path: String,
    /// Job properties.
    #[serde(default)]
    pub properties: Properties,
}

impl Job {
    /// Create a job handle.
    pub fn new(
        id: impl Into<String>,
        topic: impl Into<String>,
        resource_path: impl Into<String>,
        properties: Properties,
    ) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            resource_path: resource_path.into(),
            properties,
        }
    }
}
