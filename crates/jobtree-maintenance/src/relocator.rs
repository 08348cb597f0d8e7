// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Moving jobs between instances.
//!
//! A job is moved by copying its node to the path it belongs at for the new
//! target and deleting the old node, both in one commit. Processing state
//! (queue name, start time) is dropped on the way so the receiving instance
//! picks the job up fresh.

use std::sync::Arc;

use jobtree_store::{ResourceStore, StoreError};
use tracing::{debug, info};

use crate::config::JobsLayout;
use crate::job::{
    Job, PROPERTY_JOB_QUEUE_NAME, PROPERTY_JOB_STARTED_TIME, PROPERTY_JOB_TARGET_INSTANCE,
};

/// Moves jobs to the folder of their new target instance.
pub struct JobRelocator {
    store: Arc<dyn ResourceStore>,
    layout: JobsLayout,
}

impl JobRelocator {
    /// Create a relocator for the given tree.
    pub fn new(store: Arc<dyn ResourceStore>, layout: JobsLayout) -> Self {
        Self { store, layout }
    }

    /// Move `job` to `target`, or to the unassigned jobs when `target` is `None`.
    ///
    /// Best effort: a job that is already gone, or a move that conflicts with
    /// a concurrent change, is abandoned and only logged.
    pub async fn reassign(&self, job: &Job, target: Option<&str>) {
        match self.try_reassign(job, target).await {
            Ok(Some(new_path)) => info!(
                job_id = %job.id,
                from = %job.resource_path,
                to = %new_path,
                "Reassigned job"
            ),
            Ok(None) => debug!(
                job_id = %job.id,
                path = %job.resource_path,
                "Job resource no longer exists, nothing to reassign"
            ),
            Err(e) => debug!(
                job_id = %job.id,
                error = %e,
                "Unable to reassign job"
            ),
        }
    }

    async fn try_reassign(
        &self,
        job: &Job,
        target: Option<&str>,
    ) -> Result<Option<String>, StoreError> {
        let mut session = self.store.open().await?;
        let Some(resource) = session.get(&job.resource_path).await? else {
            return Ok(None);
        };

        let new_path = self.layout.unique_path(target, &job.topic, &job.id);

        let mut properties = resource.properties;
        properties.remove(PROPERTY_JOB_QUEUE_NAME);
        properties.remove(PROPERTY_JOB_STARTED_TIME);
        match target {
            Some(target) => {
                properties.insert(PROPERTY_JOB_TARGET_INSTANCE.to_string(), target.into());
            }
            None => {
                properties.remove(PROPERTY_JOB_TARGET_INSTANCE);
            }
        }

        session.create(&new_path, properties).await?;
        session.delete(&resource.path).await?;
        session.commit().await?;
        Ok(Some(new_path))
    }
}
