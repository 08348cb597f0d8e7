// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Expired lock removal.

use chrono::{DateTime, Utc};
use jobtree_store::{BatchRemover, StoreSession};
use tracing::debug;

use super::{MaintenanceTask, SweepReport};
use crate::capabilities::TopologyCapabilities;
use crate::error::{Result, RetentionError};
use crate::job::PROPERTY_LOCK_CREATED;

/// Locks found by a traversal of the lock tree.
struct ExpiredLocks {
    paths: Vec<String>,
    interrupted: bool,
}

impl MaintenanceTask {
    /// Remove locks older than the configured maximum age. Leader only.
    ///
    /// Any node below the locks root carrying a creation timestamp is a lock;
    /// anything else is a folder and is descended into. Expired locks are
    /// deleted in batches. After the first failure the remaining locks are
    /// deleted and committed one at a time.
    pub async fn lock_sweep(&self, caps: &dyn TopologyCapabilities) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        if !caps.is_leader() {
            return Ok(report);
        }

        debug!("Cleaning up job resource tree: removing obsolete locks");

        let max_age = chrono::Duration::from_std(self.config.lock_max_age)
            .map_err(|e| RetentionError::InvalidDuration(e.to_string()))?;
        let cutoff = self.clock.now() - max_age;

        let mut session = self.store.open().await?;
        let expired =
            collect_expired_locks(session.as_mut(), caps, &self.layout.locks_path(), cutoff).await?;
        if expired.interrupted {
            return Ok(report.interrupted());
        }

        let mut remover = BatchRemover::new(self.config.lock_batch_size);
        let mut batch = true;

        for lock_path in &expired.paths {
            if !caps.is_active() {
                report.interrupted = true;
                break;
            }

            let outcome = if batch {
                remover.delete(session.as_mut(), lock_path).await
            } else {
                delete_and_commit(session.as_mut(), lock_path).await
            };

            match outcome {
                Ok(committed) => report.deleted += committed as u64,
                Err(e) => {
                    debug!(path = %lock_path, error = %e, "Ignored exception while removing lock");
                    batch = false;
                    session.refresh();
                }
            }
        }

        let tail = if batch { remover.staged() } else { 0 };
        match session.commit().await {
            Ok(()) => report.deleted += tail as u64,
            Err(e) => {
                debug!(error = %e, "Ignored exception while committing lock removal");
                session.refresh();
            }
        }

        Ok(report)
    }
}

/// Walk the lock tree below `root`, collecting locks created before `cutoff`.
async fn collect_expired_locks(
    session: &mut dyn StoreSession,
    caps: &dyn TopologyCapabilities,
    root: &str,
    cutoff: DateTime<Utc>,
) -> Result<ExpiredLocks> {
    let mut paths = Vec::new();
    let mut folders = vec![root.to_string()];

    while let Some(folder) = folders.pop() {
        for child in session.children(&folder).await? {
            if !caps.is_active() {
                return Ok(ExpiredLocks {
                    paths,
                    interrupted: true,
                });
            }
            match child.timestamp(PROPERTY_LOCK_CREATED) {
                Some(created) if created < cutoff => paths.push(child.path),
                Some(_) => {}
                None => folders.push(child.path),
            }
        }
    }

    Ok(ExpiredLocks {
        paths,
        interrupted: false,
    })
}

async fn delete_and_commit(
    session: &mut dyn StoreSession,
    path: &str,
) -> jobtree_store::Result<usize> {
    session.delete(path).await?;
    session.commit().await?;
    Ok(1)
}
