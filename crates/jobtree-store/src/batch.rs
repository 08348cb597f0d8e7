// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Batched deletes.
//!
//! Stages deletes on a session and commits every `batch_size` of them, so a
//! long list of removals does not turn into one commit per node. The caller
//! commits whatever is left over once it is done.

use tracing::debug;

use crate::error::Result;
use crate::store::StoreSession;

/// Default number of deletes per commit.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Batched delete helper.
#[derive(Debug, Clone)]
pub struct BatchRemover {
    batch_size: usize,
    staged: usize,
}

impl Default for BatchRemover {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchRemover {
    /// Create a remover that commits every `batch_size` deletes.
    /// A size of zero is treated as one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            staged: 0,
        }
    }

    /// Stage a delete, committing the batch if it is full.
    ///
    /// Returns the number of deletes this call committed: zero while the
    /// batch is filling up, the batch size when it was flushed.
    ///
    /// On a failed commit the batch counter is reset; the session still holds
    /// the staged deletes and must be refreshed by the caller.
    pub async fn delete(&mut self, session: &mut dyn StoreSession, path: &str) -> Result<usize> {
        session.delete(path).await?;
        self.staged += 1;
        if self.staged < self.batch_size {
            return Ok(0);
        }
        let count = self.staged;
        self.staged = 0;
        session.commit().await?;
        debug!(count, "Committed delete batch");
        Ok(count)
    }

    /// Deletes staged since the last batch commit.
    pub fn staged(&self) -> usize {
        self.staged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Properties, ResourceStore};

    async fn seeded(count: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..count {
            store
                .insert(&format!("/locks/l{}", i), Properties::new())
                .await
                .unwrap();
        }
        store
    }

    #[test]
    fn test_zero_batch_size_is_one() {
        assert_eq!(BatchRemover::new(0).batch_size, 1);
        assert_eq!(BatchRemover::default().batch_size, DEFAULT_BATCH_SIZE);
    }

    #[tokio::test]
    async fn test_commits_every_batch() {
        let store = seeded(5).await;
        let mut session = store.open().await.unwrap();
        let mut remover = BatchRemover::new(2);

        let mut committed = 0;
        for i in 0..5 {
            committed += remover
                .delete(session.as_mut(), &format!("/locks/l{}", i))
                .await
                .unwrap();
        }

        assert_eq!(committed, 4);
        assert_eq!(store.commit_count(), 2);
        assert_eq!(remover.staged(), 1);
        assert_eq!(session.pending(), 1);
        assert!(store.exists("/locks/l4").await);

        session.commit().await.unwrap();
        assert!(!store.exists("/locks/l4").await);
    }

    #[tokio::test]
    async fn test_failed_batch_commit_propagates() {
        let store = seeded(2).await;
        store.fail_next_commits(1);
        let mut session = store.open().await.unwrap();
        let mut remover = BatchRemover::new(2);

        remover.delete(session.as_mut(), "/locks/l0").await.unwrap();
        let result = remover.delete(session.as_mut(), "/locks/l1").await;

        assert!(result.is_err());
        assert_eq!(remover.staged(), 0);
        assert!(store.exists("/locks/l0").await);
    }
}
