// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory store.
//!
//! Keeps the whole tree in a `BTreeMap` keyed by path. Used by tests and by
//! embedders that do not need durability. Supports fault injection so the
//! failure paths of callers can be exercised.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Properties, Resource, ResourceStore, StagedOp, Staging, StoreSession};
use crate::error::{Result, StoreError};
use crate::path;

#[derive(Debug, Default)]
struct Inner {
    nodes: Mutex<BTreeMap<String, Properties>>,
    /// Committed deletions, in commit order.
    deleted: Mutex<Vec<String>>,
    commits: AtomicUsize,
    fail_commits: AtomicUsize,
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node directly, bypassing sessions. Missing ancestors are
    /// created with empty properties; an existing node is overwritten.
    pub async fn insert(&self, node_path: &str, properties: Properties) -> Result<()> {
        path::validate(node_path)?;
        let mut nodes = self.inner.nodes.lock().await;
        for ancestor in path::ancestors(node_path) {
            nodes.entry(ancestor.to_string()).or_default();
        }
        if node_path != path::ROOT {
            nodes.insert(node_path.to_string(), properties);
        }
        Ok(())
    }

    /// Whether a committed node exists.
    pub async fn exists(&self, node_path: &str) -> bool {
        node_path == path::ROOT || self.inner.nodes.lock().await.contains_key(node_path)
    }

    /// Committed properties of a node.
    pub async fn properties(&self, node_path: &str) -> Option<Properties> {
        self.inner.nodes.lock().await.get(node_path).cloned()
    }

    /// All committed paths, sorted.
    pub async fn paths(&self) -> Vec<String> {
        self.inner.nodes.lock().await.keys().cloned().collect()
    }

    /// Paths removed by successful commits, in the order they were removed.
    /// Subtree members removed implicitly are not listed.
    pub async fn deleted_paths(&self) -> Vec<String> {
        self.inner.deleted.lock().await.clone()
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }

    /// Make the next `count` commits fail with a conflict.
    pub fn fail_next_commits(&self, count: usize) {
        self.inner.fail_commits.store(count, Ordering::SeqCst);
    }

    fn take_injected_failure(&self) -> bool {
        self.inner
            .fail_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    fn store_type(&self) -> &'static str {
        "memory"
    }

    async fn open(&self) -> Result<Box<dyn StoreSession>> {
        Ok(Box::new(MemorySession {
            store: self.clone(),
            staging: Staging::default(),
        }))
    }
}

/// Session over a [`MemoryStore`].
pub struct MemorySession {
    store: MemoryStore,
    staging: Staging,
}

fn committed_children(nodes: &BTreeMap<String, Properties>, parent: &str) -> Vec<Resource> {
    let prefix = if parent == path::ROOT {
        "/".to_string()
    } else {
        format!("{}/", parent)
    };
    nodes
        .range(prefix.clone()..)
        .take_while(|(p, _)| p.starts_with(&prefix))
        .filter(|(p, _)| !p[prefix.len()..].contains('/'))
        .map(|(p, props)| Resource::new(p.clone(), props.clone()))
        .collect()
}

fn remove_subtree(nodes: &mut BTreeMap<String, Properties>, root: &str) -> bool {
    let existed = nodes.remove(root).is_some();
    let prefix = format!("{}/", root);
    let doomed: Vec<String> = nodes
        .range(prefix.clone()..)
        .take_while(|(p, _)| p.starts_with(&prefix))
        .map(|(p, _)| p.clone())
        .collect();
    for p in doomed {
        nodes.remove(&p);
    }
    existed
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn get(&mut self, node_path: &str) -> Result<Option<Resource>> {
        path::validate(node_path)?;
        let committed = if node_path == path::ROOT {
            Some(Properties::new())
        } else {
            self.store.inner.nodes.lock().await.get(node_path).cloned()
        };
        Ok(self
            .staging
            .overlay_get(node_path, committed)
            .map(|props| Resource::new(node_path, props)))
    }

    async fn children(&mut self, node_path: &str) -> Result<Vec<Resource>> {
        path::validate(node_path)?;
        let committed = {
            let nodes = self.store.inner.nodes.lock().await;
            committed_children(&nodes, node_path)
        };
        Ok(self.staging.overlay_children(node_path, committed))
    }

    async fn create(&mut self, node_path: &str, properties: Properties) -> Result<Resource> {
        path::validate(node_path)?;
        if self.get(node_path).await?.is_some() {
            return Err(StoreError::conflict(node_path, "resource already exists"));
        }
        self.staging.push(StagedOp::Create {
            path: node_path.to_string(),
            properties: properties.clone(),
        });
        Ok(Resource::new(node_path, properties))
    }

    async fn delete(&mut self, node_path: &str) -> Result<()> {
        path::validate(node_path)?;
        if node_path == path::ROOT {
            return Err(StoreError::InvalidPath("cannot delete the root".to_string()));
        }
        if self.get(node_path).await?.is_none() {
            return Err(StoreError::NotFound(node_path.to_string()));
        }
        self.staging.push(StagedOp::Delete {
            path: node_path.to_string(),
        });
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.staging.ops().is_empty() {
            return Ok(());
        }
        if self.store.take_injected_failure() {
            return Err(StoreError::conflict(path::ROOT, "injected commit failure"));
        }

        let mut nodes = self.store.inner.nodes.lock().await;
        let mut next = nodes.clone();
        let mut removed = Vec::new();

        for op in self.staging.ops() {
            match op {
                StagedOp::Delete { path: target } => {
                    if !remove_subtree(&mut next, target) {
                        return Err(StoreError::conflict(
                            target.as_str(),
                            "resource already deleted",
                        ));
                    }
                    removed.push(target.clone());
                }
                StagedOp::Create {
                    path: target,
                    properties,
                } => {
                    if next.contains_key(target) {
                        return Err(StoreError::conflict(
                            target.as_str(),
                            "resource already exists",
                        ));
                    }
                    for ancestor in path::ancestors(target) {
                        next.entry(ancestor.to_string()).or_default();
                    }
                    next.insert(target.clone(), properties.clone());
                }
            }
        }

        *nodes = next;
        drop(nodes);

        debug!(
            operations = self.staging.len(),
            deleted = removed.len(),
            "Committed staged operations"
        );
        self.store.inner.deleted.lock().await.extend(removed);
        self.store.inner.commits.fetch_add(1, Ordering::SeqCst);
        self.staging.clear();
        Ok(())
    }

    fn refresh(&mut self) {
        self.staging.clear();
    }

    fn pending(&self) -> usize {
        self.staging.len()
    }
}
