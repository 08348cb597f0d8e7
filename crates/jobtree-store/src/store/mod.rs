// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Store interfaces and backends for jobtree-store.
//!
//! This module defines the store abstraction and backend implementations.

pub mod memory;
pub mod sqlite;

pub use self::memory::MemoryStore;
pub use self::sqlite::SqliteStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::path;

/// Property map stored on every node.
pub type Properties = serde_json::Map<String, Value>;

/// A node of the resource tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Absolute path of the node.
    pub path: String,
    /// Properties stored on the node.
    #[serde(default)]
    pub properties: Properties,
}

impl Resource {
    /// Create a resource.
    pub fn new(path: impl Into<String>, properties: Properties) -> Self {
        Self {
            path: path.into(),
            properties,
        }
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        path::name(&self.path)
    }

    /// Read a timestamp property.
    ///
    /// RFC 3339 strings and integer epoch milliseconds are accepted. Anything
    /// else, including a missing property, reads as `None`.
    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.properties.get(key)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        }
    }
}

/// Factory for store sessions.
///
/// Implementations are shared between tasks; all mutable state lives in the
/// sessions they hand out.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Backend identifier (e.g., "memory", "sqlite").
    fn store_type(&self) -> &'static str;

    /// Open a new session.
    async fn open(&self) -> Result<Box<dyn StoreSession>>;
}

/// A unit of staged work against the tree.
///
/// Reads observe committed state overlaid with this session's staged
/// operations. Dropping a session discards anything not yet committed.
#[async_trait]
pub trait StoreSession: Send {
    /// Fetch a node.
    async fn get(&mut self, path: &str) -> Result<Option<Resource>>;

    /// List the direct children of a node. A missing node has no children.
    async fn children(&mut self, path: &str) -> Result<Vec<Resource>>;

    /// Whether a node has at least one child.
    async fn has_children(&mut self, path: &str) -> Result<bool> {
        Ok(!self.children(path).await?.is_empty())
    }

    /// Stage creation of a node. Missing ancestors are created on commit
    /// with empty properties.
    ///
    /// Fails with a conflict if the node already exists.
    async fn create(&mut self, path: &str, properties: Properties) -> Result<Resource>;

    /// Stage deletion of a node and its whole subtree.
    ///
    /// Fails with `NotFound` if the node does not exist.
    async fn delete(&mut self, path: &str) -> Result<()>;

    /// Apply all staged operations atomically.
    ///
    /// On failure nothing is applied and the staged operations are kept;
    /// call [`StoreSession::refresh`] before continuing.
    async fn commit(&mut self) -> Result<()>;

    /// Discard all staged operations.
    fn refresh(&mut self);

    /// Number of staged, uncommitted operations.
    fn pending(&self) -> usize;
}

/// A staged operation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StagedOp {
    Create { path: String, properties: Properties },
    Delete { path: String },
}

/// Staged operations of one session, replayed over committed reads.
#[derive(Debug, Default)]
pub(crate) struct Staging {
    ops: Vec<StagedOp>,
}

impl Staging {
    pub(crate) fn push(&mut self, op: StagedOp) {
        self.ops.push(op);
    }

    pub(crate) fn ops(&self) -> &[StagedOp] {
        &self.ops
    }

    pub(crate) fn clear(&mut self) {
        self.ops.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.ops.len()
    }

    /// Replay staged operations over the committed properties of `target`.
    pub(crate) fn overlay_get(
        &self,
        target: &str,
        committed: Option<Properties>,
    ) -> Option<Properties> {
        let mut state = committed;
        for op in &self.ops {
            match op {
                StagedOp::Delete { path } => {
                    if path == target || path::is_descendant(target, path) {
                        state = None;
                    }
                }
                StagedOp::Create { path, properties } => {
                    if path == target {
                        state = Some(properties.clone());
                    } else if state.is_none() && path::is_descendant(path, target) {
                        state = Some(Properties::new());
                    }
                }
            }
        }
        state
    }

    /// Replay staged operations over the committed children of `target`.
    pub(crate) fn overlay_children(&self, target: &str, committed: Vec<Resource>) -> Vec<Resource> {
        let mut children: BTreeMap<String, Properties> = committed
            .into_iter()
            .map(|r| (r.path, r.properties))
            .collect();

        for op in &self.ops {
            match op {
                StagedOp::Delete { path } => {
                    if path == target || path::is_descendant(target, path) {
                        children.clear();
                    } else if path::parent(path) == Some(target) {
                        children.remove(path);
                    }
                }
                StagedOp::Create { path, properties } => {
                    if let Some(child) = path::child_towards(target, path) {
                        if child == path {
                            children.insert(child.to_string(), properties.clone());
                        } else {
                            children.entry(child.to_string()).or_default();
                        }
                    }
                }
            }
        }

        children
            .into_iter()
            .map(|(path, properties)| Resource { path, properties })
            .collect()
    }
}
