// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared fixtures for jobtree-store integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use jobtree_store::{MemoryStore, Properties, ResourceStore, SqliteStore};
use serde_json::Value;
use tempfile::TempDir;

/// A store under test plus whatever keeps it alive.
pub struct Backend {
    pub name: &'static str,
    pub store: Arc<dyn ResourceStore>,
    _temp_dir: Option<TempDir>,
}

/// Every backend, freshly created and empty.
pub async fn backends() -> Vec<Backend> {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let sqlite = SqliteStore::from_path(temp_dir.path().join("nested").join("store.db"))
        .await
        .expect("Failed to open SQLite store");

    vec![
        Backend {
            name: "memory",
            store: Arc::new(MemoryStore::new()),
            _temp_dir: None,
        },
        Backend {
            name: "sqlite",
            store: Arc::new(sqlite),
            _temp_dir: Some(temp_dir),
        },
    ]
}

/// Build a property map from a JSON object literal.
pub fn props(value: Value) -> Properties {
    value.as_object().cloned().unwrap_or_default()
}

/// Create and commit a node.
pub async fn seed(store: &Arc<dyn ResourceStore>, path: &str, properties: Properties) {
    let mut session = store.open().await.expect("Failed to open session");
    session
        .create(path, properties)
        .await
        .expect("Failed to stage create");
    session.commit().await.expect("Failed to commit seed");
}
