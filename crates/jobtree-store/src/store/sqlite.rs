// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SQLite-backed store implementation.

use std::path::Path;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::debug;

use super::{Properties, Resource, ResourceStore, StagedOp, Staging, StoreSession};
use crate::error::{Result, StoreError};
use crate::migrations;
use crate::path;

/// SQLite-backed store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store from an existing, already migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create and initialize a store from a file path.
    ///
    /// - Creates parent directories if they don't exist
    /// - Creates the database file if it doesn't exist
    /// - Runs all migrations
    ///
    /// ```ignore
    /// let store = SqliteStore::from_path(".data/jobtree.db").await?;
    /// ```
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Other(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        migrations::run_sqlite(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ResourceStore for SqliteStore {
    fn store_type(&self) -> &'static str {
        "sqlite"
    }

    async fn open(&self) -> Result<Box<dyn StoreSession>> {
        Ok(Box::new(SqliteSession {
            pool: self.pool.clone(),
            staging: Staging::default(),
        }))
    }
}

/// Session over a [`SqliteStore`].
pub struct SqliteSession {
    pool: SqlitePool,
    staging: Staging,
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn parse_properties(raw: &str) -> Result<Properties> {
    Ok(serde_json::from_str(raw)?)
}

impl SqliteSession {
    async fn committed(&self, node_path: &str) -> Result<Option<Properties>> {
        if node_path == path::ROOT {
            return Ok(Some(Properties::new()));
        }
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT properties
            FROM resources
            WHERE path = ?
            "#,
        )
        .bind(node_path)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(raw,)| parse_properties(&raw)).transpose()
    }
}

#[async_trait]
impl StoreSession for SqliteSession {
    async fn get(&mut self, node_path: &str) -> Result<Option<Resource>> {
        path::validate(node_path)?;
        let committed = self.committed(node_path).await?;
        Ok(self
            .staging
            .overlay_get(node_path, committed)
            .map(|props| Resource::new(node_path, props)))
    }

    async fn children(&mut self, node_path: &str) -> Result<Vec<Resource>> {
        path::validate(node_path)?;
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT path, properties
            FROM resources
            WHERE parent = ?
            ORDER BY path
            "#,
        )
        .bind(node_path)
        .fetch_all(&self.pool)
        .await?;

        let committed = rows
            .into_iter()
            .map(|(p, raw)| Ok(Resource::new(p, parse_properties(&raw)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.staging.overlay_children(node_path, committed))
    }

    async fn has_children(&mut self, node_path: &str) -> Result<bool> {
        if self.staging.ops().is_empty() {
            path::validate(node_path)?;
            let row: Option<(i64,)> =
                sqlx::query_as("SELECT 1 FROM resources WHERE parent = ? LIMIT 1")
                    .bind(node_path)
                    .fetch_optional(&self.pool)
                    .await?;
            return Ok(row.is_some());
        }
        Ok(!self.children(node_path).await?.is_empty())
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

        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await?;

        for op in self.staging.ops() {
            match op {
                StagedOp::Delete { path: target } => {
                    let result = sqlx::query(
                        r#"
                        DELETE FROM resources
                        WHERE path = ?1 OR path LIKE ?2 ESCAPE '\'
                        "#,
                    )
                    .bind(target.as_str())
                    .bind(format!("{}/%", escape_like(target)))
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Err(StoreError::conflict(
                            target.as_str(),
                            "resource already deleted",
                        ));
                    }
                }
                StagedOp::Create {
                    path: target,
                    properties,
                } => {
                    for ancestor in path::ancestors(target) {
                        sqlx::query(
                            r#"
                            INSERT OR IGNORE INTO resources (path, parent, properties)
                            VALUES (?, ?, '{}')
                            "#,
                        )
                        .bind(ancestor)
                        .bind(path::parent(ancestor).unwrap_or(path::ROOT))
                        .execute(&mut *tx)
                        .await?;
                    }

                    let result = sqlx::query(
                        r#"
                        INSERT OR IGNORE INTO resources (path, parent, properties)
                        VALUES (?, ?, ?)
                        "#,
                    )
                    .bind(target.as_str())
                    .bind(path::parent(target).unwrap_or(path::ROOT))
                    .bind(serde_json::to_string(properties)?)
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Err(StoreError::conflict(
                            target.as_str(),
                            "resource already exists",
                        ));
                    }
                }
            }
        }

        tx.commit().await?;

        debug!(operations = self.staging.len(), "Committed staged operations");
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
