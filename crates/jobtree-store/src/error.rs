// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for jobtree-store.

use thiserror::Error;

/// Store errors.
///
/// Every variant is a persistence failure from the caller's point of view.
/// [`StoreError::Conflict`] is the retryable one: the session should be
/// refreshed and the work either retried or abandoned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// A staged operation no longer matches the committed tree
    /// (node already deleted, or already created by someone else).
    #[error("Conflict on {path}: {reason}")]
    Conflict {
        /// Path the conflicting operation targeted.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// The node does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The path is not an absolute, normalized path.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Property serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Build a conflict error.
    pub fn conflict(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conflict {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether refreshing the session and retrying could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::NotFound(_))
    }
}

/// Result type using StoreError.
pub type Result<T> = std::result::Result<T, StoreError>;
