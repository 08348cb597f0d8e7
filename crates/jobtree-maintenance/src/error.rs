// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for jobtree-maintenance.

use jobtree_store::StoreError;
use thiserror::Error;

/// Errors that end a sweep early.
///
/// Losing liveness is not an error; sweeps report it through
/// [`crate::maintenance::SweepReport::interrupted`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RetentionError {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A configured age does not fit a calendar duration.
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
}

impl RetentionError {
    /// Whether the failure came from a store conflict that a later tick may not hit.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }
}

/// Result type using RetentionError.
pub type Result<T> = std::result::Result<T, RetentionError>;
