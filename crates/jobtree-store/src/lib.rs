// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Jobtree Store - Hierarchical Resource Tree
//!
//! This crate provides the resource tree the job subsystem persists its state in.
//! Jobs, locks and the time-partitioned folders that hold jobs are all nodes
//! addressed by slash-delimited paths.
//!
//! # Sessions
//!
//! All access goes through a [`StoreSession`] obtained from a [`ResourceStore`].
//! A session stages creates and deletes locally; nothing is visible to other
//! sessions until [`StoreSession::commit`] succeeds. A failed commit leaves the
//! staged operations in place, and the caller is expected to call
//! [`StoreSession::refresh`] before doing anything else with the session.
//!
//! ```text
//!   open() ──► get / children / has_children     (reads see own staged ops)
//!          ──► create / delete                   (staged)
//!          ──► commit ──ok──► visible to everyone
//!                     └─err─► refresh (discard staged) ──► continue
//! ```
//!
//! # Backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | [`MemoryStore`] | In-process tree with fault injection, for tests and embedding |
//! | [`SqliteStore`] | Durable tree in a SQLite database |
//!
//! # Modules
//!
//! - [`batch`]: Batched delete helper
//! - [`error`]: Error types for store operations
//! - [`migrations`]: Embedded SQLite migrations
//! - [`path`]: Path validation and manipulation
//! - [`store`]: Store traits, resources and backends

#![deny(missing_docs)]

/// Batched delete helper.
pub mod batch;

/// Error types for store operations.
pub mod error;

/// Embedded database migrations.
pub mod migrations;

/// Path validation and manipulation.
pub mod path;

/// Store traits, resources and backend implementations.
pub mod store;

pub use batch::BatchRemover;
pub use error::{Result, StoreError};
pub use store::{MemoryStore, Properties, Resource, ResourceStore, SqliteStore, StoreSession};
