// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Jobtree Maintenance - Job Tree Retention
//!
//! This crate keeps the persisted job tree from growing without bound. Jobs
//! are stored in time-partitioned folders that are never cleaned up by the
//! producers or consumers themselves, and locks are left behind by instances
//! that died while holding them.
//!
//! # Tree Layout
//!
//! ```text
//! <root>/
//! ├── assigned/
//! │   └── <instance>/<topic>/<year>/<month>/<day>/<hour>/<minute>/<job>
//! ├── unassigned/
//! │   └── <topic>/<year>/<month>/<day>/<hour>/<minute>/<job>
//! └── locks/
//!     └── ... /<lock>          (carries `lock.created`)
//! ```
//!
//! # Maintenance Cadence
//!
//! | Tick | Work |
//! |------|------|
//! | every tick | Expired lock removal (leader only) |
//! | multiple of 5 | Incremental sweep of minute folders closed an hour ago |
//! | multiple of 60 | Full sweep of every old, empty folder |
//!
//! Folder sweeps cover this instance's assigned jobs; the leader also sweeps
//! the unassigned jobs. Work stops at the next liveness check once the
//! topology deactivates the capabilities it handed out.
//!
//! # Modules
//!
//! - [`bucket`]: Time bucket paths and folder age rules
//! - [`cadence`]: Which sweep runs on which tick
//! - [`capabilities`]: Leadership and liveness of this instance
//! - [`clock`]: Time source
//! - [`config`]: Jobs tree layout and process configuration
//! - [`error`]: Error types
//! - [`job`]: Job handle and property keys
//! - [`maintenance`]: Lock and folder sweeps
//! - [`maintenance_worker`]: Interval-driven background worker
//! - [`relocator`]: Moving jobs between instances

#![deny(missing_docs)]

/// Time bucket paths and folder age rules.
pub mod bucket;

/// Sweep selection per tick.
pub mod cadence;

/// Cluster topology capabilities.
pub mod capabilities;

/// Time source.
pub mod clock;

/// Layout and configuration.
pub mod config;

/// Error types.
pub mod error;

/// Job handle and property keys.
pub mod job;

/// Lock and folder sweeps.
pub mod maintenance;

/// Background maintenance worker.
pub mod maintenance_worker;

/// Job reassignment.
pub mod relocator;

pub use capabilities::{ClusterCapabilities, TopologyCapabilities};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigError, JobsLayout};
pub use error::{Result, RetentionError};
pub use job::Job;
pub use maintenance::{MaintenanceConfig, MaintenanceTask, SweepReport};
pub use maintenance_worker::{MaintenanceWorker, MaintenanceWorkerConfig};
pub use relocator::JobRelocator;
