// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Cluster topology capabilities.
//!
//! Maintenance asks two questions of the topology before doing any work:
//! is this instance the leader, and should it still be running. The second
//! is checked before every unit of work; once it turns false, sweeps stop
//! without deleting anything further.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Leadership and liveness of this instance.
pub trait TopologyCapabilities: Send + Sync {
    /// Whether this instance is the cluster leader.
    fn is_leader(&self) -> bool;

    /// Whether work should continue.
    fn is_active(&self) -> bool;
}

/// Current capabilities, or `None` while no topology is known.
pub type CapabilitiesSnapshot = Option<Arc<dyn TopologyCapabilities>>;

/// Publishes capability snapshots to maintenance.
pub type CapabilitiesSender = watch::Sender<CapabilitiesSnapshot>;

/// Observes the latest capability snapshot.
pub type CapabilitiesReceiver = watch::Receiver<CapabilitiesSnapshot>;

/// Create a snapshot channel seeded with `initial`.
pub fn channel(initial: CapabilitiesSnapshot) -> (CapabilitiesSender, CapabilitiesReceiver) {
    watch::channel(initial)
}

/// Flag-backed capabilities.
///
/// Active on creation. [`ClusterCapabilities::deactivate`] is one-way: a
/// topology change publishes a new instance instead of reactivating the old one.
#[derive(Debug)]
pub struct ClusterCapabilities {
    leader: AtomicBool,
    active: AtomicBool,
}

impl ClusterCapabilities {
    /// Create active capabilities.
    pub fn new(leader: bool) -> Self {
        Self {
            leader: AtomicBool::new(leader),
            active: AtomicBool::new(true),
        }
    }

    /// Change leadership.
    pub fn set_leader(&self, leader: bool) {
        self.leader.store(leader, Ordering::SeqCst);
    }

    /// Stop all work at its next liveness check.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl TopologyCapabilities for ClusterCapabilities {
    fn is_leader(&self) -> bool {
        self.leader.load(Ordering::SeqCst)
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
