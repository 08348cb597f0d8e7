// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Which folder sweep a maintenance tick performs.

/// Ticks between full folder sweeps.
pub const FULL_SWEEP_EVERY: u64 = 60;

/// Ticks between incremental folder sweeps.
pub const INCREMENTAL_SWEEP_EVERY: u64 = 5;

/// Folder work selected for one tick. The lock sweep runs on every tick
/// regardless of phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    /// Walk the whole time-partitioned tree.
    Full,
    /// Probe the few buckets that closed an hour ago.
    Incremental,
    /// No folder sweep this tick.
    LocksOnly,
}

impl SweepPhase {
    /// Phase for a tick counter value.
    pub fn for_tick(tick: u64) -> Self {
        if tick % FULL_SWEEP_EVERY == 0 {
            Self::Full
        } else if tick % INCREMENTAL_SWEEP_EVERY == 0 {
            Self::Incremental
        } else {
            Self::LocksOnly
        }
    }

    /// Short name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
            Self::LocksOnly => "locks_only",
        }
    }
}
