// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Empty folder removal for the time-partitioned jobs tree.

use jobtree_store::{Resource, StoreSession};
use tracing::debug;

use super::{MaintenanceTask, SweepReport};
use crate::bucket::{AgeCutoff, TimeBucket, parse_component};
use crate::capabilities::TopologyCapabilities;
use crate::error::Result;

/// How far back the incremental sweep looks.
const INCREMENTAL_DELAY_HOURS: i64 = 1;

/// Minute buckets probed per topic by one incremental sweep. Matches the
/// incremental cadence, so consecutive sweeps cover every minute once.
const INCREMENTAL_WINDOW_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Base,
    Topic,
    Year,
    Month,
    Day,
    Hour,
    Minute,
}

impl Level {
    fn child(self) -> Option<Self> {
        match self {
            Self::Base => Some(Self::Topic),
            Self::Topic => Some(Self::Year),
            Self::Year => Some(Self::Month),
            Self::Month => Some(Self::Day),
            Self::Day => Some(Self::Hour),
            Self::Hour => Some(Self::Minute),
            Self::Minute => None,
        }
    }
}

/// Oldness inherited from enclosing folders.
#[derive(Debug, Clone, Copy, Default)]
struct Ancestry {
    year_old: bool,
    month_old: bool,
    day_old: bool,
}

/// A folder whose children are being visited.
struct Frame {
    path: String,
    level: Level,
    old: bool,
    ancestry: Ancestry,
    children: std::vec::IntoIter<Resource>,
}

impl MaintenanceTask {
    /// Remove empty minute folders from an hour ago.
    ///
    /// For every topic below `base_path`, probes the five minute buckets
    /// ending one hour before now. When a probed bucket closes its hour, the
    /// hour folder is probed as well. Each delete is committed on its own.
    pub async fn incremental_folder_sweep(
        &self,
        caps: &dyn TopologyCapabilities,
        base_path: &str,
    ) -> Result<SweepReport> {
        debug!(base_path, "Cleaning up job resource tree: looking for empty folders");

        let mut report = SweepReport::default();
        let mut session = self.store.open().await?;
        if session.get(base_path).await?.is_none() {
            return Ok(report);
        }

        let start = self.clock.now() - chrono::Duration::hours(INCREMENTAL_DELAY_HOURS);

        for topic in session.children(base_path).await? {
            for step in 0..INCREMENTAL_WINDOW_MINUTES {
                if !caps.is_active() {
                    return Ok(report.interrupted());
                }

                let bucket = TimeBucket::minute_of(start - chrono::Duration::minutes(step));
                if delete_if_empty(session.as_mut(), &bucket.path_under(&topic.path)).await? {
                    report.deleted += 1;
                }

                if bucket.is_last_minute_of_hour() {
                    let hour_path = bucket.hour_bucket().path_under(&topic.path);
                    if delete_if_empty(session.as_mut(), &hour_path).await? {
                        report.deleted += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    /// Remove every empty, old folder below `base_path`.
    ///
    /// Walks topic, year, month, day, hour and minute folders. Minutes are only
    /// visited inside old hours. After its children have been visited, an old
    /// year, month, day or hour folder is deleted if it is empty by then.
    /// Topics are never deleted.
    pub async fn full_folder_sweep(
        &self,
        caps: &dyn TopologyCapabilities,
        base_path: &str,
    ) -> Result<SweepReport> {
        debug!(base_path, "Cleaning up job resource tree: removing ALL empty folders");

        let mut report = SweepReport::default();
        let mut session = self.store.open().await?;
        if session.get(base_path).await?.is_none() {
            return Ok(report);
        }

        let cutoff = AgeCutoff::at(self.clock.now());
        let topics = session.children(base_path).await?;
        let mut stack = vec![Frame {
            path: base_path.to_string(),
            level: Level::Base,
            old: false,
            ancestry: Ancestry::default(),
            children: topics.into_iter(),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.children.next() else {
                let done = stack.pop();
                if let Some(done) = done.filter(|f| f.old) {
                    if !caps.is_active() {
                        return Ok(report.interrupted());
                    }
                    if delete_if_empty(session.as_mut(), &done.path).await? {
                        report.deleted += 1;
                    }
                }
                continue;
            };

            if !caps.is_active() {
                return Ok(report.interrupted());
            }

            let Some(level) = frame.level.child() else {
                continue;
            };

            if level == Level::Minute {
                if delete_if_empty(session.as_mut(), &child.path).await? {
                    report.deleted += 1;
                }
                continue;
            }

            let Some((old, ancestry)) = classify(level, child.name(), frame.ancestry, &cutoff)
            else {
                debug!(path = %child.path, "Skipping folder with a non-numeric name");
                continue;
            };

            let children = if level == Level::Hour && !old {
                Vec::new()
            } else {
                session.children(&child.path).await?
            };

            stack.push(Frame {
                path: child.path,
                level,
                old,
                ancestry,
                children: children.into_iter(),
            });
        }

        Ok(report)
    }
}

/// Work out a child folder's oldness and what it passes on to its own
/// children. `None` for a calendar folder with a non-numeric name.
fn classify(
    level: Level,
    name: &str,
    parent: Ancestry,
    cutoff: &AgeCutoff,
) -> Option<(bool, Ancestry)> {
    if level == Level::Topic {
        return Some((false, parent));
    }

    let number = i64::from(parse_component(name)?);
    match level {
        Level::Year => {
            let old = cutoff.year_is_old(number);
            Some((
                old,
                Ancestry {
                    year_old: old,
                    ..parent
                },
            ))
        }
        Level::Month => {
            let old = cutoff.month_is_old(parent.year_old, number);
            Some((
                old,
                Ancestry {
                    month_old: old,
                    ..parent
                },
            ))
        }
        Level::Day => {
            let old = cutoff.day_is_old(parent.month_old, number);
            Some((
                old,
                Ancestry {
                    day_old: old,
                    ..parent
                },
            ))
        }
        Level::Hour => Some((
            cutoff.hour_is_old(parent.day_old, parent.month_old, number),
            parent,
        )),
        Level::Base | Level::Topic | Level::Minute => None,
    }
}

/// Delete and commit `path` if it exists and has no children.
async fn delete_if_empty(session: &mut dyn StoreSession, path: &str) -> Result<bool> {
    if session.get(path).await?.is_none() || session.has_children(path).await? {
        return Ok(false);
    }
    session.delete(path).await?;
    session.commit().await?;
    debug!(path, "Removed empty folder");
    Ok(true)
}
