// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Time-partitioned folder keys.
//!
//! Jobs are stored below `<base>/<topic>/<year>/<month>/<day>/<hour>/<minute>`,
//! every component an unpadded decimal number (`2025/3/7/9/5`). Calendar
//! components are UTC.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Calendar position of a folder, down to the hour or the minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBucket {
    /// Year, e.g. 2025.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
    /// Hour, 0-23.
    pub hour: u32,
    /// Minute, 0-59, or `None` for an hour folder.
    pub minute: Option<u32>,
}

impl TimeBucket {
    /// Minute bucket containing `at`.
    pub fn minute_of(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
            day: at.day(),
            hour: at.hour(),
            minute: Some(at.minute()),
        }
    }

    /// Hour bucket containing `at`.
    pub fn hour_of(at: DateTime<Utc>) -> Self {
        Self {
            minute: None,
            ..Self::minute_of(at)
        }
    }

    /// The enclosing hour bucket.
    pub fn hour_bucket(&self) -> Self {
        Self {
            minute: None,
            ..*self
        }
    }

    /// Whether this is the minute bucket that closes its hour.
    pub fn is_last_minute_of_hour(&self) -> bool {
        self.minute == Some(59)
    }

    /// Relative path of this bucket: `year/month/day/hour[/minute]`.
    pub fn relative_path(&self) -> String {
        let mut path = format!("{}/{}/{}/{}", self.year, self.month, self.day, self.hour);
        if let Some(minute) = self.minute {
            path.push('/');
            path.push_str(&minute.to_string());
        }
        path
    }

    /// Absolute path of this bucket below a topic folder.
    pub fn path_under(&self, topic_path: &str) -> String {
        format!("{}/{}", topic_path, self.relative_path())
    }
}

/// Build a job id for a job created at `created`: `year/month/day/hour/minute/<suffix>`.
///
/// Ids built this way place a job inside the minute folder it was created in.
pub fn job_id(created: DateTime<Utc>, suffix: &str) -> String {
    format!("{}/{}", TimeBucket::minute_of(created).relative_path(), suffix)
}

/// Parse a folder name as a calendar component.
pub fn parse_component(name: &str) -> Option<u32> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Decides which folders of the time-partitioned tree are old enough to prune.
///
/// Each level is old if its enclosing level is old or if its own number is
/// below the current one. Hours get a grace window: the current hour and the
/// one before it are never old on their own account, since producers may
/// still be writing into them.
///
/// The hour rule only inherits oldness from an old day when the month is old
/// or the current hour is past midnight. Right after midnight the previous
/// day's late hours therefore stay until the next sweep, unless the day also
/// closed a month, in which case they are old immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeCutoff {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
}

impl AgeCutoff {
    /// Cutoff for a sweep starting at `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            year: now.year(),
            month: now.month(),
            day: now.day(),
            hour: now.hour(),
        }
    }

    /// Whether a year folder is old.
    pub fn year_is_old(&self, year: i64) -> bool {
        year < i64::from(self.year)
    }

    /// Whether a month folder is old.
    pub fn month_is_old(&self, year_old: bool, month: i64) -> bool {
        year_old || month < i64::from(self.month)
    }

    /// Whether a day folder is old.
    pub fn day_is_old(&self, month_old: bool, day: i64) -> bool {
        month_old || day < i64::from(self.day)
    }

    /// Whether an hour folder is old.
    pub fn hour_is_old(&self, day_old: bool, month_old: bool, hour: i64) -> bool {
        (day_old && (month_old || self.hour > 0)) || hour < i64::from(self.hour) - 1
    }
}
