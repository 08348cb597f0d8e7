// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for jobtree-maintenance.

use std::path::PathBuf;

use jobtree_store::path;

use crate::maintenance::MaintenanceConfig;
use crate::maintenance_worker::MaintenanceWorkerConfig;

/// Default root of the jobs tree.
pub const DEFAULT_JOBS_ROOT: &str = "/var/eventing/jobs";

/// Where jobs and locks live in the resource tree.
///
/// ```text
/// <root>/assigned/<instance>/<topic>/...   jobs assigned to an instance
/// <root>/unassigned/<topic>/...            jobs no instance has claimed
/// <root>/locks/...                         lock nodes
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsLayout {
    root: String,
    instance_id: String,
}

impl JobsLayout {
    /// Create a layout rooted at `root` for instance `instance_id`.
    pub fn new(
        root: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let root = root.into();
        let instance_id = instance_id.into();
        if path::validate(&root).is_err() || root == path::ROOT {
            return Err(ConfigError::InvalidJobsRoot(root));
        }
        if instance_id.is_empty() || instance_id.contains('/') {
            return Err(ConfigError::InvalidInstanceId(instance_id));
        }
        Ok(Self { root, instance_id })
    }

    /// This instance's id.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Root of the jobs tree.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Parent of every instance's assigned jobs.
    pub fn assigned_jobs_path(&self) -> String {
        path::join(&self.root, "assigned")
    }

    /// Jobs assigned to this instance.
    pub fn local_jobs_path(&self) -> String {
        path::join(&self.assigned_jobs_path(), &self.instance_id)
    }

    /// Jobs not assigned to any instance.
    pub fn unassigned_jobs_path(&self) -> String {
        path::join(&self.root, "unassigned")
    }

    /// Root of the lock tree.
    pub fn locks_path(&self) -> String {
        path::join(&self.root, "locks")
    }

    /// Where a job belongs for a given target instance.
    ///
    /// Slashes in the topic are replaced by dots so a topic is one folder.
    pub fn unique_path(&self, target: Option<&str>, topic: &str, job_id: &str) -> String {
        let base = match target {
            Some(target) => path::join(&self.assigned_jobs_path(), target),
            None => self.unassigned_jobs_path(),
        };
        format!("{}/{}/{}", base, topic.replace('/', "."), job_id)
    }
}

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file backing the resource tree.
    pub database_path: PathBuf,
    /// Jobs tree layout for this instance.
    pub layout: JobsLayout,
    /// Whether this instance starts out as cluster leader.
    pub leader: bool,
    /// Sweep tuning.
    pub maintenance: MaintenanceConfig,
    /// Scheduling of maintenance runs.
    pub worker: MaintenanceWorkerConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `JOBTREE_DATABASE_PATH`: SQLite file (default: `.data/jobtree.db`)
    /// - `JOBTREE_JOBS_ROOT`: jobs tree root (default: `/var/eventing/jobs`)
    /// - `JOBTREE_INSTANCE_ID`: this instance's id (default: random UUID)
    /// - `JOBTREE_LEADER`: "true"/"1" or "false"/"0" (default: false)
    ///
    /// Sweep and scheduling settings are read by [`MaintenanceConfig::from_env`]
    /// and [`MaintenanceWorkerConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_path = std::env::var("JOBTREE_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".data/jobtree.db"));

        let root =
            std::env::var("JOBTREE_JOBS_ROOT").unwrap_or_else(|_| DEFAULT_JOBS_ROOT.to_string());

        let instance_id = std::env::var("JOBTREE_INSTANCE_ID")
            .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

        let leader = match std::env::var("JOBTREE_LEADER") {
            Ok(v) => parse_bool(&v).ok_or(ConfigError::InvalidBool {
                var: "JOBTREE_LEADER",
                value: v,
            })?,
            Err(_) => false,
        };

        Ok(Self {
            database_path,
            layout: JobsLayout::new(root, instance_id)?,
            leader,
            maintenance: MaintenanceConfig::from_env(),
            worker: MaintenanceWorkerConfig::from_env(),
        })
    }
}

/// Parse "true"/"1"/"false"/"0".
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The jobs root is not an absolute path below `/`.
    #[error("Invalid jobs root: {0:?}")]
    InvalidJobsRoot(String),
    /// The instance id is empty or contains a slash.
    #[error("Invalid instance id: {0:?}")]
    InvalidInstanceId(String),
    /// A boolean variable has an unrecognized value.
    #[error("Invalid boolean for {var}: {value:?}")]
    InvalidBool {
        /// Variable name.
        var: &'static str,
        /// Value found.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> JobsLayout {
        JobsLayout::new("/var/eventing/jobs", "inst-a").unwrap()
    }

    #[test]
    fn test_layout_paths() {
        let layout = layout();
        assert_eq!(layout.assigned_jobs_path(), "/var/eventing/jobs/assigned");
        assert_eq!(layout.local_jobs_path(), "/var/eventing/jobs/assigned/inst-a");
        assert_eq!(layout.unassigned_jobs_path(), "/var/eventing/jobs/unassigned");
        assert_eq!(layout.locks_path(), "/var/eventing/jobs/locks");
    }

    #[test]
    fn test_unique_path() {
        let layout = layout();
        assert_eq!(
            layout.unique_path(Some("inst-b"), "org/example/import", "2025/3/7/9/5/inst-a_1"),
            "/var/eventing/jobs/assigned/inst-b/org.example.import/2025/3/7/9/5/inst-a_1"
        );
        assert_eq!(
            layout.unique_path(None, "import", "2025/3/7/9/5/inst-a_1"),
            "/var/eventing/jobs/unassigned/import/2025/3/7/9/5/inst-a_1"
        );
    }

    #[test]
    fn test_layout_validation() {
        assert!(matches!(
            JobsLayout::new("relative", "a"),
            Err(ConfigError::InvalidJobsRoot(_))
        ));
        assert!(matches!(
            JobsLayout::new("/", "a"),
            Err(ConfigError::InvalidJobsRoot(_))
        ));
        assert!(matches!(
            JobsLayout::new("/jobs", "a/b"),
            Err(ConfigError::InvalidInstanceId(_))
        ));
        assert!(matches!(
            JobsLayout::new("/jobs", ""),
            Err(ConfigError::InvalidInstanceId(_))
        ));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("yes"), None);
    }
}
