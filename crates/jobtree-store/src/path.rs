// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Path helpers.
//!
//! Paths are absolute and slash-delimited: `/var/eventing/jobs/locks`.
//! The root is `/`. Trailing slashes and empty segments are rejected.

use crate::error::{Result, StoreError};

/// The root path.
pub const ROOT: &str = "/";

/// Check that `path` is absolute and normalized.
pub fn validate(path: &str) -> Result<()> {
    if path == ROOT {
        return Ok(());
    }
    if !path.starts_with('/') || path.ends_with('/') || path[1..].split('/').any(str::is_empty) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Parent of `path`, or `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last segment of `path` (empty for the root).
pub fn name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// Append `child` to `parent`.
pub fn join(parent: &str, child: &str) -> String {
    if parent == ROOT {
        format!("/{}", child)
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Whether `path` lies strictly below `ancestor`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor == ROOT {
        return path != ROOT;
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// For a `path` strictly below `ancestor`, the path of the direct child of
/// `ancestor` on the way down to `path`.
pub fn child_towards<'a>(ancestor: &str, path: &'a str) -> Option<&'a str> {
    if !is_descendant(path, ancestor) {
        return None;
    }
    let start = if ancestor == ROOT { 1 } else { ancestor.len() + 1 };
    match path[start..].find('/') {
        Some(offset) => Some(&path[..start + offset]),
        None => Some(path),
    }
}

/// Proper ancestors of `path`, nearest to the root first, excluding the root.
pub fn ancestors(path: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut current = parent(path);
    while let Some(p) = current {
        if p == ROOT {
            break;
        }
        result.push(p);
        current = parent(p);
    }
    result.reverse();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(validate("/").is_ok());
        assert!(validate("/var/eventing").is_ok());
        assert!(validate("var").is_err());
        assert!(validate("/var/").is_err());
        assert!(validate("/var//jobs").is_err());
        assert!(validate("").is_err());
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent("/"), None);
        assert_eq!(parent("/var"), Some("/"));
        assert_eq!(parent("/var/eventing/jobs"), Some("/var/eventing"));
        assert_eq!(name("/var/eventing/jobs"), "jobs");
        assert_eq!(name("/"), "");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/", "var"), "/var");
        assert_eq!(join("/var", "eventing"), "/var/eventing");
    }

    #[test]
    fn test_is_descendant() {
        assert!(is_descendant("/a/b", "/a"));
        assert!(is_descendant("/a/b/c", "/a"));
        assert!(!is_descendant("/ab", "/a"));
        assert!(!is_descendant("/a", "/a"));
        assert!(is_descendant("/a", "/"));
        assert!(!is_descendant("/", "/"));
    }

    #[test]
    fn test_child_towards() {
        assert_eq!(child_towards("/a", "/a/b/c"), Some("/a/b"));
        assert_eq!(child_towards("/a", "/a/b"), Some("/a/b"));
        assert_eq!(child_towards("/", "/a/b"), Some("/a"));
        assert_eq!(child_towards("/a", "/b/c"), None);
    }

    #[test]
    fn test_ancestors() {
        assert_eq!(ancestors("/a/b/c"), vec!["/a", "/a/b"]);
        assert!(ancestors("/a").is_empty());
        assert!(ancestors("/").is_empty());
    }
}
