//! Source file discovery by glob pattern.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// Which files under a root are eligible for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Glob patterns relative to the root, e.g. `backend/src/**/*.js`.
    pub patterns: Vec<String>,
    /// Directory names that exclude any path containing them.
    pub exclude_dirs: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            patterns: [
                "backend/src/**/*.js",
                "frontend/src/**/*.ts",
                "frontend/src/**/*.vue",
                "frontend/src/**/*.js",
                "database/schema.sql",
                "database/migrations/*.sql",
                "database/seed/*.js",
                "docs/llm-context/*.md",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            exclude_dirs: ["node_modules", ".git", "dist", "build", ".backup"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Collect files matching any pattern, sorted and deduplicated.
///
/// Returned paths are relative to `root`. Unreadable directory entries are
/// skipped with a warning.
///
/// # Errors
///
/// Returns an error if a pattern is not a valid glob.
pub fn collect_files(root: &Path, config: &CollectorConfig) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    // The root is literal; only the configured patterns may carry wildcards.
    let base = PathBuf::from(glob::Pattern::escape(&root.to_string_lossy()));

    for pattern in &config.patterns {
        let full = base.join(pattern);
        for entry in glob::glob(&full.to_string_lossy())? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("skipping unreadable path: {e}");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            if is_excluded(rel, &config.exclude_dirs) {
                continue;
            }
            files.insert(rel.to_path_buf());
        }
    }

    tracing::debug!(count = files.len(), "collected source files");
    Ok(files.into_iter().collect())
}

fn is_excluded(rel: &Path, exclude_dirs: &[String]) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(name) => exclude_dirs.iter().any(|d| name == d.as_str()),
        _ => false,
    })
}

/// Render a relative path with `/` separators for storage.
#[must_use]
pub fn display_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
