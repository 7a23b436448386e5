//! Exclusion rules for source discovery
//!
//! Combines the root's `.gitignore`/`.ignore` files, build-output noise of JVM
//! projects and the user's `exclude` patterns into one gitignore matcher.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use tracing::warn;

const DEFAULT_EXCLUDES: &[&str] = &[
    // Build output and tool state
    "target/", "build/", "out/", "bin/", ".gradle/", ".mvn/", ".kotlin/",
    ".git/", ".idea/", ".vscode/", "node_modules/",
    // Generated sources
    "generated/", "generated-sources/",
];

#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    inner: Gitignore,
}

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        // Missing files are fine
        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        for pattern in DEFAULT_EXCLUDES {
            builder.add_line(None, pattern).ok();
        }
        for pattern in extra_excludes {
            if let Err(e) = builder.add_line(None, pattern) {
                warn!("Ignoring invalid exclude pattern '{}': {}", pattern, e);
            }
        }

        let inner = builder.build().unwrap_or_else(|e| {
            warn!("Failed to build exclude rules: {}", e);
            Gitignore::empty()
        });
        Self { inner }
    }

    /// Check a path under the root. Parent directories are matched too, so a
    /// file below an excluded directory is excluded.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner
            .matched_path_or_any_parents(path, is_dir)
            .is_ignore()
    }
}
