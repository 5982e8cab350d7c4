//! Name search for the `search_files` tool.

use crate::error::FsError;
use crate::validate::{AllowedRoots, validate_path};
use glob::Pattern;
use std::path::PathBuf;

/// Result text when nothing matched.
pub const NO_MATCHES: &str = "No matches found";

/// Compiled exclusion globs, matched against `/`-separated paths relative
/// to the search root.
#[derive(Debug, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// Compile the patterns. A pattern without glob metacharacters names an
    /// entry and matches it at any depth, along with everything below it.
    pub fn new(raw: &[String]) -> Result<Self, FsError> {
        let mut patterns = Vec::new();
        for pat in raw {
            let widened = if pat.contains(['*', '?', '[']) {
                vec![pat.clone()]
            } else {
                let name = pat.trim_matches('/');
                vec![
                    name.to_owned(),
                    format!("**/{name}"),
                    format!("{name}/**"),
                    format!("**/{name}/**"),
                ]
            };
            for glob in widened {
                let compiled = Pattern::new(&glob).map_err(|e| {
                    FsError::Schema(format!("invalid exclude pattern {pat:?}: {e}"))
                })?;
                patterns.push(compiled);
            }
        }
        Ok(Self { patterns })
    }

    pub fn matches(&self, relative: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(relative))
    }
}

/// Find entries below `path` whose name contains `pattern`, ignoring case.
///
/// The walk uses an explicit stack. Excluded entries are dropped together
/// with their subtree; entries failing validation (such as symlinks that
/// leave the allowed roots) are skipped, and symlinked directories are not
/// descended.
pub async fn search_files(
    roots: &AllowedRoots,
    path: &str,
    pattern: &str,
    exclude_patterns: &[String],
) -> Result<Vec<PathBuf>, FsError> {
    let base = validate_path(path, roots)?;
    let excludes = ExcludeSet::new(exclude_patterns)?;
    let needle = pattern.to_lowercase();

    let mut matches = Vec::new();
    let mut pending = vec![base.clone()];
    while let Some(dir) = pending.pop() {
        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) => {
                tracing::debug!(path = %dir.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };
        let mut entries = Vec::new();
        while let Ok(Some(entry)) = read_dir.next_entry().await {
            entries.push(entry);
        }
        entries.sort_by_key(|entry| entry.file_name());

        let mut subdirs = Vec::new();
        for entry in entries {
            let entry_path = entry.path();
            let Some(requested) = entry_path.to_str() else {
                continue;
            };
            let Ok(validated) = validate_path(requested, roots) else {
                continue;
            };
            let relative = entry_path
                .strip_prefix(&base)
                .map(|rel| rel.to_string_lossy().into_owned())
                .unwrap_or_default();
            if excludes.matches(&relative) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_lowercase();
            if name.contains(&needle) {
                matches.push(validated);
            }
            if entry.file_type().await.is_ok_and(|ft| ft.is_dir()) {
                subdirs.push(entry_path);
            }
        }
        pending.extend(subdirs.into_iter().rev());
    }
    Ok(matches)
}
