//! Filesystem operations behind the tools.
//!
//! Every operation validates its path arguments against the allowed roots
//! before touching the filesystem.

use crate::error::FsError;
use crate::validate::{AllowedRoots, absolutize, validate_creatable, validate_path};
use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;
use similar::TextDiff;
use std::fmt;
use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

/// Separator between per-file blocks of `read_multiple_files`.
pub const FILE_SEPARATOR: &str = "\n---\n";

/// A single text edit operation.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditOperation {
    /// Text to search for; must match exactly.
    pub old_text: String,
    /// Text to replace it with.
    pub new_text: String,
}

/// Read a whole file as UTF-8 text.
pub async fn read_file(roots: &AllowedRoots, path: &str) -> Result<String, FsError> {
    let path = validate_path(path, roots)?;
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| FsError::io(&path, e))
}

/// Read each path independently; a failure only affects its own block.
pub async fn read_multiple_files(roots: &AllowedRoots, paths: &[String]) -> String {
    let mut blocks = Vec::with_capacity(paths.len());
    for requested in paths {
        match read_file(roots, requested).await {
            Ok(content) => blocks.push(format!("{requested}:\n{content}")),
            Err(e) => blocks.push(format!("{requested}: Error - {e}")),
        }
    }
    blocks.join(FILE_SEPARATOR)
}

/// Create or truncate a file and write `content` to it.
pub async fn write_file(roots: &AllowedRoots, path: &str, content: &str) -> Result<String, FsError> {
    let target = validate_path(path, roots)?;
    tokio::fs::write(&target, content)
        .await
        .map_err(|e| FsError::io(&target, e))?;
    Ok(format!("Successfully wrote to {path}"))
}

/// Apply `edits` in order and return a unified diff of the result.
///
/// The first edit whose old text is missing aborts the whole set; the file
/// is only rewritten when every edit applied and `dry_run` is false.
pub async fn edit_file(
    roots: &AllowedRoots,
    path: &str,
    edits: &[EditOperation],
    dry_run: bool,
) -> Result<String, FsError> {
    let target = validate_path(path, roots)?;
    let original = tokio::fs::read_to_string(&target)
        .await
        .map_err(|e| FsError::io(&target, e))?;
    let modified = apply_edits(&original, edits)?;
    let diff = unified_diff(&original, &modified, path);

    if !dry_run && modified != original {
        tokio::fs::write(&target, &modified)
            .await
            .map_err(|e| FsError::io(&target, e))?;
    }
    if diff.is_empty() {
        return Ok(format!("No changes to {path}"));
    }
    Ok(diff)
}

/// Replace the first occurrence of each edit's old text, in order.
pub fn apply_edits(content: &str, edits: &[EditOperation]) -> Result<String, FsError> {
    let mut content = content.to_owned();
    for (index, edit) in edits.iter().enumerate() {
        if edit.old_text.is_empty() || !content.contains(&edit.old_text) {
            return Err(FsError::EditMismatch {
                index,
                old_text: edit.old_text.clone(),
            });
        }
        content = content.replacen(&edit.old_text, &edit.new_text, 1);
    }
    Ok(content)
}

fn unified_diff(original: &str, modified: &str, label: &str) -> String {
    let label = label.trim_start_matches('/');
    let diff = TextDiff::from_lines(original, modified);
    diff.unified_diff()
        .context_radius(3)
        .header(&format!("a/{label}"), &format!("b/{label}"))
        .to_string()
}

/// Create a directory along with any missing parents; existing is fine.
pub async fn create_directory(roots: &AllowedRoots, path: &str) -> Result<String, FsError> {
    let target = validate_creatable(path, roots)?;
    tokio::fs::create_dir_all(&target)
        .await
        .map_err(|e| FsError::io(&target, e))?;
    Ok(format!("Successfully created directory {path}"))
}

/// Immediate children of a directory, sorted by name and tagged by type.
pub async fn list_directory(roots: &AllowedRoots, path: &str) -> Result<String, FsError> {
    let dir = validate_path(path, roots)?;
    let mut read_dir = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| FsError::io(&dir, e))?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| FsError::io(&dir, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        let ft = entry
            .file_type()
            .await
            .map_err(|e| FsError::io(&entry.path(), e))?;
        entries.push((name, ft.is_dir()));
    }
    entries.sort();
    Ok(entries
        .into_iter()
        .map(|(name, is_dir)| {
            if is_dir {
                format!("[DIR] {name}")
            } else {
                format!("[FILE] {name}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Rename `source` to `destination`, refusing to replace an existing entry.
pub async fn move_file(
    roots: &AllowedRoots,
    source: &str,
    destination: &str,
) -> Result<String, FsError> {
    let from = validate_path(source, roots)?;
    let to = validate_path(destination, roots)?;
    // `to` may be the target of a dangling link; the link itself still occupies
    // the requested name.
    let requested = absolutize(Path::new(destination))?;
    for occupied in [&requested, &to] {
        if tokio::fs::symlink_metadata(occupied).await.is_ok() {
            return Err(FsError::AlreadyExists(occupied.clone()));
        }
    }
    tokio::fs::symlink_metadata(&from)
        .await
        .map_err(|e| FsError::io(&from, e))?;
    tokio::fs::rename(&from, &to)
        .await
        .map_err(|e| FsError::io(&from, e))?;
    tracing::debug!(from = %from.display(), to = %to.display(), "moved");
    Ok(format!("Successfully moved {source} to {destination}"))
}

/// Metadata reported by `get_file_info`.
#[derive(Debug)]
pub struct FileInfo {
    pub size: u64,
    pub created: Option<SystemTime>,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
    pub is_directory: bool,
    pub is_file: bool,
    pub permissions: String,
}

impl From<&Metadata> for FileInfo {
    fn from(meta: &Metadata) -> Self {
        Self {
            size: meta.len(),
            created: meta.created().ok(),
            modified: meta.modified().ok(),
            accessed: meta.accessed().ok(),
            is_directory: meta.is_dir(),
            is_file: meta.is_file(),
            permissions: permission_bits(meta),
        }
    }
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "size: {}", self.size)?;
        writeln!(f, "created: {}", timestamp(self.created))?;
        writeln!(f, "modified: {}", timestamp(self.modified))?;
        writeln!(f, "accessed: {}", timestamp(self.accessed))?;
        writeln!(f, "isDirectory: {}", self.is_directory)?;
        writeln!(f, "isFile: {}", self.is_file)?;
        write!(f, "permissions: {}", self.permissions)
    }
}

fn timestamp(time: Option<SystemTime>) -> String {
    time.map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339())
        .unwrap_or_else(|| "unavailable".into())
}

#[cfg(unix)]
fn permission_bits(meta: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permission_bits(meta: &Metadata) -> String {
    if meta.permissions().readonly() {
        "444".into()
    } else {
        "666".into()
    }
}

/// Size, timestamps, type and permission bits of a file or directory.
pub async fn get_file_info(roots: &AllowedRoots, path: &str) -> Result<FileInfo, FsError> {
    let target = validate_path(path, roots)?;
    let meta = tokio::fs::metadata(&target)
        .await
        .map_err(|e| FsError::io(&target, e))?;
    Ok(FileInfo::from(&meta))
}

/// The resolved allowed roots, one per line.
pub fn list_allowed_directories(roots: &AllowedRoots) -> String {
    roots
        .dirs()
        .iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
