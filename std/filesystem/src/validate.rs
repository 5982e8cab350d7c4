//! Path validation and security for the filesystem MCP server.
//!
//! All filesystem operations must pass through [`validate_path`] (or
//! [`validate_creatable`] for directory creation) to ensure the requested
//! path is within the server's allowed directories.

use crate::error::FsError;
use std::path::{Component, Path, PathBuf};

/// Upper bound on dangling-symlink hops, matching Linux's `SYMLOOP_MAX`.
const MAX_SYMLINK_HOPS: usize = 40;

/// The set of directories the server may touch, fixed at startup.
///
/// Roots are stored in their real (symlink-resolved) form. When a root was
/// given through a symlinked path, that spelling is kept as an alias so the
/// nominal check in [`validate_path`] accepts it; the real-path check only
/// ever trusts the resolved roots.
#[derive(Debug, Clone, Default)]
pub struct AllowedRoots {
    roots: Vec<PathBuf>,
    aliases: Vec<PathBuf>,
}

impl AllowedRoots {
    /// Resolve each directory, failing if one is missing or not a directory.
    pub fn new<I, P>(dirs: I) -> Result<Self, FsError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut roots = Vec::new();
        let mut aliases = Vec::new();
        for dir in dirs {
            let nominal = absolutize(dir.as_ref())?;
            let real = nominal
                .canonicalize()
                .map_err(|e| FsError::io(&nominal, e))?;
            if !real.is_dir() {
                return Err(FsError::NotFound(format!(
                    "Not a directory: {}",
                    real.display()
                )));
            }
            if nominal != real && !aliases.contains(&nominal) {
                aliases.push(nominal);
            }
            if !roots.contains(&real) {
                roots.push(real);
            }
        }
        Ok(Self { roots, aliases })
    }

    /// The resolved root directories, in the order given at startup.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.roots
    }

    fn admits_nominal(&self, path: &Path) -> bool {
        self.roots
            .iter()
            .chain(&self.aliases)
            .any(|root| path.starts_with(root))
    }

    fn admits_real(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(root))
    }
}

/// Validate that a path is within the allowed directories.
///
/// Steps:
/// 1. Reject paths containing null bytes
/// 2. Expand `~`, absolutize against the working directory and fold
///    `.`/`..` lexically
/// 3. Check the normalized path against the allowed roots
/// 4. Canonicalize the path and re-check the real location
///    - If the path does not exist, check the parent directory instead
///    - If the path is a dangling symlink, check where it points
pub fn validate_path(requested: &str, roots: &AllowedRoots) -> Result<PathBuf, FsError> {
    let candidate = nominal_candidate(requested, roots)?;
    match candidate.canonicalize() {
        Ok(real) => {
            ensure_real(&real, roots, "symlink target outside allowed directories")?;
            Ok(real)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            resolve_missing(candidate, roots, 0)
        }
        Err(e) => Err(FsError::io(&candidate, e)),
    }
}

/// Validate a path that may be several levels away from existing.
///
/// Walks up to the nearest ancestor that exists and requires its real
/// location to be inside the allowed roots. Used for directory creation,
/// where intermediate segments are created on demand.
pub fn validate_creatable(requested: &str, roots: &AllowedRoots) -> Result<PathBuf, FsError> {
    let candidate = nominal_candidate(requested, roots)?;
    let mut ancestor = candidate.as_path();
    while std::fs::symlink_metadata(ancestor).is_err() {
        ancestor = ancestor.parent().ok_or_else(|| {
            FsError::NotFound(format!("No existing ancestor for {}", candidate.display()))
        })?;
    }
    let real = ancestor
        .canonicalize()
        .map_err(|e| FsError::io(ancestor, e))?;
    ensure_real(&real, roots, "path outside allowed directories")?;
    if ancestor == candidate {
        Ok(real)
    } else {
        Ok(candidate)
    }
}

/// Expand a leading `~` to the current user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.parent().is_some() {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Expand, absolutize and lexically normalize a path without resolving links.
pub fn absolutize(path: &Path) -> Result<PathBuf, FsError> {
    let expanded = expand_home(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = std::env::current_dir().map_err(|e| FsError::io(Path::new("."), e))?;
        cwd.join(expanded)
    };
    Ok(normalize(&absolute))
}

fn nominal_candidate(requested: &str, roots: &AllowedRoots) -> Result<PathBuf, FsError> {
    if requested.contains('\0') {
        return Err(FsError::AccessDenied("path contains a null byte".into()));
    }
    let candidate = absolutize(Path::new(requested))?;
    if !roots.admits_nominal(&candidate) {
        return Err(FsError::AccessDenied(format!(
            "path outside allowed directories: {}",
            candidate.display()
        )));
    }
    Ok(candidate)
}

fn ensure_real(real: &Path, roots: &AllowedRoots, reason: &str) -> Result<(), FsError> {
    if roots.admits_real(real) {
        Ok(())
    } else {
        Err(FsError::AccessDenied(format!("{reason}: {}", real.display())))
    }
}

/// The leaf does not exist: trust it only if its parent resolves inside a root.
fn resolve_missing(
    candidate: PathBuf,
    roots: &AllowedRoots,
    hops: usize,
) -> Result<PathBuf, FsError> {
    let is_symlink = std::fs::symlink_metadata(&candidate)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false);
    if is_symlink {
        return follow_dangling(&candidate, roots, hops);
    }

    let parent = candidate.parent().ok_or_else(|| {
        FsError::NotFound(format!(
            "Parent directory does not exist: {}",
            candidate.display()
        ))
    })?;
    let real_parent = parent.canonicalize().map_err(|_| {
        FsError::NotFound(format!(
            "Parent directory does not exist: {}",
            parent.display()
        ))
    })?;
    ensure_real(
        &real_parent,
        roots,
        "parent directory outside allowed directories",
    )?;
    Ok(candidate)
}

/// A symlink whose target is missing: validate the target location itself,
/// so that writing through the returned path cannot land outside a root.
fn follow_dangling(link: &Path, roots: &AllowedRoots, hops: usize) -> Result<PathBuf, FsError> {
    if hops >= MAX_SYMLINK_HOPS {
        return Err(FsError::Io {
            path: link.to_path_buf(),
            source: std::io::Error::other("too many levels of symbolic links"),
        });
    }
    let target = std::fs::read_link(link).map_err(|e| FsError::io(link, e))?;
    let target = match link.parent() {
        Some(parent) if target.is_relative() => parent.join(target),
        _ => target,
    };
    let target = normalize(&target);
    match target.canonicalize() {
        Ok(real) => {
            ensure_real(&real, roots, "symlink target outside allowed directories")?;
            Ok(real)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            resolve_missing(target, roots, hops + 1)
        }
        Err(e) => Err(FsError::io(&target, e)),
    }
}
