//! Error taxonomy shared by path validation, file operations and the tool
//! gateway.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while validating paths or executing filesystem tools.
#[derive(Error, Debug)]
pub enum FsError {
    /// The path, its real target, or its parent lies outside every allowed root.
    #[error("Access denied - {0}")]
    AccessDenied(String),
    /// Neither the target nor its parent directory exists.
    #[error("{0}")]
    NotFound(String),
    /// The destination of a move already exists.
    #[error("Destination already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    /// An I/O failure unrelated to sandboxing.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An edit's old text could not be located in the current content.
    #[error("Edit {index} failed: text not found in file: {old_text:?}")]
    EditMismatch { index: usize, old_text: String },
    /// Tool arguments did not match the tool's schema.
    #[error("Invalid arguments: {0}")]
    Schema(String),
    /// No tool is registered under this name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl FsError {
    /// Wrap an I/O error for `path`, keeping missing targets distinct.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return FsError::NotFound(format!("No such file or directory: {}", path.display()));
        }
        FsError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Text placed in an error-flagged tool result.
    pub fn to_tool_text(&self) -> String {
        format!("Error: {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::FsError;
    use std::io;
    use std::path::Path;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err = FsError::io(Path::new("/x/y"), io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, FsError::NotFound(_)));
    }

    #[test]
    fn io_permission_keeps_source() {
        let err = FsError::io(
            Path::new("/x/y"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, FsError::Io { .. }));
        assert!(err.to_string().starts_with("/x/y: "));
    }

    #[test]
    fn tool_text_is_prefixed() {
        let err = FsError::UnknownTool("nope".into());
        assert_eq!(err.to_tool_text(), "Error: Unknown tool: nope");
    }
}
