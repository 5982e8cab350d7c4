//! Tool implementations for the filesystem MCP server.

use crate::FilesystemServer;
use crate::ops::{self, EditOperation};
use crate::search::{self, NO_MATCHES};
use crate::tree;
use crate::validate::AllowedRoots;
use rmcp::{
    handler::server::wrapper::Parameters,
    schemars::{self, JsonSchema},
    tool, tool_router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Parameters for reading a single file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    /// Path to the file to read.
    pub path: String,
}

/// Parameters for reading multiple files.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadMultipleFilesParams {
    /// Paths to the files to read.
    pub paths: Vec<String>,
}

/// Parameters for writing a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileParams {
    /// Path to the file to write.
    pub path: String,
    /// Content to write to the file.
    pub content: String,
}

/// Parameters for editing a file.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditFileParams {
    /// Path to the file to edit.
    pub path: String,
    /// Edits to apply sequentially.
    pub edits: Vec<EditOperation>,
    /// Preview changes as a diff without writing.
    #[serde(default)]
    pub dry_run: bool,
}

/// Parameters for creating a directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDirectoryParams {
    /// Path of the directory to create.
    pub path: String,
}

/// Parameters for listing a directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDirectoryParams {
    /// Path to the directory to list.
    pub path: String,
}

/// Parameters for getting a directory tree.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DirectoryTreeParams {
    /// Path to the root directory for the tree.
    pub path: String,
}

/// Parameters for moving a file or directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveFileParams {
    /// Source path.
    pub source: String,
    /// Destination path; must not exist.
    pub destination: String,
}

/// Parameters for searching files.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilesParams {
    /// Base directory to search in.
    pub path: String,
    /// Case-insensitive substring to look for in entry names.
    pub pattern: String,
    /// Glob patterns (relative to `path`) to leave out of the search.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Parameters for getting file info.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetFileInfoParams {
    /// Path to the file or directory.
    pub path: String,
}

#[tool_router]
impl FilesystemServer {
    /// Create a new filesystem server confined to `roots`.
    pub fn new(roots: AllowedRoots) -> Self {
        Self {
            roots: Arc::new(roots),
            tool_router: Self::tool_router(),
        }
    }

    /// Read the complete contents of a text file.
    #[tool(
        description = "Read the complete contents of a file from the file system. Only works within allowed directories."
    )]
    async fn read_file(
        &self,
        Parameters(params): Parameters<ReadFileParams>,
    ) -> Result<String, String> {
        ops::read_file(&self.roots, &params.path)
            .await
            .map_err(|e| e.to_tool_text())
    }

    /// Read several files; each failure is reported inline.
    #[tool(
        description = "Read the contents of multiple files at once. Each file's content is prefixed with its path; failed reads for individual files won't stop the entire operation."
    )]
    async fn read_multiple_files(
        &self,
        Parameters(params): Parameters<ReadMultipleFilesParams>,
    ) -> Result<String, String> {
        Ok(ops::read_multiple_files(&self.roots, &params.paths).await)
    }

    /// Create or overwrite a file.
    #[tool(
        description = "Create a new file or completely overwrite an existing file with new content. Only works within allowed directories."
    )]
    async fn write_file(
        &self,
        Parameters(params): Parameters<WriteFileParams>,
    ) -> Result<String, String> {
        ops::write_file(&self.roots, &params.path, &params.content)
            .await
            .map_err(|e| e.to_tool_text())
    }

    /// Apply sequential exact-match edits to a file.
    #[tool(
        description = "Replace exact text in a file. Edits apply in order; if any oldText is not found, no change is made. Returns a unified diff. Set dryRun to preview without writing."
    )]
    async fn edit_file(
        &self,
        Parameters(params): Parameters<EditFileParams>,
    ) -> Result<String, String> {
        ops::edit_file(&self.roots, &params.path, &params.edits, params.dry_run)
            .await
            .map_err(|e| e.to_tool_text())
    }

    /// Create a directory and all parent directories.
    #[tool(
        description = "Create a new directory or ensure a directory exists, creating parent directories as needed. Succeeds silently if it already exists."
    )]
    async fn create_directory(
        &self,
        Parameters(params): Parameters<CreateDirectoryParams>,
    ) -> Result<String, String> {
        ops::create_directory(&self.roots, &params.path)
            .await
            .map_err(|e| e.to_tool_text())
    }

    /// List files and directories in a path.
    #[tool(
        description = "List the immediate children of a directory, each prefixed with [FILE] or [DIR]."
    )]
    async fn list_directory(
        &self,
        Parameters(params): Parameters<ListDirectoryParams>,
    ) -> Result<String, String> {
        ops::list_directory(&self.roots, &params.path)
            .await
            .map_err(|e| e.to_tool_text())
    }

    /// Get a recursive tree view of files and directories.
    #[tool(
        description = "Get a recursive tree view of files and directories as JSON. Each entry has 'name', 'type' (file/directory), and 'children' for directories."
    )]
    async fn directory_tree(
        &self,
        Parameters(params): Parameters<DirectoryTreeParams>,
    ) -> Result<String, String> {
        tree::directory_tree(&self.roots, &params.path)
            .await
            .map_err(|e| e.to_tool_text())
    }

    /// Move or rename a file or directory.
    #[tool(
        description = "Move or rename files and directories. Fails if the destination exists. Both source and destination must be within allowed directories."
    )]
    async fn move_file(
        &self,
        Parameters(params): Parameters<MoveFileParams>,
    ) -> Result<String, String> {
        ops::move_file(&self.roots, &params.source, &params.destination)
            .await
            .map_err(|e| e.to_tool_text())
    }

    /// Search for entries whose name contains a pattern.
    #[tool(
        description = "Recursively search for files and directories whose name contains a pattern (case-insensitive). Returns full paths of all matches."
    )]
    async fn search_files(
        &self,
        Parameters(params): Parameters<SearchFilesParams>,
    ) -> Result<String, String> {
        let matches = search::search_files(
            &self.roots,
            &params.path,
            &params.pattern,
            &params.exclude_patterns,
        )
        .await
        .map_err(|e| e.to_tool_text())?;
        if matches.is_empty() {
            return Ok(NO_MATCHES.into());
        }
        Ok(matches
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Get detailed metadata about a file or directory.
    #[tool(
        description = "Retrieve metadata about a file or directory: size, timestamps, type and permissions."
    )]
    async fn get_file_info(
        &self,
        Parameters(params): Parameters<GetFileInfoParams>,
    ) -> Result<String, String> {
        ops::get_file_info(&self.roots, &params.path)
            .await
            .map(|info| info.to_string())
            .map_err(|e| e.to_tool_text())
    }

    /// List the allowed directories this server can access.
    #[tool(description = "Returns the list of directories that this server is allowed to access.")]
    async fn list_allowed_directories(&self) -> String {
        ops::list_allowed_directories(&self.roots)
    }
}
