//! Recursive directory tree for the `directory_tree` tool.

use crate::error::FsError;
use crate::validate::{AllowedRoots, validate_path};
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// A node in the directory tree.
///
/// Directories always carry `children` (possibly empty); files never do.
#[derive(Debug, Serialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    fn file(name: String) -> Self {
        Self {
            name,
            kind: NodeKind::File,
            children: None,
        }
    }

    fn directory(name: String, children: Vec<TreeNode>) -> Self {
        Self {
            name,
            kind: NodeKind::Directory,
            children: Some(children),
        }
    }
}

/// Build the tree below `path` and render it as 2-space indented JSON.
///
/// The top level is the array of the directory's children.
pub async fn directory_tree(roots: &AllowedRoots, path: &str) -> Result<String, FsError> {
    let root = validate_path(path, roots)?;
    let children = build_tree(&root)
        .await
        .map_err(|e| FsError::io(&root, e))?;
    serde_json::to_string_pretty(&children).map_err(|e| FsError::io(&root, e.into()))
}

/// Recursively collect the children of `dir`, sorted by name.
///
/// Symlinks are reported as files and never followed, so link cycles cannot
/// recurse. Depth is bounded by the platform's path length limit: past it
/// `read_dir` fails and that subtree is skipped.
pub fn build_tree(
    dir: &Path,
) -> Pin<Box<dyn Future<Output = Result<Vec<TreeNode>, std::io::Error>> + Send + '_>> {
    Box::pin(async move {
        let mut children = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Ok(ft) = entry.file_type().await else {
                continue;
            };
            if !ft.is_dir() {
                children.push(TreeNode::file(name));
                continue;
            }
            let child_path = entry.path();
            match build_tree(&child_path).await {
                Ok(grandchildren) => children.push(TreeNode::directory(name, grandchildren)),
                Err(e) => {
                    tracing::debug!(path = %child_path.display(), error = %e, "skipping unreadable directory");
                }
            }
        }
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    })
}

#[cfg(test)]
mod tests {
    use crate::tree::{NodeKind, build_tree};
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn files_have_no_children_and_dirs_do() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        fs::create_dir(tmp.path().join("empty")).unwrap();

        let tree = build_tree(tmp.path()).await.unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "a.txt");
        assert_eq!(tree[0].kind, NodeKind::File);
        assert!(tree[0].children.is_none());
        assert_eq!(tree[1].kind, NodeKind::Directory);
        assert_eq!(tree[1].children.as_deref().map(<[_]>::len), Some(0));
    }

    #[tokio::test]
    async fn nests_sorted_children() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("d").join("inner")).unwrap();
        fs::write(tmp.path().join("d").join("z.txt"), "").unwrap();
        fs::write(tmp.path().join("d").join("b.txt"), "").unwrap();

        let tree = build_tree(tmp.path()).await.unwrap();
        let names: Vec<_> = tree[0]
            .children
            .as_ref()
            .unwrap()
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, ["b.txt", "inner", "z.txt"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_loop_is_not_followed() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("d")).unwrap();
        std::os::unix::fs::symlink(tmp.path(), tmp.path().join("d").join("loop")).unwrap();

        let tree = build_tree(tmp.path()).await.unwrap();
        let inner = tree[0].children.as_ref().unwrap();
        assert_eq!(inner[0].name, "loop");
        assert_eq!(inner[0].kind, NodeKind::File);
    }
}
