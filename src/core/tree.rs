//! Document tree model and the pure operations over it
//!
//! A forest is an ordered list of top-level nodes. Nodes are never changed in
//! place: a mutation rebuilds the nodes on the path from the top level down to
//! the changed node and shares every other subtree with the input forest.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered top-level nodes, in display order
pub type Forest = Vec<Arc<TreeNode>>;

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    File(FileNode),
    Folder(FolderNode),
}

/// A markdown document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: String,
    pub name: String,
    /// Full display path, e.g. `Project Alpha/README.md`
    pub path: String,
    #[serde(default)]
    pub content: String,
}

/// A folder holding an ordered list of children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub children: Forest,
    /// Expand/collapse state in the explorer
    #[serde(default)]
    pub is_open: bool,
}

/// Discriminant of a [`TreeNode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Folder,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::File => f.write_str("file"),
            NodeKind::Folder => f.write_str("folder"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("no node with id `{0}`")]
    NotFound(String),
    #[error("node `{id}` is a {found}, expected a {expected}")]
    WrongNodeKind {
        id: String,
        expected: NodeKind,
        found: NodeKind,
    },
    #[error("duplicate node id `{0}`")]
    DuplicateId(String),
}

impl TreeNode {
    pub fn file(
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        TreeNode::File(FileNode {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            content: content.into(),
        })
    }

    pub fn folder(
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        is_open: bool,
        children: Forest,
    ) -> Self {
        TreeNode::Folder(FolderNode {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            children,
            is_open,
        })
    }

    pub fn id(&self) -> &str {
        match self {
            TreeNode::File(file) => &file.id,
            TreeNode::Folder(folder) => &folder.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TreeNode::File(file) => &file.name,
            TreeNode::Folder(folder) => &folder.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            TreeNode::File(file) => &file.path,
            TreeNode::Folder(folder) => &folder.path,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            TreeNode::File(_) => NodeKind::File,
            TreeNode::Folder(_) => NodeKind::Folder,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            TreeNode::File(file) => Some(file),
            TreeNode::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderNode> {
        match self {
            TreeNode::Folder(folder) => Some(folder),
            TreeNode::File(_) => None,
        }
    }
}

impl FolderNode {
    fn with_children(&self, children: Forest) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            path: self.path.clone(),
            children,
            is_open: self.is_open,
        }
    }
}

/// Pre-order iterator over every node of a forest
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Arc<TreeNode>>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(node) => {
                    if let TreeNode::Folder(folder) = node.as_ref() {
                        self.stack.push(folder.children.iter());
                    }
                    return Some(node.as_ref());
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Visit a node, then its children in order, for every top-level node
pub fn descendants(forest: &[Arc<TreeNode>]) -> Descendants<'_> {
    Descendants {
        stack: vec![forest.iter()],
    }
}

/// Find a node by id. The first pre-order match wins.
pub fn find<'a>(forest: &'a [Arc<TreeNode>], id: &str) -> Option<&'a TreeNode> {
    descendants(forest).find(|node| node.id() == id)
}

/// Find a node by id and require it to be a file
pub fn find_file<'a>(forest: &'a [Arc<TreeNode>], id: &str) -> Result<&'a FileNode, TreeError> {
    let node = find(forest, id).ok_or_else(|| TreeError::NotFound(id.to_string()))?;
    node.as_file().ok_or_else(|| TreeError::WrongNodeKind {
        id: id.to_string(),
        expected: NodeKind::File,
        found: node.kind(),
    })
}

/// Flip `is_open` on the folder with the given id.
///
/// Unknown ids and file ids leave the forest as it was.
pub fn toggle_folder(forest: &[Arc<TreeNode>], id: &str) -> Forest {
    let toggled = rewrite(forest, id, &|node: &TreeNode| match node {
        TreeNode::Folder(folder) => Some(TreeNode::Folder(FolderNode {
            is_open: !folder.is_open,
            ..folder.clone()
        })),
        TreeNode::File(_) => None,
    });

    match toggled {
        Some(forest) => {
            tracing::debug!(id, "toggled folder");
            forest
        }
        None => forest.to_vec(),
    }
}

/// Replace the content of the file with the given id.
///
/// Unknown ids and folder ids leave the forest as it was.
pub fn set_file_content(forest: &[Arc<TreeNode>], id: &str, content: &str) -> Forest {
    let updated = rewrite(forest, id, &|node: &TreeNode| match node {
        TreeNode::File(file) => Some(TreeNode::File(FileNode {
            content: content.to_string(),
            ..file.clone()
        })),
        TreeNode::Folder(_) => None,
    });

    match updated {
        Some(forest) => {
            tracing::debug!(id, len = content.len(), "updated file content");
            forest
        }
        None => forest.to_vec(),
    }
}

/// Check that no id appears twice anywhere in the forest
pub fn validate_unique_ids(forest: &[Arc<TreeNode>]) -> Result<(), TreeError> {
    let mut seen = HashSet::new();
    for node in descendants(forest) {
        if !seen.insert(node.id()) {
            return Err(TreeError::DuplicateId(node.id().to_string()));
        }
    }
    Ok(())
}

/// Rebuild `nodes` with the first pre-order node that matches `id` and that
/// `edit` accepts replaced. Returns `None` when nothing changed.
fn rewrite<F>(nodes: &[Arc<TreeNode>], id: &str, edit: &F) -> Option<Forest>
where
    F: Fn(&TreeNode) -> Option<TreeNode>,
{
    for (index, node) in nodes.iter().enumerate() {
        let edited = if node.id() == id { edit(node.as_ref()) } else { None };
        let replacement = edited.or_else(|| match node.as_ref() {
            TreeNode::Folder(folder) => rewrite(&folder.children, id, edit)
                .map(|children| TreeNode::Folder(folder.with_children(children))),
            TreeNode::File(_) => None,
        });

        if let Some(replacement) = replacement {
            let mut rebuilt = nodes.to_vec();
            rebuilt[index] = Arc::new(replacement);
            return Some(rebuilt);
        }
    }
    None
}
