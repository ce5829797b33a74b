//! Explorer view: the forest as an indented outline

use std::fmt::Write;

use crate::app::Snapshot;
use crate::core::tree::{FileNode, FolderNode, TreeNode};

/// Explorer panel
pub struct ExplorerView;

impl ExplorerView {
    /// Render the forest. Children of closed folders are hidden.
    pub fn render(snapshot: &Snapshot) -> String {
        let mut out = String::new();
        if snapshot.forest.is_empty() {
            out.push_str("No documents\n");
        }
        for node in &snapshot.forest {
            Self::show_node(&mut out, node, 0, snapshot);
        }
        out
    }

    fn show_node(out: &mut String, node: &TreeNode, depth: usize, snapshot: &Snapshot) {
        match node {
            TreeNode::Folder(folder) => Self::show_directory(out, folder, depth, snapshot),
            TreeNode::File(file) => Self::show_file(out, file, depth, snapshot),
        }
    }

    fn show_directory(out: &mut String, folder: &FolderNode, depth: usize, snapshot: &Snapshot) {
        let icon = if folder.is_open { "\u{1F4C2}" } else { "\u{1F4C1}" };
        let _ = writeln!(
            out,
            "  {}{} {}  ({})",
            "  ".repeat(depth),
            icon,
            folder.name,
            folder.id
        );

        if folder.is_open {
            for child in &folder.children {
                Self::show_node(out, child, depth + 1, snapshot);
            }
        }
    }

    fn show_file(out: &mut String, file: &FileNode, depth: usize, snapshot: &Snapshot) {
        let icon = if file.name.ends_with(".md") || file.name.ends_with(".markdown") {
            "\u{1F4DD}"
        } else {
            "\u{1F4C4}"
        };

        let is_active = snapshot.selected_id.as_deref() == Some(file.id.as_str());
        let marker = if is_active { "> " } else { "  " };
        let modified = if is_active && snapshot.dirty { "*" } else { "" };

        let _ = writeln!(
            out,
            "{}{}{} {}{}  ({})",
            marker,
            "  ".repeat(depth),
            icon,
            file.name,
            modified,
            file.id
        );
    }
}
