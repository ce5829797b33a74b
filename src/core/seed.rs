//! Initial forest: built-in sample, JSON file or an imported directory

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use regex_lite::Regex;
use walkdir::WalkDir;

use super::tree::{self, Forest, TreeNode};

/// Directories deeper than this are not imported
const MAX_DEPTH: usize = 10;

/// Load a forest from a JSON file or a directory of markdown files
pub fn load(path: &Path) -> Result<Forest> {
    if path.is_dir() {
        from_directory(path)
    } else {
        load_json(path)
    }
}

/// Read a forest serialized as JSON and check its ids
pub fn load_json(path: &Path) -> Result<Forest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    let forest: Forest = serde_json::from_str(&content)
        .with_context(|| format!("Invalid seed file: {}", path.display()))?;
    tree::validate_unique_ids(&forest)?;

    tracing::info!("Loaded seed forest from: {}", path.display());
    Ok(forest)
}

/// Import the markdown files under `root` as a forest.
///
/// Folders come before files, each group sorted case-insensitively. Ids are
/// slugs of the path relative to `root`. Top-level folders start open.
pub fn from_directory(root: &Path) -> Result<Forest> {
    let mut ids = HashSet::new();
    let forest = import_level(root, root, 0, &mut ids)?;

    tracing::info!(
        "Imported {} nodes from: {}",
        tree::descendants(&forest).count(),
        root.display()
    );
    Ok(forest)
}

fn import_level(root: &Path, dir: &Path, depth: usize, ids: &mut HashSet<String>) -> Result<Forest> {
    if depth >= MAX_DEPTH {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to list directory: {}", dir.display()))?;
        let file_name = entry.file_name().to_string_lossy();

        // Skip hidden entries and common non-content directories
        if file_name.starts_with('.') || file_name == "node_modules" || file_name == "target" {
            continue;
        }
        entries.push(entry);
    }

    entries.sort_by(|a, b| match (a.file_type().is_dir(), b.file_type().is_dir()) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a
            .file_name()
            .to_string_lossy()
            .to_lowercase()
            .cmp(&b.file_name().to_string_lossy().to_lowercase()),
    });

    let mut nodes = Vec::new();
    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let display = display_path(root, path);

        if entry.file_type().is_dir() {
            let id = allocate_id(&display, ids);
            let children = import_level(root, path, depth + 1, ids)?;
            nodes.push(Arc::new(TreeNode::folder(id, name, display, depth == 0, children)));
        } else if is_markdown(path) {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            let id = allocate_id(&display, ids);
            nodes.push(Arc::new(TreeNode::file(id, name, display, content)));
        }
    }

    Ok(nodes)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "md" || ext == "markdown")
        .unwrap_or(false)
}

/// `/`-separated path relative to the import root
fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn slug(text: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static pattern"));

    let lowered = text.to_lowercase();
    let slug = re.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "node".to_string()
    } else {
        slug.to_string()
    }
}

/// Slug of `display`, suffixed with `-2`, `-3`, ... until unused
fn allocate_id(display: &str, ids: &mut HashSet<String>) -> String {
    let base = slug(display);
    let mut id = base.clone();
    let mut n = 2;
    while ids.contains(&id) {
        id = format!("{base}-{n}");
        n += 1;
    }
    ids.insert(id.clone());
    id
}

fn file(id: &str, name: &str, path: &str, content: &str) -> Arc<TreeNode> {
    Arc::new(TreeNode::file(id, name, path, content))
}

fn folder(id: &str, name: &str, path: &str, is_open: bool, children: Forest) -> Arc<TreeNode> {
    Arc::new(TreeNode::folder(id, name, path, is_open, children))
}

/// The sample workspace shown when no seed is configured
pub fn default_forest() -> Forest {
    vec![
        folder(
            "proj-alpha",
            "Project Alpha",
            "Project Alpha",
            true,
            vec![
                file(
                    "proj-alpha-readme",
                    "README.md",
                    "Project Alpha/README.md",
                    "# Project Alpha\n\nThis is the main readme for Project Alpha. It contains an overview of the project and how to get started.\n\n## Sub-heading\n\n- Bullet point 1\n- Bullet point 2\n\n```javascript\nconsole.log(\"Hello, Alpha!\");\n```",
                ),
                file(
                    "proj-alpha-user-guide",
                    "user_guide.md",
                    "Project Alpha/user_guide.md",
                    "# User Guide\n\nDetailed instructions on how to use Project Alpha.\n\n### Feature 1\n\nDescription of Feature 1.",
                ),
                folder(
                    "proj-alpha-api",
                    "API Docs",
                    "Project Alpha/API Docs",
                    false,
                    vec![file(
                        "proj-alpha-api-endpoints",
                        "endpoints.md",
                        "Project Alpha/API Docs/endpoints.md",
                        "## Endpoints\n\n- `GET /api/users` - Retrieves all users.\n- `POST /api/users` - Creates a new user.",
                    )],
                ),
            ],
        ),
        folder(
            "bi-versat",
            "Bi-Versat",
            "Bi-Versat",
            false,
            vec![file(
                "bi-versat-manual",
                "manual de usuario.md",
                "Bi-Versat/manual de usuario.md",
                "# Manual de Usuario Bi-Versat\n\nContenido del manual de usuario para el sistema Bi-Versat.\n\n## Instalación\n\nPasos para instalar Bi-Versat...",
            )],
        ),
        file(
            "orphaned-file",
            "standalone_doc.md",
            "standalone_doc.md",
            "# Standalone Document\n\nThis document is not part of any project folder.",
        ),
    ]
}
