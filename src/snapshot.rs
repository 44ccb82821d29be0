//! Read-only views of the real filesystem under a root.
//!
//! Nothing here is cached between calls and nothing is isolated from concurrent changes:
//! two snapshots of the same root taken while something else writes to it may disagree.

use std::{
    cell::OnceCell,
    fs, io,
    path::{Path, PathBuf, MAIN_SEPARATOR},
};
use walkdir::WalkDir;

use crate::{
    errors::{FileOperation, IoError},
    utils::display_name,
};

/// One entry below a snapshot node.
#[derive(Debug)]
pub enum SnapshotChild {
    Node(SnapshotNode),
    /// The directory could not be (fully) read; the message is the underlying error text.
    Error(String),
    /// A symlink pointing back at `target`, one of its own ancestors. Not descended into.
    Loop { target: PathBuf },
}

/// A file or directory found on disk. Directory children are read on first access.
///
/// Symlinked directories are descended into like real ones.
#[derive(Debug)]
pub struct SnapshotNode {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    /// Canonical paths of this directory and every directory above it, used to stop at
    /// symlink loops. Empty when the root could not be canonicalized.
    ancestry: Vec<PathBuf>,
    children: OnceCell<Vec<SnapshotChild>>,
}
impl SnapshotNode {
    fn new(name: String, path: PathBuf, is_dir: bool) -> Self {
        Self {
            name,
            path,
            is_dir,
            ancestry: Vec::new(),
            children: OnceCell::new(),
        }
    }

    /// Children sorted by file name; empty for files.
    pub fn children(&self) -> &[SnapshotChild] {
        self.children.get_or_init(|| {
            if self.is_dir {
                self.read_level()
            } else {
                Vec::new()
            }
        })
    }

    pub fn is_expanded(&self) -> bool {
        self.children.get().is_some()
    }

    /// Child nodes, skipping error and loop leaves.
    pub fn nodes(&self) -> impl Iterator<Item = &SnapshotNode> {
        self.children().iter().filter_map(|child| match child {
            SnapshotChild::Node(node) => Some(node),
            _ => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.children().iter().filter_map(|child| match child {
            SnapshotChild::Error(message) => Some(message.as_str()),
            _ => None,
        })
    }

    /// Finds a descendant by path relative to this node.
    pub fn find(&self, relative: &Path) -> Option<&SnapshotNode> {
        let mut current = self;

        for component in relative.components() {
            let name = component.as_os_str().to_string_lossy();
            current = current.nodes().find(|node| node.name == name)?;
        }

        Some(current)
    }

    fn expand_all(&self) {
        for node in self.nodes() {
            node.expand_all();
        }
    }

    fn to_tree(&self, label: String) -> sanga::Tree {
        let mut tree = sanga::Tree::new(label);

        for child in self.children() {
            match child {
                SnapshotChild::Node(node) => tree.children.push(node.to_tree(node.name.clone())),
                SnapshotChild::Error(message) => tree
                    .notes
                    .push(format!("Error reading directory: {}", message)),
                SnapshotChild::Loop { target } => tree
                    .notes
                    .push(format!("Symlink loop to {}, not followed", target.display())),
            }
        }

        tree
    }

    /// Reads one directory level. Failures become [`SnapshotChild::Error`] leaves.
    fn read_level(&self) -> Vec<SnapshotChild> {
        let mut children = Vec::new();

        let walker = WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let is_symlink = entry.path_is_symlink();
                    // std follows the link, so dangling links stay plain leaves
                    let is_dir =
                        entry.file_type().is_dir() || (is_symlink && entry.path().is_dir());

                    let mut node = SnapshotNode::new(
                        entry.file_name().to_string_lossy().to_string(),
                        entry.path().to_path_buf(),
                        is_dir,
                    );

                    if is_dir {
                        let canonical = if is_symlink {
                            fs::canonicalize(entry.path()).ok()
                        } else {
                            self.ancestry.last().map(|dir| dir.join(entry.file_name()))
                        };

                        if let Some(canonical) = canonical {
                            if is_symlink && self.ancestry.contains(&canonical) {
                                log::warn!(
                                    "Not following {}: it points to its ancestor {}",
                                    entry.path().display(),
                                    canonical.display()
                                );
                                let _ = node
                                    .children
                                    .set(vec![SnapshotChild::Loop { target: canonical }]);
                            } else {
                                node.ancestry = self.ancestry.clone();
                                node.ancestry.push(canonical);
                            }
                        }
                    }

                    children.push(SnapshotChild::Node(node));
                }
                Err(error) => {
                    let fallback = error.to_string();
                    let source = error
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other(fallback));

                    children.push(read_failure(&self.path, source));
                }
            }
        }

        children
    }
}

fn read_failure(dir: &Path, source: io::Error) -> SnapshotChild {
    let message = source.to_string();

    log::warn!("{}", IoError::new(FileOperation::ReadDir, dir.to_path_buf(), source));

    SnapshotChild::Error(message)
}

/// `name/`, unless the name already ends in a separator (as `/` does).
fn root_label(name: &str) -> String {
    if name.ends_with('/') || name.ends_with(MAIN_SEPARATOR) {
        name.to_string()
    } else {
        format!("{}/", name)
    }
}

/// A point-in-time, lazily expanded view of the tree under a root.
#[derive(Debug)]
pub struct TreeSnapshot {
    root: SnapshotNode,
}
impl TreeSnapshot {
    pub fn materialize(root: &Path) -> Self {
        let mut node = SnapshotNode::new(display_name(root), root.to_path_buf(), root.is_dir());

        if node.is_dir {
            node.ancestry = fs::canonicalize(root).into_iter().collect();
        } else {
            // a missing or non-directory root still says why it has no children
            let children = match fs::read_dir(root) {
                Err(source) => vec![read_failure(root, source)],
                Ok(_) => Vec::new(),
            };
            let _ = node.children.set(children);
        }

        Self { root: node }
    }

    pub fn root(&self) -> &SnapshotNode {
        &self.root
    }

    /// Reads every level now instead of on first access.
    pub fn expand_all(&self) -> &Self {
        self.root.expand_all();
        self
    }

    pub fn render(&self) -> String {
        sanga::render(&self.root.to_tree(root_label(&self.root.name)))
    }
}

/// Walks `root` and renders it with box-drawing connectors, children sorted per level.
pub fn render_text_tree(root: &Path) -> String {
    TreeSnapshot::materialize(root).render()
}
