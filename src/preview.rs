use colored::Colorize;

use crate::layout::{EntryKind, Layout};

/// Represents a node in the desired tree (either file or directory).
#[derive(Debug)]
struct PreviewNode {
    name: String,
    kind: EntryKind,
    children: Vec<PreviewNode>,
}
impl PreviewNode {
    fn new(name: String, kind: EntryKind) -> Self {
        Self {
            name,
            kind,
            children: Vec::new(),
        }
    }

    /// Walks/creates the chain of nodes for `names`, marking the last one with `kind`.
    fn insert(&mut self, names: &[String], kind: EntryKind) {
        let Some((first, rest)) = names.split_first() else {
            return;
        };

        let position = match self.children.iter().position(|child| &child.name == first) {
            Some(position) => position,
            None => {
                // intermediate components are directories even if never declared
                let child_kind = if rest.is_empty() {
                    kind
                } else {
                    EntryKind::Directory
                };
                self.children.push(PreviewNode::new(first.clone(), child_kind));
                self.children.len() - 1
            }
        };

        self.children[position].insert(rest, kind);
    }

    fn to_tree(&self, paint: &dyn Fn(&str, EntryKind) -> String) -> sanga::Tree {
        let mut tree = sanga::Tree::new(paint(&self.name, self.kind));
        tree.children = self.children.iter().map(|child| child.to_tree(paint)).collect();
        tree
    }
}

/// Build the desired tree from the layout entries, in processing order.
fn build_tree(layout: &Layout, root_name: &str) -> PreviewNode {
    let mut root = PreviewNode::new(root_name.to_string(), EntryKind::Directory);

    for entry in layout.entries() {
        let names: Vec<String> = entry
            .path()
            .components()
            .map(|component| component.as_os_str().to_string_lossy().to_string())
            .collect();

        root.insert(&names, entry.kind());
    }

    root
}

/// The desired set as plain connector-glyph text, rooted at `root_name`.
pub fn render_layout(layout: &Layout, root_name: &str) -> String {
    let tree = build_tree(layout, root_name).to_tree(&|name: &str, _: EntryKind| name.to_string());
    sanga::render(&tree)
}

/// Print the desired tree with directories in blue and files in green.
pub fn preview_layout(layout: &Layout, root_name: &str) {
    let tree = build_tree(layout, root_name).to_tree(&|name: &str, kind: EntryKind| match kind {
        EntryKind::Directory => name.blue().to_string(),
        EntryKind::File => name.green().to_string(),
    });

    println!(
        "Legend: {} = (directory), {} = (file)",
        "blue".blue(),
        "green".green()
    );

    println!("{} {}\n", "┌─".bold().bright_blue(), "Layout".bold().bright_blue());

    println!("{}", sanga::render(&tree));

    println!(
        "\n{} {} directories, {} files",
        "└─".bold().bright_blue(),
        layout.directories.len(),
        layout.files.len()
    );
}
