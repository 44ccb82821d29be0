// Connector-glyph rendering for labelled trees, in the style of the `tree` command.

/// The connector strings used when drawing a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    /// Drawn before a child that has later siblings.
    pub branch: &'static str,
    /// Drawn before the last child of a node.
    pub last: &'static str,
    /// Prefix continued below a child that has later siblings.
    pub pipe: &'static str,
    /// Prefix continued below the last child.
    pub blank: &'static str,
}

impl Glyphs {
    pub const UNICODE: Glyphs = Glyphs {
        branch: "├── ",
        last: "└── ",
        pipe: "│   ",
        blank: "    ",
    };

    pub const ASCII: Glyphs = Glyphs {
        branch: "|-- ",
        last: "`-- ",
        pipe: "|   ",
        blank: "    ",
    };
}

impl Default for Glyphs {
    fn default() -> Self {
        Self::UNICODE
    }
}

/// A node of a renderable tree.
///
/// Children are rendered in the order they were pushed; sorting is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub label: String,
    pub children: Vec<Tree>,
    /// Free-text lines printed under the node at its children's indentation, without a
    /// connector. They never count as siblings when deciding which child is last.
    pub notes: Vec<String>,
}

impl Tree {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Tree) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Renders `tree` with the default unicode glyphs.
///
/// # Example
/// ```
/// let tree = sanga::Tree::new("proj/")
///     .with_child(sanga::Tree::new("a"))
///     .with_child(sanga::Tree::new("b"));
///
/// assert_eq!(sanga::render(&tree), "proj/\n├── a\n└── b");
/// ```
pub fn render(tree: &Tree) -> String {
    render_with(tree, Glyphs::default())
}

/// Renders `tree` using the given glyph set. Lines are joined with `\n`, no trailing newline.
pub fn render_with(tree: &Tree, glyphs: Glyphs) -> String {
    let mut lines = vec![tree.label.clone()];
    push_children(tree, "", glyphs, &mut lines);
    lines.join("\n")
}

fn push_children(node: &Tree, prefix: &str, glyphs: Glyphs, lines: &mut Vec<String>) {
    for note in &node.notes {
        lines.push(format!("{prefix}{note}"));
    }

    let len = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i + 1 == len;
        let (connector, continuation) = if is_last {
            (glyphs.last, glyphs.blank)
        } else {
            (glyphs.branch, glyphs.pipe)
        };

        lines.push(format!("{prefix}{connector}{}", child.label));

        let child_prefix = format!("{prefix}{continuation}");
        push_children(child, &child_prefix, glyphs, lines);
    }
}
