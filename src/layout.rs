use indexmap::IndexMap;
use miette::Diagnostic;
use serde::Deserialize;
use std::{
    fmt, fs,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;

use crate::errors::{FileOperation, IoError};

const DEFAULT_LAYOUT: &str = include_str!("../layouts/default.toml");

pub const DEFAULT_AUTHOR: &str = "balangkas";

#[derive(Debug, Error, Diagnostic)]
pub enum LayoutError {
    #[error("I/O error within layout domain")]
    #[diagnostic(code(balangkas::layout::io))]
    Io(#[from] IoError),

    #[error("Unable to parse layout toml at '{path}': {source}")]
    #[diagnostic(code(balangkas::layout::parse_toml), help("Review toml file"))]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Layout entry '{path}' must be a relative path inside the project root")]
    #[diagnostic(
        code(balangkas::layout::invalid_path),
        help("Remove leading '/', drive prefixes and '..' segments from the entry")
    )]
    InvalidPath { path: String },
}

/// Whether a desired entry is a directory or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
}
impl EntryKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Directory => "directory",
            Self::File => "file",
        }
    }
}
impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySpec {
    pub path: PathBuf,
}
impl DirectorySpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
}
impl FileSpec {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// One declared entry, borrowed from a [`Layout`] in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredEntry<'a> {
    Directory(&'a DirectorySpec),
    File(&'a FileSpec),
}
impl DesiredEntry<'_> {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Directory(_) => EntryKind::Directory,
            Self::File(_) => EntryKind::File,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(spec) => &spec.path,
            Self::File(spec) => &spec.path,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Directory(_) => None,
            Self::File(spec) => Some(&spec.content),
        }
    }
}

/// Yields directories in declaration order, then files in declaration order.
pub fn processing_order<'a>(
    directories: &'a [DirectorySpec],
    files: &'a [FileSpec],
) -> impl Iterator<Item = DesiredEntry<'a>> {
    directories
        .iter()
        .map(DesiredEntry::Directory)
        .chain(files.iter().map(DesiredEntry::File))
}

#[derive(Debug, Deserialize)]
struct LayoutFile {
    author: Option<String>,
    #[serde(default)]
    directories: Vec<String>,
    #[serde(default)]
    files: IndexMap<String, String>,
}

/// The desired set: which directories and files a build ensures exist under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub author: String,
    pub directories: Vec<DirectorySpec>,
    pub files: Vec<FileSpec>,
}
impl Layout {
    pub fn new(directories: Vec<DirectorySpec>, files: Vec<FileSpec>) -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            directories,
            files,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .map_err(|error| IoError::new(FileOperation::Read, path.to_path_buf(), error))?;

        Self::parse(&content, path)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, LayoutError> {
        Self::parse(content, Path::new("<inline>"))
    }

    fn parse(content: &str, origin: &Path) -> Result<Self, LayoutError> {
        let parsed: LayoutFile = toml::from_str(content).map_err(|err| LayoutError::ParseToml {
            path: origin.to_path_buf(),
            source: err,
        })?;

        let directories = parsed
            .directories
            .iter()
            .map(|dir| validate_relative(dir).map(DirectorySpec::new))
            .collect::<Result<Vec<_>, _>>()?;

        let files = parsed
            .files
            .iter()
            .map(|(path, content)| validate_relative(path).map(|p| FileSpec::new(p, content)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            author: parsed.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            directories,
            files,
        })
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = DesiredEntry<'_>> {
        processing_order(&self.directories, &self.files)
    }

    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
impl Default for Layout {
    fn default() -> Self {
        Self::from_toml_str(DEFAULT_LAYOUT).expect("embedded default layout is valid")
    }
}

fn validate_relative(raw: &str) -> Result<PathBuf, LayoutError> {
    let path = PathBuf::from(raw);

    let escapes = path.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });

    let has_name = path
        .components()
        .any(|component| matches!(component, Component::Normal(_)));

    if escapes || !has_name {
        return Err(LayoutError::InvalidPath {
            path: raw.to_string(),
        });
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        let layout = Layout::default();

        assert_eq!(layout.directories.len(), 13);
        assert_eq!(layout.files.len(), 9);
        assert_eq!(layout.directories[0].path, PathBuf::from("core"));
        assert_eq!(
            layout.files[1],
            FileSpec::new("core/main.py", "# Entry point for your application\n")
        );
    }

    #[test]
    fn test_entries_put_directories_before_files() {
        let layout = Layout::from_toml_str(
            r#"
            directories = ["b", "a"]

            [files]
            "z.txt" = ""
            "b/y.txt" = "y"
            "#,
        )
        .unwrap();

        let order: Vec<(EntryKind, PathBuf)> = layout
            .entries()
            .map(|entry| (entry.kind(), entry.path().to_path_buf()))
            .collect();

        assert_eq!(
            order,
            vec![
                (EntryKind::Directory, PathBuf::from("b")),
                (EntryKind::Directory, PathBuf::from("a")),
                (EntryKind::File, PathBuf::from("z.txt")),
                (EntryKind::File, PathBuf::from("b/y.txt")),
            ]
        );
    }

    #[test]
    fn test_missing_author_uses_default() {
        let layout = Layout::from_toml_str(r#"directories = ["x"]"#).unwrap();

        assert_eq!(layout.author, DEFAULT_AUTHOR);
        assert!(layout.files.is_empty());
        assert_eq!(layout.len(), 1);
    }

    #[test]
    fn test_rejects_escaping_paths() {
        for bad in ["../outside", "/etc", "core/../../x", ""] {
            let toml = format!("directories = [{:?}]", bad);

            let result = Layout::from_toml_str(&toml);

            assert!(
                matches!(result, Err(LayoutError::InvalidPath { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = Layout::from_toml_str("directories = [");

        assert!(matches!(result, Err(LayoutError::ParseToml { .. })));
    }
}
