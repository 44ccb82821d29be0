use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    #[error("reading a file")]
    Read,
    #[error("reading a directory")]
    ReadDir,
    #[error("writing a file")]
    Write,
    #[error("appending to a file")]
    Append,
    #[error("creating a directory")]
    Mkdir,
    #[error("removing a directory")]
    RemoveDir,
    #[error("renaming an entry")]
    Rename,
    #[error("resolving the current directory")]
    CurrentDir,
}
#[derive(Debug, Error, Diagnostic)]
#[error("I/O error: {operation} on path '{path}': {source}")]
#[diagnostic(
    code(balangkas::io),
    help("Check file permissions, disk space, or that the path is correct.")
)]
pub struct IoError {
    pub operation: FileOperation,
    pub path: std::path::PathBuf,
    #[source]
    pub source: std::io::Error,
}
impl IoError {
    pub fn new(operation: FileOperation, path: std::path::PathBuf, error: std::io::Error) -> Self {
        Self {
            operation,
            path,
            source: error,
        }
    }
}
