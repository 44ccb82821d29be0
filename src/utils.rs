use std::path::{Component, Path, PathBuf};

use crate::errors::{FileOperation, IoError};

/// Lexically resolves `.` and `..` components without touching the filesystem.
pub fn normalize_path(source: &Path) -> PathBuf {
    let mut new_path = PathBuf::new();

    for component in source.components() {
        match component {
            // Skip the current-dir marker "."
            Component::CurDir => {}

            // For "..", pop the last component if possible
            Component::ParentDir => {
                new_path.pop();
            }

            // For normal components, push them
            other => new_path.push(other.as_os_str()),
        }
    }

    new_path
}

/// Joins relative paths onto the current directory and normalizes the result.
pub fn absolutize(path: &Path) -> Result<PathBuf, IoError> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }

    let cwd = std::env::current_dir()
        .map_err(|error| IoError::new(FileOperation::CurrentDir, path.to_path_buf(), error))?;

    Ok(normalize_path(&cwd.join(path)))
}

/// `true` when `candidate` lies strictly below `parent`, compared component by component.
pub fn is_strict_descendant(candidate: &Path, parent: &Path) -> bool {
    candidate != parent && candidate.starts_with(parent)
}

/// Display name for a path: its last component, or the whole path for roots like `/`.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|os| os.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
