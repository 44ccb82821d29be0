use miette::Diagnostic;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::{
    builder::{resolve_conflict_and_apply, EntryOutcome},
    errors::{FileOperation, IoError},
    layout::EntryKind,
    policy::ConflictPolicy,
    prompt::DecisionSource,
    utils::{absolutize, display_name, is_strict_descendant},
};

#[derive(Debug, Error, Diagnostic)]
pub enum EditError {
    #[error("I/O error within edit domain")]
    #[diagnostic(code(balangkas::edit::io))]
    Io(#[from] IoError),

    #[error("'{target}' is not within '{parent}'")]
    #[diagnostic(
        code(balangkas::edit::outside_parent),
        help("Pick a location inside the selected directory")
    )]
    OutsideParent { target: PathBuf, parent: PathBuf },

    #[error("An item named '{path}' already exists")]
    #[diagnostic(code(balangkas::edit::destination_exists), help("Choose another name"))]
    DestinationExists { path: PathBuf },

    #[error("'{name}' is not a valid entry name")]
    #[diagnostic(
        code(balangkas::edit::invalid_name),
        help("Names cannot be empty, '.', '..' or contain path separators")
    )]
    InvalidName { name: String },

    #[error("Nothing to rename at '{path}'")]
    #[diagnostic(code(balangkas::edit::source_missing))]
    SourceMissing { path: PathBuf },
}

#[derive(Debug, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed(PathBuf),
    Unchanged,
}

fn is_valid_name(name: &str) -> bool {
    lazy_static::lazy_static! {
        static ref ENTRY_NAME_REGEX: regex::Regex =
            regex::Regex::new(r"^[^/\\\x00]+$").expect("a valid regex pattern");
    }

    ENTRY_NAME_REGEX.is_match(name) && name != "." && name != ".."
}

/// Resolves `target` against `parent` and checks that the result lies strictly inside it.
///
/// `target` may be a name relative to `parent` or an absolute path picked elsewhere.
pub fn resolve_within(parent: &Path, target: &str) -> Result<(PathBuf, PathBuf), EditError> {
    let parent = absolutize(parent)?;
    let candidate = Path::new(target);

    let resolved = if candidate.is_absolute() {
        absolutize(candidate)?
    } else {
        absolutize(&parent.join(candidate))?
    };

    if !is_strict_descendant(&resolved, &parent) {
        log::warn!(
            "Selection aborted: {} not within {}",
            resolved.display(),
            parent.display()
        );
        return Err(EditError::OutsideParent {
            target: resolved,
            parent,
        });
    }

    Ok((parent, resolved))
}

/// Creates one directory or file under `parent`.
///
/// An existing target is handled like a build conflict, but with a policy local to this
/// call: "to All" answers act like their single-entry counterparts and nothing carries over
/// to later calls or to a running build.
pub fn add_entry(
    parent: &Path,
    kind: EntryKind,
    target: &str,
    content: Option<&str>,
    decisions: &mut dyn DecisionSource,
) -> Result<EntryOutcome, EditError> {
    let (_, path) = resolve_within(parent, target)?;

    let mut policy = ConflictPolicy::Ask;

    let content = match kind {
        EntryKind::Directory => None,
        EntryKind::File => Some(content.unwrap_or_default()),
    };

    Ok(resolve_conflict_and_apply(
        &path,
        kind,
        content,
        &mut policy,
        decisions,
    ))
}

/// Renames `old` within its directory. Never replaces an existing entry.
pub fn rename_entry(old: &Path, new_name: &str) -> Result<RenameOutcome, EditError> {
    let old = absolutize(old)?;

    if !is_valid_name(new_name) {
        return Err(EditError::InvalidName {
            name: new_name.to_string(),
        });
    }

    if fs::symlink_metadata(&old).is_err() {
        return Err(EditError::SourceMissing { path: old });
    }

    if display_name(&old) == new_name {
        return Ok(RenameOutcome::Unchanged);
    }

    let new_path = match old.parent() {
        Some(parent) => parent.join(new_name),
        None => {
            return Err(EditError::InvalidName {
                name: new_name.to_string(),
            })
        }
    };

    if fs::symlink_metadata(&new_path).is_ok() {
        return Err(EditError::DestinationExists { path: new_path });
    }

    fs::rename(&old, &new_path)
        .map_err(|error| IoError::new(FileOperation::Rename, old.clone(), error))?;

    log::info!("Renamed '{}' to '{}'", old.display(), new_path.display());

    Ok(RenameOutcome::Renamed(new_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        policy::ConflictDecision,
        prompt::{Always, ScriptedDecisions},
    };

    #[test]
    fn test_add_rejects_target_outside_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let parent = tmp.path().join("core");
        fs::create_dir(&parent).unwrap();
        let mut decisions = ScriptedDecisions::default();

        let result = add_entry(&parent, EntryKind::File, "/etc/passwd", None, &mut decisions);

        assert!(matches!(result, Err(EditError::OutsideParent { .. })));
        assert!(decisions.requests().is_empty());
    }

    #[test]
    fn test_add_rejects_sibling_with_shared_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let parent = tmp.path().join("proj");
        let sibling = tmp.path().join("proj2").join("x");

        let result = add_entry(
            &parent,
            EntryKind::Directory,
            sibling.to_str().unwrap(),
            None,
            &mut Always(ConflictDecision::Yes),
        );

        assert!(matches!(result, Err(EditError::OutsideParent { .. })));
        assert!(!sibling.exists());
    }

    #[test]
    fn test_add_rejects_dot_dot_escape() {
        let tmp = tempfile::tempdir().unwrap();

        let result = add_entry(
            tmp.path(),
            EntryKind::File,
            "../escaped.txt",
            None,
            &mut Always(ConflictDecision::Yes),
        );

        assert!(matches!(result, Err(EditError::OutsideParent { .. })));
    }

    #[test]
    fn test_add_creates_relative_file_with_parents() {
        let tmp = tempfile::tempdir().unwrap();

        let outcome = add_entry(
            tmp.path(),
            EntryKind::File,
            "pkg/mod.py",
            Some("# module\n"),
            &mut Always(ConflictDecision::No),
        )
        .unwrap();

        assert!(matches!(outcome, EntryOutcome::Created));
        assert_eq!(
            fs::read_to_string(tmp.path().join("pkg/mod.py")).unwrap(),
            "# module\n"
        );
    }

    #[test]
    fn test_add_conflict_uses_call_scoped_policy() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("a")).unwrap();
        fs::create_dir(tmp.path().join("b")).unwrap();
        let mut decisions = ScriptedDecisions::new([ConflictDecision::NoAll, ConflictDecision::Yes]);

        let first = add_entry(tmp.path(), EntryKind::Directory, "a", None, &mut decisions).unwrap();
        let second = add_entry(tmp.path(), EntryKind::Directory, "b", None, &mut decisions).unwrap();

        assert!(matches!(first, EntryOutcome::Skipped));
        assert!(matches!(second, EntryOutcome::Overwritten));
        assert_eq!(decisions.requests().len(), 2);
    }

    #[test]
    fn test_rename_moves_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let old = tmp.path().join("old.txt");
        fs::write(&old, "x").unwrap();

        let outcome = rename_entry(&old, "new.txt").unwrap();

        assert_eq!(outcome, RenameOutcome::Renamed(tmp.path().join("new.txt")));
        assert!(!old.exists());
    }

    #[test]
    fn test_rename_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let old = tmp.path().join("a");
        fs::write(&old, "a").unwrap();
        fs::write(tmp.path().join("b"), "b").unwrap();

        let result = rename_entry(&old, "b");

        assert!(matches!(result, Err(EditError::DestinationExists { .. })));
        assert_eq!(fs::read_to_string(tmp.path().join("b")).unwrap(), "b");
    }

    #[test]
    fn test_rename_same_name_is_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let old = tmp.path().join("a");
        fs::create_dir(&old).unwrap();

        assert_eq!(rename_entry(&old, "a").unwrap(), RenameOutcome::Unchanged);
    }

    #[test]
    fn test_rename_rejects_invalid_names() {
        let tmp = tempfile::tempdir().unwrap();
        let old = tmp.path().join("a");
        fs::create_dir(&old).unwrap();

        for name in ["", "..", "x/y", "."] {
            assert!(
                matches!(rename_entry(&old, name), Err(EditError::InvalidName { .. })),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rename_missing_source() {
        let tmp = tempfile::tempdir().unwrap();

        let result = rename_entry(&tmp.path().join("nope"), "x");

        assert!(matches!(result, Err(EditError::SourceMissing { .. })));
    }
}
