use miette::Diagnostic;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};
use thiserror::Error;

use crate::{
    edit::{self, EditError, RenameOutcome},
    errors::{FileOperation, IoError},
    layout::{processing_order, DirectorySpec, EntryKind, FileSpec, Layout},
    policy::{Action, ConflictPolicy},
    progress::{ProgressSink, ProgressState},
    prompt::DecisionSource,
    record,
    snapshot::TreeSnapshot,
    utils::absolutize,
};

#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("Failed to create project root")]
    #[diagnostic(
        code(balangkas::builder::root_creation),
        help("Check that the parent directory is writable")
    )]
    RootCreation(#[source] IoError),

    #[error("Project root '{path}' exists but is not a directory")]
    #[diagnostic(code(balangkas::builder::root_not_directory))]
    RootNotDirectory { path: PathBuf },

    #[error("Project root is not set")]
    #[diagnostic(
        code(balangkas::builder::no_root),
        help("Set a project root before building or editing the layout")
    )]
    NoRoot,
}

/// What happened to a single entry.
#[derive(Debug)]
pub enum EntryOutcome {
    Created,
    Overwritten,
    Skipped,
    Failed(IoError),
}
impl EntryOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
impl fmt::Display for EntryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Overwritten => write!(f, "overwritten"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed(_) => write!(f, "failed"),
        }
    }
}

/// Outcome of appending the completion line to `logs/LayoutCreation.txt`.
#[derive(Debug)]
pub enum CompletionRecord {
    Written(PathBuf),
    Failed(IoError),
    /// The run was cancelled before it completed.
    NotWritten,
}

#[derive(Debug)]
pub struct BuildReport {
    pub outcomes: Vec<(PathBuf, EntryOutcome)>,
    pub completed: usize,
    pub total: usize,
    pub cancelled: bool,
    pub record: CompletionRecord,
}
impl BuildReport {
    fn count(&self, predicate: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| predicate(outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Created))
    }

    pub fn overwritten(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Overwritten))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(EntryOutcome::is_failed)
    }

    pub fn outcome_of(&self, path: &Path) -> Option<&EntryOutcome> {
        self.outcomes
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, outcome)| outcome)
    }
}

/// Cooperative cancellation flag, checked between entries of a build.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub enum RootChange {
    Cleared,
    Set {
        root: PathBuf,
        created: bool,
        /// Present when auto-build is enabled.
        report: Option<BuildReport>,
    },
}

/// Creates or resolves one entry, consulting `policy` (and through it `decisions`) when
/// the entry already exists. Filesystem failures are logged and returned as
/// [`EntryOutcome::Failed`], never raised.
pub fn resolve_conflict_and_apply(
    path: &Path,
    kind: EntryKind,
    content: Option<&str>,
    policy: &mut ConflictPolicy,
    decisions: &mut dyn DecisionSource,
) -> EntryOutcome {
    if !path.exists() {
        return match create(path, kind, content) {
            Ok(()) => {
                log::info!("{} created: {}", capitalized(kind), path.display());
                EntryOutcome::Created
            }
            Err(error) => {
                log::warn!("Error creating {} {}: {}", kind, path.display(), error);
                EntryOutcome::Failed(error)
            }
        };
    }

    match policy.settle(kind, path, decisions) {
        Action::Skip => {
            log::info!("Skipped {}: {}", kind, path.display());
            EntryOutcome::Skipped
        }
        Action::Overwrite => match overwrite(path, kind, content) {
            Ok(()) => {
                log::info!("Overwritten {}: {}", kind, path.display());
                EntryOutcome::Overwritten
            }
            Err(error) => {
                log::warn!("Error overwriting {} {}: {}", kind, path.display(), error);
                EntryOutcome::Failed(error)
            }
        },
    }
}

fn capitalized(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Directory => "Directory",
        EntryKind::File => "File",
    }
}

fn create(path: &Path, kind: EntryKind, content: Option<&str>) -> Result<(), IoError> {
    match kind {
        EntryKind::Directory => create_directory(path),
        EntryKind::File => {
            // a file's parent need not be part of the declared set
            if let Some(parent) = path.parent() {
                create_directory(parent)?;
            }
            write_file(path, content.unwrap_or_default())
        }
    }
}

fn overwrite(path: &Path, kind: EntryKind, content: Option<&str>) -> Result<(), IoError> {
    match kind {
        EntryKind::Directory => {
            let result = if path.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            result.map_err(|error| IoError::new(FileOperation::RemoveDir, path.into(), error))?;

            create_directory(path)
        }
        EntryKind::File => write_file(path, content.unwrap_or_default()),
    }
}

fn create_directory(path: &Path) -> Result<(), IoError> {
    fs::create_dir_all(path).map_err(|error| IoError::new(FileOperation::Mkdir, path.into(), error))
}

fn write_file(path: &Path, contents: &str) -> Result<(), IoError> {
    fs::write(path, contents).map_err(|error| IoError::new(FileOperation::Write, path.into(), error))
}

/// Owns a project root and the conflict policy of the runs made against it.
///
/// All mutations happen one entry at a time, in declaration order, on whichever thread
/// calls [`Builder::build`]. Use [`Builder::spawn_build`] to move that work off the
/// interactive thread.
#[derive(Debug)]
pub struct Builder<D, P> {
    root: Option<PathBuf>,
    policy: ConflictPolicy,
    layout: Layout,
    auto_build: bool,
    cancel: CancelToken,
    snapshot: Option<TreeSnapshot>,
    decisions: D,
    progress: P,
}

impl<D: DecisionSource, P: ProgressSink> Builder<D, P> {
    pub fn new(layout: Layout, decisions: D, progress: P) -> Self {
        Self {
            root: None,
            policy: ConflictPolicy::default(),
            layout,
            auto_build: false,
            cancel: CancelToken::new(),
            snapshot: None,
            decisions,
            progress,
        }
    }

    /// Build the layout as soon as a root is set.
    pub fn with_auto_build(mut self, auto_build: bool) -> Self {
        self.auto_build = auto_build;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn decisions(&self) -> &D {
        &self.decisions
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    /// The view refreshed by the last root change, build or edit.
    pub fn snapshot(&self) -> Option<&TreeSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn refresh_snapshot(&mut self) -> Option<&TreeSnapshot> {
        self.snapshot = self.root.as_deref().map(TreeSnapshot::materialize);
        self.snapshot.as_ref()
    }

    /// Points the builder at a new root, creating it if needed, and resets the conflict
    /// policy. A blank `path` clears the root and the snapshot without touching disk.
    pub fn set_root(&mut self, path: &str) -> Result<RootChange, BuildError> {
        let trimmed = path.trim();

        if trimmed.is_empty() {
            self.root = None;
            self.snapshot = None;
            log::info!("Project root is blank. Layout removed.");
            return Ok(RootChange::Cleared);
        }

        let root = absolutize(Path::new(trimmed)).map_err(BuildError::RootCreation)?;

        let mut created = false;
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|error| {
                BuildError::RootCreation(IoError::new(FileOperation::Mkdir, root.clone(), error))
            })?;
            log::info!("Project root created: {}", root.display());
            created = true;
        } else if !root.is_dir() {
            return Err(BuildError::RootNotDirectory { path: root });
        }

        log::info!("Project root set to: {}", root.display());

        self.root = Some(root.clone());
        self.policy = ConflictPolicy::Ask;
        self.refresh_snapshot();

        let report = if self.auto_build {
            Some(self.build()?)
        } else {
            log::info!("Auto build is disabled. Manage your layout manually.");
            None
        };

        Ok(RootChange::Set {
            root,
            created,
            report,
        })
    }

    /// Builds the configured [`Layout`].
    pub fn build(&mut self) -> Result<BuildReport, BuildError> {
        let layout = self.layout.clone();

        self.build_desired_tree(&layout.directories, &layout.files)
    }

    /// Ensures `directories` then `files` exist under the root, in declaration order.
    pub fn build_desired_tree(
        &mut self,
        directories: &[DirectorySpec],
        files: &[FileSpec],
    ) -> Result<BuildReport, BuildError> {
        let root = self.root.clone().ok_or(BuildError::NoRoot)?;

        let mut state = ProgressState::new(directories.len() + files.len());
        let mut outcomes = Vec::with_capacity(state.total);
        let mut cancelled = false;

        for entry in processing_order(directories, files) {
            if self.cancel.is_cancelled() {
                log::warn!(
                    "Build cancelled after {} of {} entries",
                    state.completed,
                    state.total
                );
                cancelled = true;
                break;
            }

            let path = root.join(entry.path());

            let outcome = resolve_conflict_and_apply(
                &path,
                entry.kind(),
                entry.content(),
                &mut self.policy,
                &mut self.decisions,
            );
            outcomes.push((path, outcome));

            state.advance();
            self.progress.report(&state);
        }

        let record = if cancelled {
            CompletionRecord::NotWritten
        } else {
            self.progress.finished(&state);
            log::info!("Project structure creation completed.");

            match record::append_completion_record(&root, &self.layout.author) {
                Ok(path) => CompletionRecord::Written(path),
                Err(error) => {
                    log::warn!("Error writing to layout creation log: {}", error);
                    CompletionRecord::Failed(error)
                }
            }
        };

        self.refresh_snapshot();

        Ok(BuildReport {
            outcomes,
            completed: state.completed,
            total: state.total,
            cancelled,
            record,
        })
    }

    /// Adds a single directory or file below `parent`. Conflicts are asked about with a
    /// fresh policy that is discarded afterwards; the run policy is left alone.
    pub fn add_entry(
        &mut self,
        parent: &Path,
        kind: EntryKind,
        target: &str,
    ) -> Result<EntryOutcome, EditError> {
        let outcome = edit::add_entry(parent, kind, target, None, &mut self.decisions)?;
        self.refresh_snapshot();
        Ok(outcome)
    }

    pub fn rename_entry(&mut self, old: &Path, new_name: &str) -> Result<RenameOutcome, EditError> {
        let outcome = edit::rename_entry(old, new_name)?;
        self.refresh_snapshot();
        Ok(outcome)
    }
}

impl<D, P> Builder<D, P>
where
    D: DecisionSource + Send + 'static,
    P: ProgressSink + Send + 'static,
{
    /// Runs [`Builder::build`] on a worker thread.
    ///
    /// The builder is dropped when the thread finishes, which closes any
    /// [`crate::prompt::RemoteDecisions`] it owns and ends the matching
    /// [`crate::prompt::DecisionRequests::serve`] loop.
    pub fn spawn_build(mut self) -> JoinHandle<Result<BuildReport, BuildError>> {
        thread::spawn(move || self.build())
    }
}
