use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::{
    builder::{BuildError, BuildReport, Builder, CompletionRecord, EntryOutcome, RootChange},
    edit::{self, EditError, RenameOutcome},
    layout::{EntryKind, Layout, LayoutError},
    policy::ConflictDecision,
    preview,
    progress::ConsoleProgress,
    prompt::{self, decision_channel, Always, DecisionSource, InquireDecisions},
    snapshot,
    utils::{absolutize, display_name},
};

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum BalangkasError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Prompt(#[from] prompt::PromptError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Io(#[from] crate::errors::IoError),

    #[error("The build worker stopped unexpectedly")]
    #[diagnostic(code(balangkas::api::worker_panicked))]
    WorkerPanicked,
}

/// How conflicts with existing entries are settled during a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictMode {
    /// Ask on the terminal for each conflict until a "to All" answer.
    #[default]
    Ask,
    Overwrite,
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub layout: Option<PathBuf>,
    pub author: Option<String>,
    pub on_conflict: ConflictMode,
    /// Run on the calling thread instead of a worker thread.
    pub foreground: bool,
}

/// Loads the layout file at `path`, or the built-in layout, applying an author override.
pub fn load_layout(path: Option<&Path>, author: Option<&str>) -> Result<Layout, LayoutError> {
    let layout = match path {
        Some(path) => Layout::from_file(path)?,
        None => Layout::default(),
    };

    Ok(match author {
        Some(author) => layout.with_author(author),
        None => layout,
    })
}

/// Sets `root` and builds the layout under it.
///
/// Returns `None` when `root` is blank, which only clears the (empty) session.
///
/// # Errors
///
/// Returns a [`BalangkasError`] if:
///
/// - The layout file cannot be read or parsed.
/// - The root cannot be created or is not a directory.
/// - The build worker panics.
///
/// Failures on individual entries are part of the returned [`BuildReport`] instead.
pub fn build_layout(root: &str, options: &BuildOptions) -> Result<Option<BuildReport>, BalangkasError> {
    let layout = load_layout(options.layout.as_deref(), options.author.as_deref())?;

    match options.on_conflict {
        ConflictMode::Ask => run_build(root, layout, InquireDecisions, options.foreground),
        ConflictMode::Overwrite => run_build(
            root,
            layout,
            Always(ConflictDecision::YesAll),
            options.foreground,
        ),
        ConflictMode::Skip => run_build(
            root,
            layout,
            Always(ConflictDecision::NoAll),
            options.foreground,
        ),
    }
}

fn run_build<D: DecisionSource>(
    root: &str,
    layout: Layout,
    mut decisions: D,
    foreground: bool,
) -> Result<Option<BuildReport>, BalangkasError> {
    if foreground {
        let mut builder = Builder::new(layout, decisions, ConsoleProgress);

        if let RootChange::Cleared = builder.set_root(root)? {
            return Ok(None);
        }

        return Ok(Some(builder.build()?));
    }

    // the worker asks through the channel, this thread answers with `decisions`
    let (remote, requests) = decision_channel();
    let mut builder = Builder::new(layout, remote, ConsoleProgress);

    if let RootChange::Cleared = builder.set_root(root)? {
        return Ok(None);
    }

    let handle = builder.spawn_build();

    requests.serve(&mut decisions);

    let report = handle.join().map_err(|_| BalangkasError::WorkerPanicked)??;

    Ok(Some(report))
}

/// Renders the tree currently on disk under `root`.
pub fn show_tree(root: &str) -> Result<String, BalangkasError> {
    if root.trim().is_empty() {
        return Err(BuildError::NoRoot.into());
    }

    let root = absolutize(Path::new(root.trim()))?;

    Ok(snapshot::render_text_tree(&root))
}

/// Prints the desired set of the given (or built-in) layout.
pub fn show_layout(layout: Option<&Path>, root_name: &str) -> Result<(), BalangkasError> {
    let layout = load_layout(layout, None)?;

    preview::preview_layout(&layout, root_name);

    Ok(())
}

/// Adds a directory or an empty file below `parent`, asking before replacing anything.
pub fn add_entry(
    parent: &str,
    target: &str,
    kind: EntryKind,
) -> Result<(PathBuf, EntryOutcome), BalangkasError> {
    let parent = Path::new(parent);
    let (_, path) = edit::resolve_within(parent, target)?;

    let outcome = edit::add_entry(parent, kind, target, None, &mut InquireDecisions)?;

    Ok((path, outcome))
}

/// Renames `path`, prompting for the new name when none is given.
pub fn rename_entry(path: &str, new_name: Option<&str>) -> Result<RenameOutcome, BalangkasError> {
    let path = Path::new(path);

    let new_name = match new_name {
        Some(name) => name.to_string(),
        None => prompt::get_new_name(&display_name(path))?,
    };

    Ok(edit::rename_entry(path, &new_name)?)
}

/// One colored line per processed entry, followed by the totals.
pub fn print_report(report: &BuildReport) {
    for (path, outcome) in &report.outcomes {
        print_outcome(path, outcome);
    }

    if report.cancelled {
        println!("{}", "Build cancelled".red());
    }

    if let CompletionRecord::Failed(error) = &report.record {
        println!("{} {}", "warning".yellow(), error);
    }

    println!(
        "{} created, {} overwritten, {} skipped, {} failed ({}/{})",
        report.created(),
        report.overwritten(),
        report.skipped(),
        report.failed(),
        report.completed,
        report.total
    );
}

pub fn print_outcome(path: &Path, outcome: &EntryOutcome) {
    let label = match outcome {
        EntryOutcome::Created => "create".green(),
        EntryOutcome::Overwritten => "overwrite".yellow(),
        EntryOutcome::Skipped => "skip".bright_black(),
        EntryOutcome::Failed(_) => "error".red(),
    };

    match outcome {
        EntryOutcome::Failed(error) => println!("{} {}: {}", label, path.display(), error.source),
        _ => println!("{} {}", label, path.display()),
    }
}
