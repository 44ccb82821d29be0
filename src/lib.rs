//! Scaffolds a project layout under a root directory.
//!
//! A [`Builder`] owns the project root and the conflict policy of the runs made against
//! it. Directories of the desired [`Layout`] are created first, then files, one entry at a
//! time; entries that already exist are overwritten or skipped according to the
//! [`ConflictPolicy`], which asks a [`DecisionSource`] until an "all" answer escalates it.
//! [`snapshot`] reads the result back from disk and renders it as a text tree.
pub mod api;
pub mod builder;
pub mod edit;
pub mod errors;
pub mod layout;
pub mod policy;
pub mod preview;
pub mod progress;
pub mod prompt;
pub mod record;
pub mod snapshot;
mod utils;

pub use builder::{
    resolve_conflict_and_apply, BuildError, BuildReport, Builder, CancelToken, CompletionRecord,
    EntryOutcome, RootChange,
};
pub use edit::{EditError, RenameOutcome};
pub use layout::{DesiredEntry, DirectorySpec, EntryKind, FileSpec, Layout, LayoutError};
pub use policy::{ConflictDecision, ConflictPolicy};
pub use progress::{ProgressSink, ProgressState};
pub use prompt::DecisionSource;
pub use snapshot::{render_text_tree, TreeSnapshot};
