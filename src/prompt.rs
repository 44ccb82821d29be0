use inquire::{required, Select, Text};
use miette::Diagnostic;
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::mpsc,
};
use thiserror::Error;

use crate::{layout::EntryKind, policy::ConflictDecision};

#[derive(Debug, Error, Diagnostic)]
pub enum PromptError {
    #[error("Prompt was canceled or failed: {source}")]
    #[diagnostic(code(balangkas::prompt::inquire))]
    Inquire {
        #[source]
        source: inquire::InquireError,
    },
}

/// Answers "overwrite the existing entry at `path`?" questions.
///
/// Called synchronously, once per conflict, by whoever applies a desired entry. An
/// implementation that cannot obtain an answer should return [`ConflictDecision::No`].
pub trait DecisionSource {
    fn decide(&mut self, kind: EntryKind, path: &Path) -> ConflictDecision;
}
impl<F> DecisionSource for F
where
    F: FnMut(EntryKind, &Path) -> ConflictDecision,
{
    fn decide(&mut self, kind: EntryKind, path: &Path) -> ConflictDecision {
        self(kind, path)
    }
}

/// Asks on the terminal with a four-way select.
#[derive(Debug, Default)]
pub struct InquireDecisions;
impl DecisionSource for InquireDecisions {
    fn decide(&mut self, kind: EntryKind, path: &Path) -> ConflictDecision {
        let message = format!(
            "The {} at {} already exists. Do you want to overwrite it?",
            kind,
            path.display()
        );
        let labels: Vec<&str> = ConflictDecision::ALL.iter().map(|d| d.label()).collect();

        let answer = Select::new(&message, labels)
            .with_help_message("Yes/No apply to this entry, the 'to All' choices to the rest of the run")
            .prompt();

        match answer {
            Ok(label) => ConflictDecision::ALL
                .into_iter()
                .find(|decision| decision.label() == label)
                .unwrap_or_default(),
            Err(error) => {
                log::warn!("No decision obtained for {}: {}", path.display(), error);
                ConflictDecision::default()
            }
        }
    }
}

/// Always returns the same decision.
#[derive(Debug, Clone, Copy)]
pub struct Always(pub ConflictDecision);
impl DecisionSource for Always {
    fn decide(&mut self, _kind: EntryKind, _path: &Path) -> ConflictDecision {
        self.0
    }
}

/// Replays a fixed sequence of decisions, then answers `No`. Keeps every question it saw.
#[derive(Debug, Default)]
pub struct ScriptedDecisions {
    script: VecDeque<ConflictDecision>,
    requests: Vec<(EntryKind, PathBuf)>,
}
impl ScriptedDecisions {
    pub fn new(script: impl IntoIterator<Item = ConflictDecision>) -> Self {
        Self {
            script: script.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    pub fn requests(&self) -> &[(EntryKind, PathBuf)] {
        &self.requests
    }
}
impl DecisionSource for ScriptedDecisions {
    fn decide(&mut self, kind: EntryKind, path: &Path) -> ConflictDecision {
        self.requests.push((kind, path.to_path_buf()));
        self.script.pop_front().unwrap_or_default()
    }
}

/// A conflict question travelling from a worker thread to the thread that owns the terminal.
#[derive(Debug)]
pub struct DecisionRequest {
    pub kind: EntryKind,
    pub path: PathBuf,
    reply: mpsc::Sender<ConflictDecision>,
}
impl DecisionRequest {
    pub fn answer(self, decision: ConflictDecision) {
        if self.reply.send(decision).is_err() {
            log::debug!("decision for {} arrived after the requester left", self.path.display());
        }
    }

    pub fn answer_with(self, source: &mut dyn DecisionSource) {
        let decision = source.decide(self.kind, &self.path);
        self.answer(decision);
    }
}

/// Worker-side half of [`decision_channel`]. Each call blocks until the request is answered.
#[derive(Debug, Clone)]
pub struct RemoteDecisions {
    requests: mpsc::Sender<DecisionRequest>,
}
impl DecisionSource for RemoteDecisions {
    fn decide(&mut self, kind: EntryKind, path: &Path) -> ConflictDecision {
        let (reply, answer) = mpsc::channel();

        let request = DecisionRequest {
            kind,
            path: path.to_path_buf(),
            reply,
        };

        if self.requests.send(request).is_err() {
            log::warn!("No one is answering conflicts, skipping {}", path.display());
            return ConflictDecision::default();
        }

        answer.recv().unwrap_or_default()
    }
}

/// Interaction-side half of [`decision_channel`].
#[derive(Debug)]
pub struct DecisionRequests {
    receiver: mpsc::Receiver<DecisionRequest>,
}
impl DecisionRequests {
    /// Answers requests one at a time until every [`RemoteDecisions`] has been dropped.
    pub fn serve(&self, source: &mut dyn DecisionSource) {
        while let Ok(request) = self.receiver.recv() {
            request.answer_with(source);
        }
    }
}

/// Connects a build running on another thread to a decision source on this one.
pub fn decision_channel() -> (RemoteDecisions, DecisionRequests) {
    let (requests, receiver) = mpsc::channel();

    (RemoteDecisions { requests }, DecisionRequests { receiver })
}

/// Asks for a replacement name, prefilled with the current one.
pub fn get_new_name(current: &str) -> Result<String, PromptError> {
    Text::new("Enter new name:")
        .with_initial_value(current)
        .with_validator(required!("a name is required"))
        .prompt()
        .map_err(|source| PromptError::Inquire { source })
}
