use std::{fmt, path::Path, str::FromStr};

use miette::Diagnostic;
use thiserror::Error;

use crate::{layout::EntryKind, prompt::DecisionSource};

/// Run-scoped conflict handling. Starts at [`ConflictPolicy::Ask`] and only ever escalates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    #[default]
    Ask,
    OverwriteAll,
    SkipAll,
}

/// Answer to a single "this entry already exists" question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictDecision {
    Yes,
    YesAll,
    #[default]
    No,
    NoAll,
}
impl ConflictDecision {
    pub const ALL: [ConflictDecision; 4] = [Self::Yes, Self::YesAll, Self::No, Self::NoAll];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::YesAll => "yes_all",
            Self::No => "no",
            Self::NoAll => "no_all",
        }
    }

    /// Button-style label shown by interactive prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::YesAll => "Yes to All",
            Self::No => "No",
            Self::NoAll => "No to All",
        }
    }
}
impl fmt::Display for ConflictDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("unknown conflict decision: {value}")]
#[diagnostic(
    code(balangkas::policy::unknown_decision),
    help("Valid decisions are: ['yes', 'yes_all', 'no', 'no_all']")
)]
pub struct UnknownDecision {
    pub value: String,
}

impl FromStr for ConflictDecision {
    type Err = UnknownDecision;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "yes" | "y" => Ok(Self::Yes),
            "yes_all" => Ok(Self::YesAll),
            "no" | "n" => Ok(Self::No),
            "no_all" => Ok(Self::NoAll),
            _ => Err(UnknownDecision {
                value: value.to_string(),
            }),
        }
    }
}

/// What to do with an entry that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Overwrite,
    Skip,
}

impl ConflictPolicy {
    /// Settles one conflict, asking `decisions` only while the policy is still `Ask`.
    pub fn settle(
        &mut self,
        kind: EntryKind,
        path: &Path,
        decisions: &mut dyn DecisionSource,
    ) -> Action {
        match *self {
            Self::OverwriteAll => Action::Overwrite,
            Self::SkipAll => Action::Skip,
            Self::Ask => {
                let decision = decisions.decide(kind, path);

                log::debug!("{} {}: decided {}", kind, path.display(), decision);

                match decision {
                    ConflictDecision::Yes => Action::Overwrite,
                    ConflictDecision::YesAll => {
                        log::debug!("conflict policy escalated to overwrite-all");
                        *self = Self::OverwriteAll;
                        Action::Overwrite
                    }
                    ConflictDecision::No => Action::Skip,
                    ConflictDecision::NoAll => {
                        log::debug!("conflict policy escalated to skip-all");
                        *self = Self::SkipAll;
                        Action::Skip
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedDecisions;

    #[test]
    fn test_ask_consults_source_each_time() {
        let mut policy = ConflictPolicy::Ask;
        let mut decisions =
            ScriptedDecisions::new([ConflictDecision::Yes, ConflictDecision::No]);

        let first = policy.settle(EntryKind::File, Path::new("a"), &mut decisions);
        let second = policy.settle(EntryKind::File, Path::new("b"), &mut decisions);

        assert_eq!(first, Action::Overwrite);
        assert_eq!(second, Action::Skip);
        assert_eq!(policy, ConflictPolicy::Ask);
        assert_eq!(decisions.requests().len(), 2);
    }

    #[test]
    fn test_yes_all_escalates_and_stops_asking() {
        let mut policy = ConflictPolicy::Ask;
        let mut decisions = ScriptedDecisions::new([ConflictDecision::YesAll]);

        policy.settle(EntryKind::Directory, Path::new("a"), &mut decisions);
        let later = policy.settle(EntryKind::File, Path::new("b"), &mut decisions);

        assert_eq!(policy, ConflictPolicy::OverwriteAll);
        assert_eq!(later, Action::Overwrite);
        assert_eq!(decisions.requests().len(), 1);
    }

    #[test]
    fn test_no_all_escalates_to_skip_all() {
        let mut policy = ConflictPolicy::Ask;
        let mut decisions = ScriptedDecisions::new([ConflictDecision::NoAll, ConflictDecision::Yes]);

        let first = policy.settle(EntryKind::Directory, Path::new("a"), &mut decisions);
        let second = policy.settle(EntryKind::Directory, Path::new("b"), &mut decisions);

        assert_eq!((first, second), (Action::Skip, Action::Skip));
        assert_eq!(policy, ConflictPolicy::SkipAll);
        assert_eq!(decisions.requests().len(), 1);
    }

    #[test]
    fn test_parse_decisions() {
        assert_eq!("yes".parse::<ConflictDecision>().unwrap(), ConflictDecision::Yes);
        assert_eq!("Yes-All".parse::<ConflictDecision>().unwrap(), ConflictDecision::YesAll);
        assert_eq!("no_all".parse::<ConflictDecision>().unwrap(), ConflictDecision::NoAll);
        assert!("maybe".parse::<ConflictDecision>().is_err());
    }

    #[test]
    fn test_default_decision_is_no() {
        assert_eq!(ConflictDecision::default(), ConflictDecision::No);
    }
}
