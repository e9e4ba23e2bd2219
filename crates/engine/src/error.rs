//! Notices surfaced to the student when a call against the attempt service
//! fails.
//!
//! A notice is dismissible UI state, not a control-flow error: the machine is
//! already back in its pre-call phase when one is set, and re-triggering the
//! same transition is always an explicit user action, never an automatic
//! retry loop.

use std::fmt;

use attempt_client::ClientError;
use thiserror::Error;

/// The user-visible operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedAction {
    StartQuiz,
    LoadQuestion,
    SubmitAnswer,
    LoadSummary,
    ChooseDifficulty,
    SubmitRemedial,
    StartPractice,
    SubmitPractice,
    GenerateQuestion,
}

impl fmt::Display for FailedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailedAction::StartQuiz => "couldn't start the quiz",
            FailedAction::LoadQuestion => "couldn't load the next question",
            FailedAction::SubmitAnswer => "couldn't submit your answer",
            FailedAction::LoadSummary => "couldn't load your results",
            FailedAction::ChooseDifficulty => "couldn't start remediation",
            FailedAction::SubmitRemedial => "couldn't submit your answer",
            FailedAction::StartPractice => "couldn't start the practice session",
            FailedAction::SubmitPractice => "couldn't submit your answer",
            FailedAction::GenerateQuestion => "couldn't generate another question",
        };
        f.write_str(label)
    }
}

/// A dismissible notice describing one failed call.
#[derive(Debug, Error)]
#[error("{action}: {error}")]
pub struct EngineNotice {
    action: FailedAction,
    #[source]
    error: ClientError,
}

impl EngineNotice {
    #[must_use]
    pub fn new(action: FailedAction, error: ClientError) -> Self {
        Self { action, error }
    }

    #[must_use]
    pub fn action(&self) -> FailedAction {
        self.action
    }

    #[must_use]
    pub fn error(&self) -> &ClientError {
        &self.error
    }
}
