use std::mem;

use attempt_client::{GeneratedQuestion, PracticeFeedback, PracticeStart};
use quiz_core::SessionStats;
use quiz_core::model::{OptionId, PracticeSession, PracticeSessionId, QuestionId, QuizQuestion};

/// Phase of one ungraded practice session.
#[derive(Debug, Clone, PartialEq)]
pub enum PracticePhase {
    /// Waiting for the student to pick a difficulty. Also where a failed
    /// session start lands so the pick can be retried.
    DifficultySelect,
    Loading,
    Question {
        selected: Option<OptionId>,
    },
    Feedback {
        selected: OptionId,
        feedback: PracticeFeedback,
    },
    /// Every issued question is answered; the student may generate one more
    /// or end the session.
    SessionComplete,
    /// Terminal; the final stats and the quiz-context flag stay readable.
    Ended,
}

/// Synchronous state machine for one practice session.
///
/// Same `begin_*`/`apply_*`/`fail_pending` discipline as the graded quiz
/// machine: `begin_*` arms the single in-flight guard and returns the request
/// to issue, `apply_*` commits the response, `fail_pending` rolls back. The
/// question list lives in a [`PracticeSession`] and is append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeMachine {
    phase: PracticePhase,
    session: Option<PracticeSession>,
    stats: SessionStats,
    busy: bool,
}

impl PracticeMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: PracticePhase::DifficultySelect,
            session: None,
            stats: SessionStats::new(),
            busy: false,
        }
    }

    #[must_use]
    pub fn phase(&self) -> &PracticePhase {
        &self.phase
    }

    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, PracticePhase::Ended)
    }

    #[must_use]
    pub fn session(&self) -> Option<&PracticeSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.phase {
            PracticePhase::Question { .. } => {
                self.session.as_ref().and_then(PracticeSession::current_question)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&PracticeFeedback> {
        match &self.phase {
            PracticePhase::Feedback { feedback, .. } => Some(feedback),
            _ => None,
        }
    }

    /// Whether generation was seeded from the student's prior quiz mistakes.
    /// Meaningful once a session has started; surfaced at session end.
    #[must_use]
    pub fn quiz_context_used(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(PracticeSession::quiz_context_used)
    }

    pub fn select_option(&mut self, option: OptionId) -> bool {
        if self.busy {
            return false;
        }
        let valid = self
            .current_question()
            .is_some_and(|question| question.has_option(option));
        match &mut self.phase {
            PracticePhase::Question { selected } if valid => {
                *selected = Some(option);
                true
            }
            _ => false,
        }
    }

    /// Arms the guard for the session-start fetch.
    pub fn begin_start(&mut self) -> bool {
        if self.busy || !matches!(self.phase, PracticePhase::DifficultySelect) {
            return false;
        }
        self.busy = true;
        self.phase = PracticePhase::Loading;
        true
    }

    /// Commits a started session: fresh stats, index on the first question.
    /// An empty initial batch lands directly on `SessionComplete`.
    pub fn apply_started(&mut self, start: PracticeStart) {
        self.busy = false;
        self.stats.reset();
        let session = PracticeSession::new(start.session_id, start.questions, start.quiz_context_used);
        self.phase = if session.is_drained() {
            PracticePhase::SessionComplete
        } else {
            PracticePhase::Question { selected: None }
        };
        self.session = Some(session);
    }

    /// Arms the guard for an answer submission.
    pub fn begin_submit(&mut self) -> Option<(PracticeSessionId, QuestionId, OptionId)> {
        if self.busy {
            return None;
        }
        let PracticePhase::Question {
            selected: Some(option),
        } = self.phase
        else {
            return None;
        };
        let session = self.session.as_ref()?;
        let question = session.current_question()?;
        self.busy = true;
        Some((session.session_id(), question.id(), option))
    }

    /// Commits graded practice feedback. The running counters are mirrored
    /// from the server, not recomputed.
    pub fn apply_feedback(&mut self, feedback: PracticeFeedback) {
        self.busy = false;
        match mem::replace(&mut self.phase, PracticePhase::Loading) {
            PracticePhase::Question {
                selected: Some(selected),
            } => {
                self.stats
                    .set_from_server(feedback.questions_completed, feedback.total_correct);
                self.phase = PracticePhase::Feedback { selected, feedback };
            }
            other => self.phase = other,
        }
    }

    /// Leaves feedback: next issued question, or `SessionComplete` once the
    /// list is drained. Local transition, never a fetch.
    pub fn next(&mut self) -> bool {
        if self.busy || !matches!(self.phase, PracticePhase::Feedback { .. }) {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.advance();
        self.phase = if session.is_drained() {
            PracticePhase::SessionComplete
        } else {
            PracticePhase::Question { selected: None }
        };
        true
    }

    /// Arms the guard for generating one more question.
    pub fn begin_generate(&mut self) -> Option<PracticeSessionId> {
        if self.busy || !matches!(self.phase, PracticePhase::SessionComplete) {
            return None;
        }
        let session = self.session.as_ref()?;
        let session_id = session.session_id();
        self.busy = true;
        self.phase = PracticePhase::Loading;
        Some(session_id)
    }

    /// Commits a generated question: appended at the end, index lands on it.
    pub fn apply_generated(&mut self, generated: GeneratedQuestion) {
        self.busy = false;
        if let Some(session) = self.session.as_mut() {
            session.append_generated(generated.question);
            self.phase = PracticePhase::Question { selected: None };
        }
    }

    /// Rolls back a failed call: disarms the guard and returns the displaced
    /// phase. A failed start goes back to the difficulty picker; a failed
    /// generate goes back to `SessionComplete`.
    pub fn fail_pending(&mut self) {
        self.busy = false;
        if matches!(self.phase, PracticePhase::Loading) {
            self.phase = if self.session.is_some() {
                PracticePhase::SessionComplete
            } else {
                PracticePhase::DifficultySelect
            };
        }
    }

    /// Terminal end; stats and the quiz-context flag remain readable.
    pub fn end(&mut self) {
        self.busy = false;
        self.phase = PracticePhase::Ended;
    }
}

impl Default for PracticeMachine {
    fn default() -> Self {
        Self::new()
    }
}
