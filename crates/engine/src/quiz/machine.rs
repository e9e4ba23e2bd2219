use std::mem;

use attempt_client::{RemedialFeedback, RemedialQuestion};
use quiz_core::SessionStats;
use quiz_core::model::{Attempt, OptionId, QuestionId, QuizQuestion, QuizSummary, RemedialId};

use crate::remediation::RemediationSequencer;

/// Phase of one graded quiz-taking session.
///
/// One tagged value plus payload per phase; there is no separate "submitting"
/// or "showing feedback" boolean that could disagree with it. The payload is
/// everything the UI may render in that phase.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizPhase {
    /// Initializing, or transiently re-entered while a summary or a
    /// current-question re-fetch is in flight.
    Loading,
    Question {
        question: QuizQuestion,
        index: usize,
        selected: Option<OptionId>,
    },
    /// The selected option stays in the payload so the UI can keep it
    /// highlighted alongside correctness coloring until the next question
    /// loads.
    Feedback {
        question: QuizQuestion,
        index: usize,
        selected: OptionId,
        attempt: Attempt,
    },
    Summary {
        summary: QuizSummary,
    },
    RemediationSelect,
    RemediationQuestion {
        remedial_id: RemedialId,
        question: QuizQuestion,
        selected: Option<OptionId>,
    },
    RemediationFeedback {
        remedial_id: RemedialId,
        question: QuizQuestion,
        feedback: RemedialFeedback,
    },
    Completed,
    /// Abandoned or terminally failed; no transition leaves this phase.
    Closed,
}

/// What the controller must fetch to complete a `Continue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueOutcome {
    /// The look-ahead question was used; no network needed.
    Advanced,
    /// Every base question is answered; fetch the summary.
    FetchSummary,
    /// The server provided neither signal; re-fetch the current question and
    /// branch on whether one comes back.
    FetchCurrent,
    Blocked,
}

/// Outcome of asking to remediate the current missed concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChooseOutcome {
    /// Issue `chooseRemedialDifficulty` for this question.
    Request(QuestionId),
    /// The pointer had already run past the end; the machine moved straight
    /// to `Completed`.
    AlreadyExhausted,
    Blocked,
}

/// Outcome of continuing past remedial feedback. All variants are local
/// transitions; continuing never touches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemedialAdvance {
    /// More questions on the same concept, same remedial id.
    SameConcept,
    /// Concept done, more missed concepts remain.
    NextConcept,
    /// Concept done and none remain.
    Done,
    Blocked,
}

/// Synchronous state machine for one graded quiz session.
///
/// The machine never performs I/O. Network transitions are split into a
/// `begin_*` call that arms the single in-flight guard and returns the request
/// to issue, and an `apply_*`/`fail_pending` call that commits or rolls back
/// the outcome. While the guard is armed every other `begin_*` and every
/// select is a no-op, so a double-click can never issue a second request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizStateMachine {
    phase: QuizPhase,
    /// Phase to restore if a fetch that displaced it fails.
    saved: Option<QuizPhase>,
    busy: bool,
    total_questions: usize,
    base_answered: usize,
    stats: SessionStats,
    sequencer: Option<RemediationSequencer>,
}

impl QuizStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: QuizPhase::Loading,
            saved: None,
            busy: false,
            total_questions: 0,
            base_answered: 0,
            stats: SessionStats::new(),
            sequencer: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> &QuizPhase {
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
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.phase, QuizPhase::Closed)
    }

    /// The question currently awaiting an answer, in either flow.
    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match &self.phase {
            QuizPhase::Question { question, .. }
            | QuizPhase::RemediationQuestion { question, .. } => Some(question),
            _ => None,
        }
    }

    /// Graded feedback for the question just answered in the base quiz.
    #[must_use]
    pub fn feedback(&self) -> Option<&Attempt> {
        match &self.phase {
            QuizPhase::Feedback { attempt, .. } => Some(attempt),
            _ => None,
        }
    }

    #[must_use]
    pub fn remedial_feedback(&self) -> Option<&RemedialFeedback> {
        match &self.phase {
            QuizPhase::RemediationFeedback { feedback, .. } => Some(feedback),
            _ => None,
        }
    }

    /// Fraction shown by the progress indicator. Recomputed on every call,
    /// never stored, so it cannot drift from the phase.
    #[must_use]
    pub fn progress(&self) -> f64 {
        match &self.phase {
            QuizPhase::Completed | QuizPhase::Closed | QuizPhase::Summary { .. } => 1.0,
            QuizPhase::RemediationSelect
            | QuizPhase::RemediationQuestion { .. }
            | QuizPhase::RemediationFeedback { .. } => match &self.sequencer {
                Some(seq) if seq.concept_total() > 0 => {
                    seq.concept_index() as f64 / seq.concept_total() as f64
                }
                _ => 1.0,
            },
            _ if self.total_questions == 0 => 0.0,
            _ => {
                self.base_answered.min(self.total_questions) as f64 / self.total_questions as f64
            }
        }
    }

    /// Records the student's option pick. Valid only while a question is on
    /// screen and nothing is in flight.
    pub fn select_option(&mut self, option: OptionId) -> bool {
        if self.busy {
            return false;
        }
        match &mut self.phase {
            QuizPhase::Question {
                question, selected, ..
            }
            | QuizPhase::RemediationQuestion {
                question, selected, ..
            } if question.has_option(option) => {
                *selected = Some(option);
                true
            }
            _ => false,
        }
    }

    //
    // ─── INITIALIZATION ────────────────────────────────────────────────────────
    //

    /// Arms the guard for the initial fetch. Only valid once, from `Loading`.
    pub fn begin_initialize(&mut self) -> bool {
        if self.busy || !matches!(self.phase, QuizPhase::Loading) {
            return false;
        }
        self.busy = true;
        true
    }

    /// Commits a fetched question (initialization or current-question
    /// re-fetch).
    pub fn apply_question(&mut self, question: QuizQuestion, index: usize, total: usize) {
        self.busy = false;
        self.saved = None;
        self.total_questions = total;
        self.base_answered = index;
        self.phase = QuizPhase::Question {
            question,
            index,
            selected: None,
        };
    }

    /// Commits a fetched summary.
    pub fn apply_summary(&mut self, summary: QuizSummary) {
        self.busy = false;
        self.saved = None;
        if self.total_questions == 0 {
            self.total_questions = summary.results().len();
        }
        self.base_answered = self.total_questions;
        self.phase = QuizPhase::Summary { summary };
    }

    //
    // ─── BASE QUIZ ─────────────────────────────────────────────────────────────
    //

    /// Arms the guard for an answer submission and returns what to submit.
    /// `None` when no option is selected or a request is already in flight.
    pub fn begin_submit(&mut self) -> Option<(QuestionId, OptionId)> {
        if self.busy {
            return None;
        }
        match &self.phase {
            QuizPhase::Question {
                question,
                selected: Some(option),
                ..
            } => {
                self.busy = true;
                Some((question.id(), *option))
            }
            _ => None,
        }
    }

    /// Commits graded feedback for the current base question.
    pub fn apply_attempt(&mut self, attempt: Attempt) {
        self.busy = false;
        match mem::replace(&mut self.phase, QuizPhase::Loading) {
            QuizPhase::Question {
                question,
                index,
                selected: Some(selected),
            } => {
                self.stats.record_answer(attempt.is_correct());
                self.base_answered = index + 1;
                self.phase = QuizPhase::Feedback {
                    question,
                    index,
                    selected,
                    attempt,
                };
            }
            other => self.phase = other,
        }
    }

    /// Leaves feedback. Uses the look-ahead when the server sent one;
    /// otherwise reports which fetch the controller must issue. For a fetch,
    /// the phase moves to `Loading` and the feedback is stashed for rollback.
    pub fn begin_continue(&mut self) -> ContinueOutcome {
        if self.busy || !matches!(self.phase, QuizPhase::Feedback { .. }) {
            return ContinueOutcome::Blocked;
        }
        match mem::replace(&mut self.phase, QuizPhase::Loading) {
            QuizPhase::Feedback {
                question,
                index,
                selected,
                mut attempt,
            } => {
                if let Some(next) = attempt.take_next_question() {
                    self.phase = QuizPhase::Question {
                        question: next,
                        index: index + 1,
                        selected: None,
                    };
                    return ContinueOutcome::Advanced;
                }
                let outcome = if attempt.all_questions_answered() == Some(true) {
                    ContinueOutcome::FetchSummary
                } else {
                    ContinueOutcome::FetchCurrent
                };
                self.saved = Some(QuizPhase::Feedback {
                    question,
                    index,
                    selected,
                    attempt,
                });
                self.busy = true;
                outcome
            }
            other => {
                self.phase = other;
                ContinueOutcome::Blocked
            }
        }
    }

    //
    // ─── REMEDIATION ───────────────────────────────────────────────────────────
    //

    /// `Summary -> RemediationSelect`. Local transition; derives the missed
    /// concept list from the summary, in summary order.
    pub fn start_remediation(&mut self) -> bool {
        if self.busy {
            return false;
        }
        let has_plan = matches!(
            &self.phase,
            QuizPhase::Summary { summary } if summary.has_remedial_plan()
        );
        if !has_plan {
            return false;
        }
        match mem::replace(&mut self.phase, QuizPhase::RemediationSelect) {
            QuizPhase::Summary { summary } => {
                self.sequencer = Some(RemediationSequencer::from_summary(&summary));
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    /// Arms the guard for a difficulty choice against the current missed
    /// concept. If the pointer already ran past the end, jumps to `Completed`
    /// instead of issuing anything.
    pub fn begin_choose_difficulty(&mut self) -> ChooseOutcome {
        if self.busy || !matches!(self.phase, QuizPhase::RemediationSelect) {
            return ChooseOutcome::Blocked;
        }
        match self.sequencer.as_ref().and_then(RemediationSequencer::current_target) {
            Some(target) => {
                let question_id = target.question_id;
                self.busy = true;
                ChooseOutcome::Request(question_id)
            }
            None => {
                self.phase = QuizPhase::Completed;
                ChooseOutcome::AlreadyExhausted
            }
        }
    }

    /// Commits the first question of a remedial sub-session.
    pub fn apply_remedial_question(&mut self, response: RemedialQuestion) {
        self.busy = false;
        self.phase = QuizPhase::RemediationQuestion {
            remedial_id: response.remedial_id,
            question: response.question,
            selected: None,
        };
    }

    /// Arms the guard for a remedial answer submission.
    pub fn begin_submit_remedial(&mut self) -> Option<(RemedialId, OptionId)> {
        if self.busy {
            return None;
        }
        match &self.phase {
            QuizPhase::RemediationQuestion {
                remedial_id,
                selected: Some(option),
                ..
            } => {
                let request = (*remedial_id, *option);
                self.busy = true;
                Some(request)
            }
            _ => None,
        }
    }

    /// Commits remedial feedback.
    pub fn apply_remedial_feedback(&mut self, feedback: RemedialFeedback) {
        self.busy = false;
        match mem::replace(&mut self.phase, QuizPhase::Loading) {
            QuizPhase::RemediationQuestion {
                remedial_id,
                question,
                selected: Some(_),
            } => {
                self.stats.record_answer(feedback.is_correct);
                self.phase = QuizPhase::RemediationFeedback {
                    remedial_id,
                    question,
                    feedback,
                };
            }
            other => self.phase = other,
        }
    }

    /// Leaves remedial feedback. Stays on the same concept while the server
    /// keeps sending questions for it, otherwise advances the pointer.
    pub fn continue_remedial(&mut self) -> RemedialAdvance {
        if self.busy || !matches!(self.phase, QuizPhase::RemediationFeedback { .. }) {
            return RemedialAdvance::Blocked;
        }
        match mem::replace(&mut self.phase, QuizPhase::Loading) {
            QuizPhase::RemediationFeedback {
                remedial_id,
                feedback,
                ..
            } => {
                if let Some(next) = feedback.next_question {
                    self.phase = QuizPhase::RemediationQuestion {
                        remedial_id,
                        question: next,
                        selected: None,
                    };
                    return RemedialAdvance::SameConcept;
                }
                // No follow-up question means the concept is done even if the
                // server omitted the explicit flag.
                let more = self
                    .sequencer
                    .as_mut()
                    .is_some_and(RemediationSequencer::advance);
                if more {
                    self.phase = QuizPhase::RemediationSelect;
                    RemedialAdvance::NextConcept
                } else {
                    self.phase = QuizPhase::Completed;
                    RemedialAdvance::Done
                }
            }
            other => {
                self.phase = other;
                RemedialAdvance::Blocked
            }
        }
    }

    //
    // ─── FAILURE & CLOSE ───────────────────────────────────────────────────────
    //

    /// Rolls back a failed call: disarms the guard and restores any phase the
    /// fetch had displaced. The phase is then exactly the pre-call one.
    pub fn fail_pending(&mut self) {
        self.busy = false;
        if let Some(saved) = self.saved.take() {
            self.phase = saved;
        }
    }

    /// Terminal close; nothing transitions out of `Closed`.
    pub fn close(&mut self) {
        self.busy = false;
        self.saved = None;
        self.phase = QuizPhase::Closed;
    }
}

impl Default for QuizStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AttemptId, Difficulty, QuestionOption, QuestionResult};

    fn question(id: u64) -> QuizQuestion {
        QuizQuestion::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec![
                QuestionOption::new(OptionId::new(1), "a"),
                QuestionOption::new(OptionId::new(2), "b"),
            ],
            Difficulty::Standard,
        )
        .unwrap()
    }

    fn machine_on_question(index: usize, total: usize) -> QuizStateMachine {
        let mut machine = QuizStateMachine::new();
        assert!(machine.begin_initialize());
        machine.apply_question(question(index as u64 + 1), index, total);
        machine
    }

    fn attempt(question_id: u64, is_correct: bool) -> Attempt {
        let score = if is_correct { 1.0 } else { 0.0 };
        Attempt::new(
            QuestionId::new(question_id),
            OptionId::new(1),
            is_correct,
            score,
        )
        .unwrap()
    }

    fn summary_with_wrong() -> QuizSummary {
        QuizSummary::new(
            AttemptId::mint(),
            0.5,
            50.0,
            vec![
                QuestionResult {
                    question_id: QuestionId::new(1),
                    question_text: "Q1".into(),
                    is_correct: false,
                },
                QuestionResult {
                    question_id: QuestionId::new(2),
                    question_text: "Q2".into(),
                    is_correct: true,
                },
            ],
            true,
        )
        .unwrap()
    }

    #[test]
    fn submit_requires_a_selection() {
        let mut machine = machine_on_question(0, 2);
        assert_eq!(machine.begin_submit(), None);
        assert!(machine.select_option(OptionId::new(1)));
        assert!(machine.begin_submit().is_some());
    }

    #[test]
    fn second_submit_while_in_flight_is_a_noop() {
        let mut machine = machine_on_question(0, 2);
        machine.select_option(OptionId::new(1));
        assert!(machine.begin_submit().is_some());
        // Double-click before the first request resolves.
        assert_eq!(machine.begin_submit(), None);
        assert!(!machine.select_option(OptionId::new(2)));
    }

    #[test]
    fn selecting_an_unknown_option_is_rejected() {
        let mut machine = machine_on_question(0, 2);
        assert!(!machine.select_option(OptionId::new(99)));
    }

    #[test]
    fn feedback_keeps_the_selected_option() {
        let mut machine = machine_on_question(0, 2);
        machine.select_option(OptionId::new(1));
        machine.begin_submit().unwrap();
        machine.apply_attempt(attempt(1, true));
        match machine.phase() {
            QuizPhase::Feedback { selected, .. } => assert_eq!(*selected, OptionId::new(1)),
            other => panic!("expected feedback, got {other:?}"),
        }
        assert_eq!(machine.stats().questions_completed(), 1);
    }

    #[test]
    fn continue_uses_lookahead_without_network() {
        let mut machine = machine_on_question(0, 2);
        machine.select_option(OptionId::new(1));
        machine.begin_submit().unwrap();
        machine.apply_attempt(attempt(1, true).with_next_question(question(2)));

        assert_eq!(machine.begin_continue(), ContinueOutcome::Advanced);
        match machine.phase() {
            QuizPhase::Question {
                question,
                index,
                selected,
            } => {
                assert_eq!(question.id(), QuestionId::new(2));
                assert_eq!(*index, 1);
                assert_eq!(*selected, None);
            }
            other => panic!("expected question, got {other:?}"),
        }
    }

    #[test]
    fn continue_without_signals_falls_back_to_refetch() {
        let mut machine = machine_on_question(0, 2);
        machine.select_option(OptionId::new(1));
        machine.begin_submit().unwrap();
        machine.apply_attempt(attempt(1, true));

        assert_eq!(machine.begin_continue(), ContinueOutcome::FetchCurrent);
        assert!(machine.is_busy());
        assert!(matches!(machine.phase(), QuizPhase::Loading));
    }

    #[test]
    fn failed_fetch_restores_the_displaced_feedback() {
        let mut machine = machine_on_question(0, 1);
        machine.select_option(OptionId::new(1));
        machine.begin_submit().unwrap();
        machine.apply_attempt(attempt(1, true).with_all_questions_answered(true));

        assert_eq!(machine.begin_continue(), ContinueOutcome::FetchSummary);
        machine.fail_pending();
        assert!(!machine.is_busy());
        assert!(matches!(machine.phase(), QuizPhase::Feedback { .. }));
    }

    #[test]
    fn remediation_only_starts_with_a_plan() {
        let mut machine = QuizStateMachine::new();
        machine.begin_initialize();
        let summary = QuizSummary::new(
            AttemptId::mint(),
            1.0,
            100.0,
            vec![QuestionResult {
                question_id: QuestionId::new(1),
                question_text: "Q1".into(),
                is_correct: true,
            }],
            false,
        )
        .unwrap();
        machine.apply_summary(summary);
        assert!(!machine.start_remediation());
        assert!(matches!(machine.phase(), QuizPhase::Summary { .. }));
    }

    #[test]
    fn single_concept_remediation_runs_to_completed() {
        let mut machine = QuizStateMachine::new();
        machine.begin_initialize();
        machine.apply_summary(summary_with_wrong());
        assert!(machine.start_remediation());

        // Walk the single wrong concept to completion, then ask again.
        match machine.begin_choose_difficulty() {
            ChooseOutcome::Request(id) => assert_eq!(id, QuestionId::new(1)),
            other => panic!("expected request, got {other:?}"),
        }
        machine.apply_remedial_question(RemedialQuestion {
            remedial_id: RemedialId::mint(),
            question: question(10),
        });
        machine.select_option(OptionId::new(1));
        machine.begin_submit_remedial().unwrap();
        machine.apply_remedial_feedback(RemedialFeedback {
            is_correct: true,
            explanation: None,
            next_question: None,
            remedial_completed: true,
        });
        assert_eq!(machine.continue_remedial(), RemedialAdvance::Done);
        assert!(matches!(machine.phase(), QuizPhase::Completed));
        assert!((machine.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn remedial_next_question_stays_on_the_same_concept() {
        let mut machine = QuizStateMachine::new();
        machine.begin_initialize();
        machine.apply_summary(summary_with_wrong());
        machine.start_remediation();
        machine.begin_choose_difficulty();
        let remedial_id = RemedialId::mint();
        machine.apply_remedial_question(RemedialQuestion {
            remedial_id,
            question: question(10),
        });
        machine.select_option(OptionId::new(2));
        machine.begin_submit_remedial().unwrap();
        machine.apply_remedial_feedback(RemedialFeedback {
            is_correct: false,
            explanation: None,
            next_question: Some(question(11)),
            remedial_completed: false,
        });

        assert_eq!(machine.continue_remedial(), RemedialAdvance::SameConcept);
        match machine.phase() {
            QuizPhase::RemediationQuestion {
                remedial_id: id, ..
            } => assert_eq!(*id, remedial_id),
            other => panic!("expected remedial question, got {other:?}"),
        }
    }

    #[test]
    fn progress_is_recomputed_per_phase() {
        let mut machine = machine_on_question(0, 4);
        assert!((machine.progress() - 0.0).abs() < f64::EPSILON);
        machine.select_option(OptionId::new(1));
        machine.begin_submit().unwrap();
        machine.apply_attempt(attempt(1, true).with_next_question(question(2)));
        assert!((machine.progress() - 0.25).abs() < f64::EPSILON);
        machine.begin_continue();
        assert!((machine.progress() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn closed_machine_ignores_everything() {
        let mut machine = machine_on_question(0, 2);
        machine.close();
        assert!(!machine.select_option(OptionId::new(1)));
        assert_eq!(machine.begin_submit(), None);
        assert_eq!(machine.begin_continue(), ContinueOutcome::Blocked);
        assert!(!machine.start_remediation());
    }
}
