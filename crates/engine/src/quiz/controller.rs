use std::sync::Arc;

use attempt_client::AttemptClient;
use chrono::{DateTime, Utc};
use quiz_core::model::{Attempt, AttemptId, Difficulty, OptionId, QuizId, QuizQuestion};
use quiz_core::{Clock, SessionStats};

use crate::dispatch::Dispatch;
use crate::error::{EngineNotice, FailedAction};
use crate::liveness::LivenessToken;
use crate::quiz::machine::{
    ChooseOutcome, ContinueOutcome, QuizPhase, QuizStateMachine, RemedialAdvance,
};

/// How a quiz session comes into being: freshly started, or resumed against
/// an attempt the student already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizLaunch {
    Fresh(QuizId),
    Resume(AttemptId),
}

/// Events the quiz surface may dispatch. Each maps to at most one service
/// call; most are guarded local transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizEvent {
    SelectOption(OptionId),
    Submit,
    Continue,
    StartRemediation,
    ChooseDifficulty(Difficulty),
    SubmitRemedial,
    ContinueRemedial,
    Close,
}

/// Async orchestrator around [`QuizStateMachine`].
///
/// Owns the machine, the attempt service handle, and the liveness token, and
/// drives the machine's `begin`/`apply` pairs across awaits. Every response is
/// checked against the token before anything is committed; a response that
/// resolves after the surface was torn down is dropped on the floor, machine
/// untouched.
pub struct QuizController {
    machine: QuizStateMachine,
    client: Arc<dyn AttemptClient>,
    liveness: LivenessToken,
    clock: Clock,
    launch: QuizLaunch,
    attempt_id: Option<AttemptId>,
    notice: Option<EngineNotice>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizController {
    #[must_use]
    pub fn new(client: Arc<dyn AttemptClient>, launch: QuizLaunch) -> Self {
        Self {
            machine: QuizStateMachine::new(),
            client,
            liveness: LivenessToken::new(),
            clock: Clock::default(),
            launch,
            attempt_id: match launch {
                QuizLaunch::Fresh(_) => None,
                QuizLaunch::Resume(attempt_id) => Some(attempt_id),
            },
            notice: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Shares the given token instead of minting one; the embedding surface
    /// keeps a clone and closes it on teardown.
    #[must_use]
    pub fn with_liveness(mut self, liveness: LivenessToken) -> Self {
        self.liveness = liveness;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn phase(&self) -> &QuizPhase {
        self.machine.phase()
    }

    #[must_use]
    pub fn machine(&self) -> &QuizStateMachine {
        &self.machine
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        self.machine.progress()
    }

    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        self.machine.stats()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.machine.current_question()
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Attempt> {
        self.machine.feedback()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.machine.is_busy()
    }

    #[must_use]
    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt_id
    }

    #[must_use]
    pub fn liveness(&self) -> &LivenessToken {
        &self.liveness
    }

    #[must_use]
    pub fn notice(&self) -> Option<&EngineNotice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// First fetch of the session. Fresh launches start an attempt; resumes
    /// (and retries after a fresh launch already minted an attempt) fetch the
    /// current question. An attempt with no outstanding question chains
    /// straight into the summary fetch under the same in-flight guard. Any
    /// fetch failure here, the chained summary included, is terminal.
    pub async fn initialize(&mut self) -> Dispatch {
        if !self.machine.begin_initialize() {
            return Dispatch::Ignored;
        }
        let client = Arc::clone(&self.client);
        let (result, action) = match (self.attempt_id, self.launch) {
            (None, QuizLaunch::Fresh(quiz_id)) => match client.start_quiz(quiz_id).await {
                Ok(start) => {
                    if !self.liveness.is_live() {
                        return Dispatch::Closed;
                    }
                    self.attempt_id = Some(start.attempt_id);
                    (
                        Ok((start.question, start.question_index, start.total_questions)),
                        FailedAction::StartQuiz,
                    )
                }
                Err(err) => (Err(err), FailedAction::StartQuiz),
            },
            (Some(attempt_id), _) | (None, QuizLaunch::Resume(attempt_id)) => {
                match client.current_question(attempt_id).await {
                    Ok(current) => {
                        if !self.liveness.is_live() {
                            return Dispatch::Closed;
                        }
                        self.attempt_id = Some(attempt_id);
                        (
                            Ok((
                                current.question,
                                current.question_index,
                                current.total_questions,
                            )),
                            FailedAction::LoadQuestion,
                        )
                    }
                    Err(err) => (Err(err), FailedAction::LoadQuestion),
                }
            }
        };
        match result {
            Ok((Some(question), index, total)) => {
                self.machine.apply_question(question, index, total);
                self.started_at.get_or_insert(self.clock.now());
                Dispatch::Applied
            }
            Ok((None, ..)) => {
                self.started_at.get_or_insert(self.clock.now());
                // attempt_id was just committed above.
                match self.attempt_id {
                    Some(attempt_id) => match self.try_fetch_summary(attempt_id).await {
                        Ok(dispatch) => dispatch,
                        Err(err) => self.fail_terminal(FailedAction::LoadSummary, err),
                    },
                    None => {
                        self.machine.fail_pending();
                        Dispatch::Ignored
                    }
                }
            }
            Err(err) => self.fail_terminal(action, err),
        }
    }

    pub async fn dispatch(&mut self, event: QuizEvent) -> Dispatch {
        if self.machine.is_closed() {
            return Dispatch::Closed;
        }
        match event {
            QuizEvent::SelectOption(option) => {
                if self.machine.select_option(option) {
                    Dispatch::Applied
                } else {
                    Dispatch::Ignored
                }
            }
            QuizEvent::Submit => self.submit().await,
            QuizEvent::Continue => self.advance().await,
            QuizEvent::StartRemediation => {
                if self.machine.start_remediation() {
                    Dispatch::Applied
                } else {
                    Dispatch::Ignored
                }
            }
            QuizEvent::ChooseDifficulty(difficulty) => self.choose_difficulty(difficulty).await,
            QuizEvent::SubmitRemedial => self.submit_remedial().await,
            QuizEvent::ContinueRemedial => self.continue_remedial(),
            QuizEvent::Close => {
                self.machine.close();
                self.liveness.close();
                Dispatch::Applied
            }
        }
    }

    async fn submit(&mut self) -> Dispatch {
        let Some(attempt_id) = self.attempt_id else {
            return Dispatch::Ignored;
        };
        let Some((question_id, option_id)) = self.machine.begin_submit() else {
            return Dispatch::Ignored;
        };
        let client = Arc::clone(&self.client);
        match client.answer_question(attempt_id, question_id, option_id).await {
            Ok(attempt) => {
                if !self.liveness.is_live() {
                    return Dispatch::Closed;
                }
                self.machine.apply_attempt(attempt);
                Dispatch::Applied
            }
            Err(err) => self.fail(FailedAction::SubmitAnswer, err),
        }
    }

    async fn advance(&mut self) -> Dispatch {
        let Some(attempt_id) = self.attempt_id else {
            return Dispatch::Ignored;
        };
        match self.machine.begin_continue() {
            ContinueOutcome::Advanced => Dispatch::Applied,
            ContinueOutcome::Blocked => Dispatch::Ignored,
            ContinueOutcome::FetchSummary => self.fetch_summary(attempt_id).await,
            ContinueOutcome::FetchCurrent => {
                let client = Arc::clone(&self.client);
                match client.current_question(attempt_id).await {
                    Ok(current) => {
                        if !self.liveness.is_live() {
                            return Dispatch::Closed;
                        }
                        match current.question {
                            Some(question) => {
                                self.machine.apply_question(
                                    question,
                                    current.question_index,
                                    current.total_questions,
                                );
                                Dispatch::Applied
                            }
                            // Guard stays armed across the chained fetch.
                            None => self.fetch_summary(attempt_id).await,
                        }
                    }
                    Err(err) => self.fail(FailedAction::LoadQuestion, err),
                }
            }
        }
    }

    async fn choose_difficulty(&mut self, difficulty: Difficulty) -> Dispatch {
        let Some(attempt_id) = self.attempt_id else {
            return Dispatch::Ignored;
        };
        match self.machine.begin_choose_difficulty() {
            ChooseOutcome::Request(question_id) => {
                let client = Arc::clone(&self.client);
                match client
                    .choose_remedial_difficulty(attempt_id, question_id, difficulty)
                    .await
                {
                    Ok(remedial) => {
                        if !self.liveness.is_live() {
                            return Dispatch::Closed;
                        }
                        self.machine.apply_remedial_question(remedial);
                        Dispatch::Applied
                    }
                    Err(err) => self.fail(FailedAction::ChooseDifficulty, err),
                }
            }
            ChooseOutcome::AlreadyExhausted => {
                self.completed_at.get_or_insert(self.clock.now());
                Dispatch::Applied
            }
            ChooseOutcome::Blocked => Dispatch::Ignored,
        }
    }

    async fn submit_remedial(&mut self) -> Dispatch {
        let Some((remedial_id, option_id)) = self.machine.begin_submit_remedial() else {
            return Dispatch::Ignored;
        };
        let client = Arc::clone(&self.client);
        match client.submit_remedial_answer(remedial_id, option_id).await {
            Ok(feedback) => {
                if !self.liveness.is_live() {
                    return Dispatch::Closed;
                }
                self.machine.apply_remedial_feedback(feedback);
                Dispatch::Applied
            }
            Err(err) => self.fail(FailedAction::SubmitRemedial, err),
        }
    }

    fn continue_remedial(&mut self) -> Dispatch {
        match self.machine.continue_remedial() {
            RemedialAdvance::SameConcept | RemedialAdvance::NextConcept => Dispatch::Applied,
            RemedialAdvance::Done => {
                self.completed_at.get_or_insert(self.clock.now());
                Dispatch::Applied
            }
            RemedialAdvance::Blocked => Dispatch::Ignored,
        }
    }

    async fn fetch_summary(&mut self, attempt_id: AttemptId) -> Dispatch {
        match self.try_fetch_summary(attempt_id).await {
            Ok(dispatch) => dispatch,
            Err(err) => self.fail(FailedAction::LoadSummary, err),
        }
    }

    async fn try_fetch_summary(
        &mut self,
        attempt_id: AttemptId,
    ) -> Result<Dispatch, attempt_client::ClientError> {
        let client = Arc::clone(&self.client);
        let summary = client.quiz_summary(attempt_id).await?;
        if !self.liveness.is_live() {
            return Ok(Dispatch::Closed);
        }
        let remediable = summary.has_remedial_plan();
        self.machine.apply_summary(summary);
        if !remediable {
            self.completed_at.get_or_insert(self.clock.now());
        }
        Ok(Dispatch::Applied)
    }

    /// Failure path shared by every call: roll the machine back to its
    /// pre-call phase and surface a dismissible notice. A response for a
    /// dead surface is discarded instead.
    fn fail(&mut self, action: FailedAction, err: attempt_client::ClientError) -> Dispatch {
        if !self.liveness.is_live() {
            return Dispatch::Closed;
        }
        self.machine.fail_pending();
        self.notice = Some(EngineNotice::new(action, err));
        Dispatch::Failed
    }

    /// Failure before the session ever became interactive. Without a first
    /// question or summary there is nothing to render and nothing to roll
    /// back to, so the machine and the surface are both shut down.
    fn fail_terminal(&mut self, action: FailedAction, err: attempt_client::ClientError) -> Dispatch {
        if !self.liveness.is_live() {
            return Dispatch::Closed;
        }
        self.notice = Some(EngineNotice::new(action, err));
        self.machine.close();
        self.liveness.close();
        Dispatch::Closed
    }
}
