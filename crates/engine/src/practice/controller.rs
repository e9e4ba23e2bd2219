use std::sync::Arc;

use attempt_client::AttemptClient;
use chrono::{DateTime, Utc};
use quiz_core::model::{Difficulty, OptionId, QuizQuestion, TopicId};
use quiz_core::{Clock, SessionStats};

use crate::dispatch::Dispatch;
use crate::error::{EngineNotice, FailedAction};
use crate::liveness::LivenessToken;
use crate::practice::machine::{PracticeMachine, PracticePhase};

/// Events the practice surface may dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeEvent {
    Start(Difficulty),
    SelectOption(OptionId),
    Submit,
    Next,
    GenerateMore,
    End,
}

/// Async orchestrator around [`PracticeMachine`], bound to one topic.
///
/// Same commit discipline as the quiz controller: every response is checked
/// against the liveness token before it touches the machine.
pub struct PracticeController {
    machine: PracticeMachine,
    client: Arc<dyn AttemptClient>,
    liveness: LivenessToken,
    clock: Clock,
    topic_id: TopicId,
    notice: Option<EngineNotice>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl PracticeController {
    #[must_use]
    pub fn new(client: Arc<dyn AttemptClient>, topic_id: TopicId) -> Self {
        Self {
            machine: PracticeMachine::new(),
            client,
            liveness: LivenessToken::new(),
            clock: Clock::default(),
            topic_id,
            notice: None,
            started_at: None,
            ended_at: None,
        }
    }

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
    pub fn phase(&self) -> &PracticePhase {
        self.machine.phase()
    }

    #[must_use]
    pub fn machine(&self) -> &PracticeMachine {
        &self.machine
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.machine.is_busy()
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
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub async fn dispatch(&mut self, event: PracticeEvent) -> Dispatch {
        if self.machine.is_ended() {
            return Dispatch::Closed;
        }
        match event {
            PracticeEvent::Start(difficulty) => self.start(difficulty).await,
            PracticeEvent::SelectOption(option) => {
                if self.machine.select_option(option) {
                    Dispatch::Applied
                } else {
                    Dispatch::Ignored
                }
            }
            PracticeEvent::Submit => self.submit().await,
            PracticeEvent::Next => {
                if self.machine.next() {
                    Dispatch::Applied
                } else {
                    Dispatch::Ignored
                }
            }
            PracticeEvent::GenerateMore => self.generate_more().await,
            PracticeEvent::End => {
                self.ended_at.get_or_insert(self.clock.now());
                self.machine.end();
                self.liveness.close();
                Dispatch::Applied
            }
        }
    }

    /// A failed start rolls back to the difficulty picker, so the pick can
    /// simply be made again.
    async fn start(&mut self, difficulty: Difficulty) -> Dispatch {
        if !self.machine.begin_start() {
            return Dispatch::Ignored;
        }
        let client = Arc::clone(&self.client);
        match client.start_practice_session(self.topic_id, difficulty).await {
            Ok(start) => {
                if !self.liveness.is_live() {
                    return Dispatch::Closed;
                }
                self.machine.apply_started(start);
                self.started_at.get_or_insert(self.clock.now());
                Dispatch::Applied
            }
            Err(err) => self.fail(FailedAction::StartPractice, err),
        }
    }

    async fn submit(&mut self) -> Dispatch {
        let Some((session_id, question_id, option_id)) = self.machine.begin_submit() else {
            return Dispatch::Ignored;
        };
        let client = Arc::clone(&self.client);
        match client
            .answer_practice_question(session_id, question_id, option_id)
            .await
        {
            Ok(feedback) => {
                if !self.liveness.is_live() {
                    return Dispatch::Closed;
                }
                self.machine.apply_feedback(feedback);
                Dispatch::Applied
            }
            Err(err) => self.fail(FailedAction::SubmitPractice, err),
        }
    }

    async fn generate_more(&mut self) -> Dispatch {
        let Some(session_id) = self.machine.begin_generate() else {
            return Dispatch::Ignored;
        };
        let client = Arc::clone(&self.client);
        match client.generate_more_practice_question(session_id).await {
            Ok(generated) => {
                if !self.liveness.is_live() {
                    return Dispatch::Closed;
                }
                self.machine.apply_generated(generated);
                Dispatch::Applied
            }
            Err(err) => self.fail(FailedAction::GenerateQuestion, err),
        }
    }

    fn fail(&mut self, action: FailedAction, err: attempt_client::ClientError) -> Dispatch {
        if !self.liveness.is_live() {
            return Dispatch::Closed;
        }
        self.machine.fail_pending();
        self.notice = Some(EngineNotice::new(action, err));
        Dispatch::Failed
    }
}
