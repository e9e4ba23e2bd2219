//! End-to-end ungraded practice flows against the in-memory attempt service.

use std::sync::Arc;

use async_trait::async_trait;

use attempt_client::{
    AttemptClient, ClientError, CurrentQuestion, GeneratedQuestion, InMemoryAttemptClient,
    PracticeFeedback, PracticeStart, QuizStart, RemedialFeedback, RemedialQuestion,
};
use quiz_core::model::{
    Attempt, AttemptId, Difficulty, OptionId, PracticeSessionId, QuestionId, QuestionOption,
    QuizId, QuizQuestion, QuizSummary, RemedialId, TopicId,
};
use quiz_engine::{
    Dispatch, FailedAction, LivenessToken, PracticeController, PracticeEvent, PracticePhase,
};

fn topic() -> TopicId {
    TopicId::new(9)
}

fn question(id: u64, correct: u64, difficulty: Difficulty) -> QuizQuestion {
    QuizQuestion::new(
        QuestionId::new(id),
        format!("Q{id}"),
        vec![
            QuestionOption::new(OptionId::new(1), "a").with_correct(correct == 1),
            QuestionOption::new(OptionId::new(2), "b").with_correct(correct == 2),
        ],
        difficulty,
    )
    .unwrap()
}

fn seeded() -> InMemoryAttemptClient {
    let client = InMemoryAttemptClient::new();
    client
        .seed_topic(
            topic(),
            vec![
                question(1, 1, Difficulty::Easy),
                question(2, 2, Difficulty::Easy),
                question(3, 1, Difficulty::Hard),
            ],
        )
        .unwrap();
    client
}

fn controller(client: InMemoryAttemptClient) -> PracticeController {
    PracticeController::new(Arc::new(client), topic())
}

/// Pass-through wrapper that closes a liveness token while a practice answer
/// is in flight.
struct ClosingClient {
    inner: InMemoryAttemptClient,
    token: LivenessToken,
}

#[async_trait]
impl AttemptClient for ClosingClient {
    async fn start_quiz(&self, quiz_id: QuizId) -> Result<QuizStart, ClientError> {
        self.inner.start_quiz(quiz_id).await
    }

    async fn current_question(
        &self,
        attempt_id: AttemptId,
    ) -> Result<CurrentQuestion, ClientError> {
        self.inner.current_question(attempt_id).await
    }

    async fn answer_question(
        &self,
        attempt_id: AttemptId,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<Attempt, ClientError> {
        self.inner.answer_question(attempt_id, question_id, option_id).await
    }

    async fn quiz_summary(&self, attempt_id: AttemptId) -> Result<QuizSummary, ClientError> {
        self.inner.quiz_summary(attempt_id).await
    }

    async fn choose_remedial_difficulty(
        &self,
        attempt_id: AttemptId,
        question_id: QuestionId,
        difficulty: Difficulty,
    ) -> Result<RemedialQuestion, ClientError> {
        self.inner
            .choose_remedial_difficulty(attempt_id, question_id, difficulty)
            .await
    }

    async fn submit_remedial_answer(
        &self,
        remedial_id: RemedialId,
        option_id: OptionId,
    ) -> Result<RemedialFeedback, ClientError> {
        self.inner.submit_remedial_answer(remedial_id, option_id).await
    }

    async fn start_practice_session(
        &self,
        topic_id: TopicId,
        difficulty: Difficulty,
    ) -> Result<PracticeStart, ClientError> {
        self.inner.start_practice_session(topic_id, difficulty).await
    }

    async fn answer_practice_question(
        &self,
        session_id: PracticeSessionId,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<PracticeFeedback, ClientError> {
        let result = self
            .inner
            .answer_practice_question(session_id, question_id, option_id)
            .await;
        self.token.close();
        result
    }

    async fn generate_more_practice_question(
        &self,
        session_id: PracticeSessionId,
    ) -> Result<GeneratedQuestion, ClientError> {
        self.inner.generate_more_practice_question(session_id).await
    }
}

#[tokio::test]
async fn practice_session_runs_to_completion_and_generates_more() {
    let mut controller = controller(seeded());
    assert!(matches!(controller.phase(), PracticePhase::DifficultySelect));

    assert_eq!(
        controller.dispatch(PracticeEvent::Start(Difficulty::Easy)).await,
        Dispatch::Applied
    );
    // Difficulty filter applies: only the two easy questions are issued.
    assert_eq!(controller.machine().session().unwrap().questions().len(), 2);
    let first = controller.machine().current_question().unwrap().clone();
    assert!(first.options().iter().all(|o| o.is_correct.is_none()));

    // One right, one wrong; counters mirror the server.
    controller.dispatch(PracticeEvent::SelectOption(OptionId::new(1))).await;
    assert_eq!(controller.dispatch(PracticeEvent::Submit).await, Dispatch::Applied);
    assert_eq!(controller.machine().stats().questions_completed(), 1);
    assert_eq!(controller.dispatch(PracticeEvent::Next).await, Dispatch::Applied);

    controller.dispatch(PracticeEvent::SelectOption(OptionId::new(1))).await;
    assert_eq!(controller.dispatch(PracticeEvent::Submit).await, Dispatch::Applied);
    assert!(!controller.machine().feedback().unwrap().is_correct);
    assert_eq!(controller.machine().stats().total_correct(), 1);
    assert_eq!(controller.dispatch(PracticeEvent::Next).await, Dispatch::Applied);
    assert!(matches!(controller.phase(), PracticePhase::SessionComplete));

    // Generate one more; it lands as the current question.
    assert_eq!(
        controller.dispatch(PracticeEvent::GenerateMore).await,
        Dispatch::Applied
    );
    let generated = controller.machine().current_question().unwrap().clone();
    assert!(generated.parent_question_id().is_some());
    assert_eq!(controller.machine().session().unwrap().questions().len(), 3);

    controller.dispatch(PracticeEvent::SelectOption(OptionId::new(1))).await;
    controller.dispatch(PracticeEvent::Submit).await;
    controller.dispatch(PracticeEvent::Next).await;
    assert!(matches!(controller.phase(), PracticePhase::SessionComplete));

    assert_eq!(controller.dispatch(PracticeEvent::End).await, Dispatch::Applied);
    assert!(controller.machine().is_ended());
    // Final stats stay readable after the session ends.
    assert_eq!(controller.machine().stats().questions_completed(), 3);
    assert!(controller.ended_at().is_some());
}

#[tokio::test]
async fn failed_start_returns_to_the_difficulty_picker() {
    let client = seeded();
    let mut controller = controller(client.clone());

    client.fail_next().unwrap();
    assert_eq!(
        controller.dispatch(PracticeEvent::Start(Difficulty::Easy)).await,
        Dispatch::Failed
    );
    assert_eq!(controller.notice().unwrap().action(), FailedAction::StartPractice);
    assert!(matches!(controller.phase(), PracticePhase::DifficultySelect));

    // The pick can simply be made again.
    assert_eq!(
        controller.dispatch(PracticeEvent::Start(Difficulty::Easy)).await,
        Dispatch::Applied
    );
    assert!(matches!(controller.phase(), PracticePhase::Question { .. }));
}

#[tokio::test]
async fn failed_generate_returns_to_session_complete() {
    let client = InMemoryAttemptClient::new();
    client
        .seed_topic(topic(), vec![question(1, 1, Difficulty::Easy)])
        .unwrap();
    let mut controller = controller(client.clone());
    controller.dispatch(PracticeEvent::Start(Difficulty::Easy)).await;
    controller.dispatch(PracticeEvent::SelectOption(OptionId::new(1))).await;
    controller.dispatch(PracticeEvent::Submit).await;
    controller.dispatch(PracticeEvent::Next).await;
    assert!(matches!(controller.phase(), PracticePhase::SessionComplete));

    client.fail_next().unwrap();
    assert_eq!(
        controller.dispatch(PracticeEvent::GenerateMore).await,
        Dispatch::Failed
    );
    assert_eq!(
        controller.notice().unwrap().action(),
        FailedAction::GenerateQuestion
    );
    assert!(matches!(controller.phase(), PracticePhase::SessionComplete));

    assert_eq!(
        controller.dispatch(PracticeEvent::GenerateMore).await,
        Dispatch::Applied
    );
}

#[tokio::test]
async fn response_after_teardown_commits_nothing() {
    let token = LivenessToken::new();
    let inner = seeded();
    let closing = Arc::new(ClosingClient {
        inner,
        token: token.clone(),
    });
    let mut controller = PracticeController::new(
        Arc::clone(&closing) as Arc<dyn AttemptClient>,
        topic(),
    )
    .with_liveness(token);
    controller.dispatch(PracticeEvent::Start(Difficulty::Easy)).await;
    controller.dispatch(PracticeEvent::SelectOption(OptionId::new(1))).await;

    assert_eq!(controller.dispatch(PracticeEvent::Submit).await, Dispatch::Closed);
    match controller.phase() {
        PracticePhase::Question { selected } => assert_eq!(*selected, Some(OptionId::new(1))),
        other => panic!("expected question, got {other:?}"),
    }
    assert_eq!(controller.machine().stats().questions_completed(), 0);
    assert!(controller.notice().is_none());
}

#[tokio::test]
async fn quiz_context_flag_surfaces_after_quiz_mistakes() {
    let client = seeded();
    client
        .seed_quiz(QuizId::new(1), vec![question(50, 1, Difficulty::Standard)])
        .unwrap();
    let start = client.start_quiz(QuizId::new(1)).await.unwrap();
    client
        .answer_question(start.attempt_id, QuestionId::new(50), OptionId::new(2))
        .await
        .unwrap();

    let mut controller = controller(client);
    controller.dispatch(PracticeEvent::Start(Difficulty::Easy)).await;
    assert!(controller.machine().quiz_context_used());
}

#[tokio::test]
async fn ended_session_ignores_further_events() {
    let mut controller = controller(seeded());
    controller.dispatch(PracticeEvent::Start(Difficulty::Easy)).await;
    controller.dispatch(PracticeEvent::End).await;

    assert_eq!(
        controller.dispatch(PracticeEvent::Start(Difficulty::Easy)).await,
        Dispatch::Closed
    );
    assert_eq!(
        controller.dispatch(PracticeEvent::SelectOption(OptionId::new(1))).await,
        Dispatch::Closed
    );
}
