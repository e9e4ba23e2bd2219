use async_trait::async_trait;

use quiz_core::model::{
    Attempt, AttemptId, Difficulty, OptionId, PracticeSessionId, QuestionId, QuizId, QuizQuestion,
    QuizSummary, RemedialId, TopicId,
};

use crate::error::ClientError;

/// Response to starting a fresh quiz attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizStart {
    pub attempt_id: AttemptId,
    /// Absent when the quiz has no outstanding question, i.e. it is already
    /// finished and the caller should fetch the summary instead.
    pub question: Option<QuizQuestion>,
    pub question_index: usize,
    pub total_questions: usize,
}

/// Response to fetching the current question of an existing attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentQuestion {
    /// Absent when every base question has been answered.
    pub question: Option<QuizQuestion>,
    pub question_index: usize,
    pub total_questions: usize,
}

/// A freshly minted remedial sub-session and its first question.
#[derive(Debug, Clone, PartialEq)]
pub struct RemedialQuestion {
    pub remedial_id: RemedialId,
    pub question: QuizQuestion,
}

/// Outcome of answering a remedial question.
#[derive(Debug, Clone, PartialEq)]
pub struct RemedialFeedback {
    pub is_correct: bool,
    pub explanation: Option<String>,
    /// Another question for the same concept, under the same remedial id.
    pub next_question: Option<QuizQuestion>,
    /// True once the server considers this concept remediated.
    pub remedial_completed: bool,
}

/// Response to starting an ungraded practice session.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeStart {
    pub session_id: PracticeSessionId,
    pub questions: Vec<QuizQuestion>,
    /// Whether generation was seeded from the student's prior quiz mistakes.
    pub quiz_context_used: bool,
}

/// Outcome of answering a practice question.
///
/// The running counters are server-owned; the controller copies them into its
/// stats rather than recomputing, since only the server grades authoritatively.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeFeedback {
    pub is_correct: bool,
    pub explanation: Option<String>,
    pub questions_completed: u32,
    pub total_correct: u32,
}

/// One on-demand generated practice question.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuestion {
    pub question: QuizQuestion,
}

/// Remote attempt service, seen by the engine as a black box of typed
/// request/response operations.
///
/// Transport, serialization and timeouts are the implementation's concern.
/// The engine's only contract is that every call eventually resolves to
/// success or failure; it never issues a second call for the same session
/// while one is outstanding.
#[async_trait]
pub trait AttemptClient: Send + Sync {
    /// Start a fresh attempt for a quiz.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the quiz is unknown or the call fails.
    async fn start_quiz(&self, quiz_id: QuizId) -> Result<QuizStart, ClientError>;

    /// Fetch the current unanswered question of an attempt, if any.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the attempt is unknown or the call fails.
    async fn current_question(
        &self,
        attempt_id: AttemptId,
    ) -> Result<CurrentQuestion, ClientError>;

    /// Submit an answer for grading.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the submission is rejected or the call fails.
    async fn answer_question(
        &self,
        attempt_id: AttemptId,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<Attempt, ClientError>;

    /// Fetch the summary of a finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the attempt is unknown, unfinished, or the
    /// call fails.
    async fn quiz_summary(&self, attempt_id: AttemptId) -> Result<QuizSummary, ClientError>;

    /// Start remediation of one missed concept at the chosen difficulty.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the question was not missed in this attempt
    /// or the call fails.
    async fn choose_remedial_difficulty(
        &self,
        attempt_id: AttemptId,
        question_id: QuestionId,
        difficulty: Difficulty,
    ) -> Result<RemedialQuestion, ClientError>;

    /// Submit an answer within a remedial sub-session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the remedial session is unknown or the call
    /// fails.
    async fn submit_remedial_answer(
        &self,
        remedial_id: RemedialId,
        option_id: OptionId,
    ) -> Result<RemedialFeedback, ClientError>;

    /// Start an ungraded practice session for a topic.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the topic has no questions or the call fails.
    async fn start_practice_session(
        &self,
        topic_id: TopicId,
        difficulty: Difficulty,
    ) -> Result<PracticeStart, ClientError>;

    /// Submit a practice answer; grading carries no scoring consequence.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the session is unknown or the call fails.
    async fn answer_practice_question(
        &self,
        session_id: PracticeSessionId,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<PracticeFeedback, ClientError>;

    /// Generate one more practice question for an open session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the session is unknown or the call fails.
    async fn generate_more_practice_question(
        &self,
        session_id: PracticeSessionId,
    ) -> Result<GeneratedQuestion, ClientError>;
}
