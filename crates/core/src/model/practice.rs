use crate::model::{PracticeSessionId, QuizQuestion};

/// Client-side record of an ungraded practice session.
///
/// The question list is append-only: the initial batch comes from session
/// start, and "generate more" pushes exactly one question at the end and moves
/// the index onto it. Nothing ever removes or reorders issued questions.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeSession {
    session_id: PracticeSessionId,
    questions: Vec<QuizQuestion>,
    current: usize,
    quiz_context_used: bool,
}

impl PracticeSession {
    #[must_use]
    pub fn new(
        session_id: PracticeSessionId,
        questions: Vec<QuizQuestion>,
        quiz_context_used: bool,
    ) -> Self {
        Self {
            session_id,
            questions,
            current: 0,
            quiz_context_used,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> PracticeSessionId {
        self.session_id
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Whether server-side generation was seeded from the student's prior quiz
    /// mistakes. Surfaced at session end.
    #[must_use]
    pub fn quiz_context_used(&self) -> bool {
        self.quiz_context_used
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current)
    }

    /// True when the index has moved past the last issued question.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.current >= self.questions.len()
    }

    /// Advances the index by exactly one; never skips.
    pub fn advance(&mut self) {
        if self.current < self.questions.len() {
            self.current += 1;
        }
    }

    /// Appends one generated question and lands the index on it.
    pub fn append_generated(&mut self, question: QuizQuestion) {
        self.questions.push(question);
        self.current = self.questions.len() - 1;
    }
}
