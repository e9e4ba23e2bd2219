use thiserror::Error;

use crate::model::{OptionId, QuestionId, QuizQuestion};

/// Validation errors for [`Attempt`].
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("score {0} is outside [0, 1]")]
    ScoreOutOfRange(f64),
}

/// One graded answer submission and its outcome.
///
/// Created exactly once per question per session and never mutated; a retry
/// after a failed submission creates a new `Attempt`, it never edits the old
/// one.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    question_id: QuestionId,
    selected_option_id: OptionId,
    is_correct: bool,
    score: f64,
    explanation: Option<String>,
    xp_awarded: Option<u32>,
    badges: Option<Vec<String>>,
    next_question: Option<QuizQuestion>,
    all_questions_answered: Option<bool>,
}

impl Attempt {
    /// Builds an attempt outcome as reported by the server.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::ScoreOutOfRange` when `score` is not in `[0, 1]`.
    pub fn new(
        question_id: QuestionId,
        selected_option_id: OptionId,
        is_correct: bool,
        score: f64,
    ) -> Result<Self, AttemptError> {
        if !(0.0..=1.0).contains(&score) {
            return Err(AttemptError::ScoreOutOfRange(score));
        }

        Ok(Self {
            question_id,
            selected_option_id,
            is_correct,
            score,
            explanation: None,
            xp_awarded: None,
            badges: None,
            next_question: None,
            all_questions_answered: None,
        })
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    #[must_use]
    pub fn with_xp(mut self, xp: u32) -> Self {
        self.xp_awarded = Some(xp);
        self
    }

    /// Badges are awarded by an external collaborator; the engine only carries
    /// them through to the UI.
    #[must_use]
    pub fn with_badges(mut self, badges: Vec<String>) -> Self {
        self.badges = Some(badges);
        self
    }

    /// Attaches the server-supplied look-ahead question.
    #[must_use]
    pub fn with_next_question(mut self, question: QuizQuestion) -> Self {
        self.next_question = Some(question);
        self
    }

    #[must_use]
    pub fn with_all_questions_answered(mut self, done: bool) -> Self {
        self.all_questions_answered = Some(done);
        self
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn selected_option_id(&self) -> OptionId {
        self.selected_option_id
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn xp_awarded(&self) -> Option<u32> {
        self.xp_awarded
    }

    #[must_use]
    pub fn badges(&self) -> Option<&[String]> {
        self.badges.as_deref()
    }

    #[must_use]
    pub fn next_question(&self) -> Option<&QuizQuestion> {
        self.next_question.as_ref()
    }

    /// Whether the server signalled that every base question has now been
    /// answered. `None` means the server omitted the flag.
    #[must_use]
    pub fn all_questions_answered(&self) -> Option<bool> {
        self.all_questions_answered
    }

    /// Takes the look-ahead question out of the attempt.
    #[must_use]
    pub fn take_next_question(&mut self) -> Option<QuizQuestion> {
        self.next_question.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_score() {
        let err = Attempt::new(QuestionId::new(1), OptionId::new(1), true, 1.5).unwrap_err();
        assert_eq!(err, AttemptError::ScoreOutOfRange(1.5));
        assert!(Attempt::new(QuestionId::new(1), OptionId::new(1), false, -0.1).is_err());
    }

    #[test]
    fn partial_credit_scores_are_allowed() {
        let attempt = Attempt::new(QuestionId::new(1), OptionId::new(2), false, 0.5).unwrap();
        assert!(!attempt.is_correct());
        assert!((attempt.score() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn builder_fields_are_optional() {
        let attempt = Attempt::new(QuestionId::new(7), OptionId::new(1), true, 1.0)
            .unwrap()
            .with_xp(10)
            .with_badges(vec!["streak-3".into()]);
        assert_eq!(attempt.xp_awarded(), Some(10));
        assert_eq!(attempt.badges(), Some(&["streak-3".to_string()][..]));
        assert!(attempt.next_question().is_none());
        assert_eq!(attempt.all_questions_answered(), None);
    }
}
