use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{OptionId, QuestionId};

/// Difficulty tiers a student can pick for remedial and practice questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Standard,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Standard => "standard",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for parsing a difficulty from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDifficultyError;

impl fmt::Display for ParseDifficultyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("difficulty must be one of: easy, standard, hard")
    }
}

impl std::error::Error for ParseDifficultyError {}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "standard" => Ok(Difficulty::Standard),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError),
        }
    }
}

/// One answer option in its canonical shape.
///
/// Wire responses deliver options either as plain strings or as full objects;
/// the client boundary normalizes both into this record, so nothing past the
/// boundary branches on shape. `is_correct` is `None` when the server withholds
/// correctness (graded questions before submission).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: OptionId,
    pub text: String,
    pub is_correct: Option<bool>,
}

impl QuestionOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            is_correct: None,
        }
    }

    #[must_use]
    pub fn with_correct(mut self, is_correct: bool) -> Self {
        self.is_correct = Some(is_correct);
        self
    }
}

/// Validation errors for [`QuizQuestion`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question body is empty")]
    EmptyBody,

    #[error("question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("at most one option may be marked correct, got {0}")]
    MultipleCorrectOptions(usize),
}

/// A single quiz question as issued to the client. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    id: QuestionId,
    body: String,
    options: Vec<QuestionOption>,
    difficulty: Difficulty,
    parent_question_id: Option<QuestionId>,
    explanation: Option<String>,
    citation: Option<String>,
}

impl QuizQuestion {
    /// Builds a question, validating body and option invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyBody` for a blank body,
    /// `QuestionError::TooFewOptions` for fewer than two options, and
    /// `QuestionError::MultipleCorrectOptions` when more than one option is
    /// marked correct.
    pub fn new(
        id: QuestionId,
        body: impl Into<String>,
        options: Vec<QuestionOption>,
        difficulty: Difficulty,
    ) -> Result<Self, QuestionError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(QuestionError::EmptyBody);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }
        let correct = options
            .iter()
            .filter(|o| o.is_correct == Some(true))
            .count();
        if correct > 1 {
            return Err(QuestionError::MultipleCorrectOptions(correct));
        }

        Ok(Self {
            id,
            body,
            options,
            difficulty,
            parent_question_id: None,
            explanation: None,
            citation: None,
        })
    }

    /// Marks this question as a variant of another question.
    #[must_use]
    pub fn with_parent(mut self, parent: QuestionId) -> Self {
        self.parent_question_id = Some(parent);
        self
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    #[must_use]
    pub fn with_citation(mut self, citation: impl Into<String>) -> Self {
        self.citation = Some(citation.into());
        self
    }

    /// Copy of this question with per-option correctness stripped, as handed
    /// to graded flows before submission.
    #[must_use]
    pub fn with_correctness_withheld(&self) -> Self {
        let mut copy = self.clone();
        for option in &mut copy.options {
            option.is_correct = None;
        }
        copy
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn parent_question_id(&self) -> Option<QuestionId> {
        self.parent_question_id
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn citation(&self) -> Option<&str> {
        self.citation.as_deref()
    }

    /// The id of the option marked correct, when correctness is not withheld.
    #[must_use]
    pub fn correct_option_id(&self) -> Option<OptionId> {
        self.options
            .iter()
            .find(|o| o.is_correct == Some(true))
            .map(|o| o.id)
    }

    /// Returns true when `option_id` names one of this question's options.
    #[must_use]
    pub fn has_option(&self, option_id: OptionId) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }
}
