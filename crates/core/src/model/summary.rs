use thiserror::Error;

use crate::model::{AttemptId, QuestionId};

/// Validation errors for [`QuizSummary`].
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SummaryError {
    #[error("percentage {0} is outside [0, 100]")]
    PercentageOutOfRange(f64),

    #[error("remedial plan flagged but every result is correct")]
    SpuriousRemedialPlan,
}

/// Per-question outcome inside a summary, in quiz order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResult {
    pub question_id: QuestionId,
    pub question_text: String,
    pub is_correct: bool,
}

/// Aggregate result of a finished base quiz.
///
/// Computed once by the server after the last question is answered and
/// read-only thereafter. The order of `results` is authoritative: remediation
/// walks wrong answers in exactly this order, never re-sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSummary {
    attempt_id: AttemptId,
    score: f64,
    percentage: f64,
    results: Vec<QuestionResult>,
    remedial_plan: bool,
}

impl QuizSummary {
    /// Builds a summary from server-reported values.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::PercentageOutOfRange` when `percentage` is not
    /// in `[0, 100]`, and `SummaryError::SpuriousRemedialPlan` when the server
    /// flags remediation without any wrong result to remediate.
    pub fn new(
        attempt_id: AttemptId,
        score: f64,
        percentage: f64,
        results: Vec<QuestionResult>,
        remedial_plan: bool,
    ) -> Result<Self, SummaryError> {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(SummaryError::PercentageOutOfRange(percentage));
        }
        if remedial_plan && results.iter().all(|r| r.is_correct) {
            return Err(SummaryError::SpuriousRemedialPlan);
        }

        Ok(Self {
            attempt_id,
            score,
            percentage,
            results,
            remedial_plan,
        })
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    #[must_use]
    pub fn results(&self) -> &[QuestionResult] {
        &self.results
    }

    /// True when at least one wrong answer exists and the server offered a
    /// remediation plan for it.
    #[must_use]
    pub fn has_remedial_plan(&self) -> bool {
        self.remedial_plan
    }

    /// Wrong answers in summary order.
    pub fn wrong_questions(&self) -> impl Iterator<Item = &QuestionResult> {
        self.results.iter().filter(|r| !r.is_correct)
    }
}
