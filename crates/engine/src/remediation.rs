use quiz_core::model::{QuestionId, QuizSummary};

/// One missed concept queued for remediation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationTarget {
    pub question_id: QuestionId,
    pub question_text: String,
}

/// Walks the missed questions of a summary, one concept at a time.
///
/// The wrong-question list is derived once; the summary is immutable, so the
/// memoized list can never go stale. Order is the summary's order: the
/// server's ordering is authoritative and is never re-sorted here. The cursor
/// is monotonic non-decreasing and clamped to the list length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationSequencer {
    targets: Vec<RemediationTarget>,
    cursor: usize,
}

impl RemediationSequencer {
    #[must_use]
    pub fn from_summary(summary: &QuizSummary) -> Self {
        let targets = summary
            .wrong_questions()
            .map(|r| RemediationTarget {
                question_id: r.question_id,
                question_text: r.question_text.clone(),
            })
            .collect();
        Self { targets, cursor: 0 }
    }

    /// The concept currently being remediated, or `None` once exhausted.
    #[must_use]
    pub fn current_target(&self) -> Option<&RemediationTarget> {
        self.targets.get(self.cursor)
    }

    /// Moves the cursor to the next concept. Returns whether more remain.
    pub fn advance(&mut self) -> bool {
        if self.cursor < self.targets.len() {
            self.cursor += 1;
        }
        !self.is_exhausted()
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.targets.len()
    }

    /// Zero-based index of the current concept, clamped to the total.
    #[must_use]
    pub fn concept_index(&self) -> usize {
        self.cursor.min(self.targets.len())
    }

    #[must_use]
    pub fn concept_total(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AttemptId, QuestionResult};

    fn summary(flags: &[bool]) -> QuizSummary {
        let results = flags
            .iter()
            .enumerate()
            .map(|(i, &is_correct)| QuestionResult {
                question_id: QuestionId::new(i as u64 + 1),
                question_text: format!("Q{}", i + 1),
                is_correct,
            })
            .collect();
        let correct = flags.iter().filter(|&&c| c).count();
        let pct = 100.0 * correct as f64 / flags.len() as f64;
        QuizSummary::new(AttemptId::mint(), pct / 100.0, pct, results, correct < flags.len())
            .unwrap()
    }

    #[test]
    fn derives_wrong_questions_in_summary_order() {
        let seq = RemediationSequencer::from_summary(&summary(&[false, true, false]));
        assert_eq!(seq.concept_total(), 2);
        assert_eq!(seq.current_target().unwrap().question_id, QuestionId::new(1));
    }

    #[test]
    fn advance_walks_then_exhausts() {
        let mut seq = RemediationSequencer::from_summary(&summary(&[false, true, false]));
        assert!(!seq.is_exhausted());
        assert!(seq.advance());
        assert_eq!(seq.current_target().unwrap().question_id, QuestionId::new(3));
        assert!(!seq.advance());
        assert!(seq.is_exhausted());
        assert_eq!(seq.current_target(), None);
    }

    #[test]
    fn cursor_clamps_past_the_end() {
        let mut seq = RemediationSequencer::from_summary(&summary(&[false]));
        assert!(!seq.advance());
        assert!(!seq.advance());
        assert_eq!(seq.concept_index(), 1);
        assert_eq!(seq.concept_total(), 1);
    }

    #[test]
    fn all_correct_summary_yields_empty_sequencer() {
        let seq = RemediationSequencer::from_summary(&summary(&[true, true]));
        assert!(seq.is_exhausted());
        assert_eq!(seq.current_target(), None);
        assert_eq!(seq.concept_total(), 0);
    }
}
