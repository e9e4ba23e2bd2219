/// Running counters for one graded or practice session.
///
/// Both counters are monotonic: answers are recorded, never removed, and
/// correctness comes from the server's grading, never recomputed client-side.
/// `total_correct <= questions_completed` holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    questions_completed: u32,
    total_correct: u32,
}

impl SessionStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one answered question.
    pub fn record_answer(&mut self, is_correct: bool) {
        self.questions_completed = self.questions_completed.saturating_add(1);
        if is_correct {
            self.total_correct = self.total_correct.saturating_add(1);
        }
    }

    /// Resets both counters to zero. Called at session start, never lazily.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Mirrors server-reported counters, clamping so the invariant holds even
    /// against a misbehaving server. Used where grading is server-owned.
    pub fn set_from_server(&mut self, questions_completed: u32, total_correct: u32) {
        self.questions_completed = questions_completed;
        self.total_correct = total_correct.min(questions_completed);
    }

    #[must_use]
    pub fn questions_completed(&self) -> u32 {
        self.questions_completed
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.total_correct
    }

    /// Accuracy as a rounded percentage; 0 before any answer is recorded.
    #[must_use]
    pub fn accuracy_percent(&self) -> u8 {
        if self.questions_completed == 0 {
            return 0;
        }
        let pct =
            (100.0 * f64::from(self.total_correct) / f64::from(self.questions_completed)).round();
        // 0 <= correct <= completed, so pct is already within [0, 100].
        pct as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_report_zero_accuracy() {
        let stats = SessionStats::new();
        assert_eq!(stats.accuracy_percent(), 0);
        assert_eq!(stats.questions_completed(), 0);
    }

    #[test]
    fn accuracy_rounds() {
        let mut stats = SessionStats::new();
        stats.record_answer(true);
        stats.record_answer(true);
        stats.record_answer(false);
        // 2/3 -> 66.66... -> 67
        assert_eq!(stats.accuracy_percent(), 67);
    }

    #[test]
    fn correct_never_exceeds_completed() {
        let mut stats = SessionStats::new();
        let answers = [true, false, true, true, false, true, false, false, true];
        for (i, &correct) in answers.iter().enumerate() {
            stats.record_answer(correct);
            assert!(stats.total_correct() <= stats.questions_completed());
            assert_eq!(stats.questions_completed() as usize, i + 1);
            assert!(stats.accuracy_percent() <= 100);
        }
    }

    #[test]
    fn reset_zeroes_counters() {
        let mut stats = SessionStats::new();
        stats.record_answer(true);
        stats.reset();
        assert_eq!(stats, SessionStats::new());
    }
}
