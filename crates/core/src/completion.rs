//! Lesson completion percentage.
//!
//! Combines weighted video/sections/quiz sub-progress into one integer
//! percentage. Both the full and the compact progress displays call this same
//! function, so the two can never drift apart.

/// Weight of the video sub-score. Fixed by product decision.
pub const VIDEO_WEIGHT: f64 = 0.30;
/// Weight of the sections sub-score. Fixed by product decision.
pub const SECTIONS_WEIGHT: f64 = 0.30;
/// Weight of the quiz sub-score. Fixed by product decision.
pub const QUIZ_WEIGHT: f64 = 0.40;

/// Computes a lesson's completion percentage in `0..=100`.
///
/// Sub-scores:
/// - video: `1.0` once fully watched, otherwise `video_progress_pct / 100`
/// - sections: binary, `1.0` only when every section was viewed
/// - quiz: `1.0` once passed, otherwise the last quiz score (`0.0` when the
///   quiz was never taken)
///
/// Deterministic and side-effect-free. Out-of-range inputs are clamped rather
/// than rejected, since they come from external progress trackers.
#[must_use]
pub fn completion_percent(
    video_watched: bool,
    video_progress_pct: f64,
    all_sections_viewed: bool,
    quiz_passed: bool,
    quiz_score: Option<f64>,
) -> u8 {
    let video = if video_watched {
        1.0
    } else {
        (video_progress_pct / 100.0).clamp(0.0, 1.0)
    };
    let sections = if all_sections_viewed { 1.0 } else { 0.0 };
    let quiz = if quiz_passed {
        1.0
    } else {
        quiz_score.unwrap_or(0.0).clamp(0.0, 1.0)
    };

    let weighted = VIDEO_WEIGHT * video + SECTIONS_WEIGHT * sections + QUIZ_WEIGHT * quiz;
    (100.0 * weighted).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_done_is_exactly_100() {
        assert_eq!(completion_percent(true, 0.0, true, true, None), 100);
    }

    #[test]
    fn nothing_done_is_zero() {
        assert_eq!(completion_percent(false, 0.0, false, false, None), 0);
    }

    #[test]
    fn partial_progress_rounds_to_35() {
        // 0.3 * 0.5 + 0.3 * 0.0 + 0.4 * 0.5 = 0.35
        assert_eq!(completion_percent(false, 50.0, false, false, Some(0.5)), 35);
    }

    #[test]
    fn sections_have_no_partial_credit() {
        let with = completion_percent(false, 0.0, true, false, None);
        let without = completion_percent(false, 0.0, false, false, None);
        assert_eq!(with, 30);
        assert_eq!(without, 0);
    }

    #[test]
    fn watched_flag_beats_progress_percentage() {
        assert_eq!(completion_percent(true, 10.0, false, false, None), 30);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        assert_eq!(completion_percent(false, 250.0, false, false, Some(7.0)), 70);
        assert_eq!(completion_percent(false, -5.0, false, false, Some(-1.0)), 0);
    }
}
