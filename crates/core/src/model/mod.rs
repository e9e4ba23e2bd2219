mod attempt;
mod ids;
mod practice;
mod question;
mod summary;

pub use attempt::{Attempt, AttemptError};
pub use ids::{
    AttemptId, OptionId, ParseIdError, PracticeSessionId, QuestionId, QuizId, RemedialId, TopicId,
};
pub use practice::PracticeSession;
pub use question::{
    Difficulty, ParseDifficultyError, QuestionError, QuestionOption, QuizQuestion,
};
pub use summary::{QuestionResult, QuizSummary, SummaryError};
