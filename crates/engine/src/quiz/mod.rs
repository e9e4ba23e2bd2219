//! Graded quiz flow: the synchronous state machine and the async controller
//! that drives it against the attempt service.

mod controller;
mod machine;

pub use controller::{QuizController, QuizEvent, QuizLaunch};
pub use machine::{ChooseOutcome, ContinueOutcome, QuizPhase, QuizStateMachine, RemedialAdvance};
