//! Session engine for graded quizzes, remediation, and ungraded practice.
//!
//! Each flow is split into a synchronous state machine (all transition rules,
//! no I/O) and an async controller that drives it against an
//! [`attempt_client::AttemptClient`]. The machines enforce the invariants
//! (at most one request in flight per session, server-authoritative grading,
//! recomputed progress) while the controllers own the awaits and the
//! liveness checks.

#![forbid(unsafe_code)]

pub mod dispatch;
pub mod error;
pub mod liveness;
pub mod practice;
pub mod quiz;
pub mod remediation;

pub use dispatch::Dispatch;
pub use error::{EngineNotice, FailedAction};
pub use liveness::LivenessToken;
pub use practice::{PracticeController, PracticeEvent, PracticeMachine, PracticePhase};
pub use quiz::{QuizController, QuizEvent, QuizLaunch, QuizPhase, QuizStateMachine};
pub use remediation::{RemediationSequencer, RemediationTarget};
