//! Ungraded practice flow: difficulty pick, batch of questions, on-demand
//! generation of more.

mod controller;
mod machine;

pub use controller::{PracticeController, PracticeEvent};
pub use machine::{PracticeMachine, PracticePhase};
