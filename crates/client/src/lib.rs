#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod http;
pub mod memory;

pub use client::{
    AttemptClient, CurrentQuestion, GeneratedQuestion, PracticeFeedback, PracticeStart,
    QuizStart, RemedialFeedback, RemedialQuestion,
};
pub use error::ClientError;
pub use http::{AttemptApiConfig, HttpAttemptClient};
pub use memory::InMemoryAttemptClient;
