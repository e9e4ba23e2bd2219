#![forbid(unsafe_code)]

pub mod completion;
pub mod model;
pub mod stats;
pub mod time;

pub use completion::completion_percent;
pub use stats::SessionStats;
pub use time::Clock;
