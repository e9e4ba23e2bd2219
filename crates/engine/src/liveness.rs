use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared mount flag between a controller and the surface embedding it.
///
/// The embedding UI closes the token when the quiz or practice surface is torn
/// down; controllers check it after every network call and discard responses
/// that resolve for an abandoned session. Controllers also close it themselves
/// to signal the UI to exit (terminal initialization failure, explicit end).
#[derive(Clone, Debug)]
pub struct LivenessToken(Arc<AtomicBool>);

impl LivenessToken {
    /// A live token.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Closing is one-way; there is no reopen.
    pub fn close(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for LivenessToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = LivenessToken::new();
        let clone = token.clone();
        assert!(clone.is_live());
        token.close();
        assert!(!clone.is_live());
    }
}
