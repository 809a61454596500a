//! Cooperative cancellation flag for one playback session.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared stop flag, one per `speak` call.
///
/// `stop()` (or a superseding `speak`) sets it; the sentence loop checks it
/// before each utterance and right after each utterance resolves.  Every
/// session owns a distinct token, so a loop that is still unwinding can
/// never cancel the session that replaced it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.  Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Whether `other` is a clone of this very token.
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
        assert!(token.same_as(&clone));
    }

    #[test]
    fn distinct_tokens_are_independent() {
        let old = CancelToken::new();
        let fresh = CancelToken::new();

        old.cancel();
        assert!(!fresh.is_cancelled());
        assert!(!old.same_as(&fresh));
    }
}
