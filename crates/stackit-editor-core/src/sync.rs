//! Feedback-loop guard between external value updates and surface emission.
//!
//! An external replacement opens a [`SuppressionScope`]. Inside it, exactly one
//! change notification (the echo of the replacement) is absorbed. Dropping the
//! scope clears suppression, so it never outlives the call that opened it.

use std::cell::Cell;

#[derive(Debug, Default)]
pub struct SyncGuard {
    suppressing: Cell<bool>,
    echo_pending: Cell<bool>,
    absorbed: Cell<u64>,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin an externally driven replacement.
    pub fn suppress(&self) -> SuppressionScope<'_> {
        self.suppressing.set(true);
        self.echo_pending.set(true);
        SuppressionScope { guard: self }
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppressing.get()
    }

    /// Consume the echo if one is expected. Returns true when the notification
    /// must not reach the sink.
    pub fn absorb(&self) -> bool {
        if self.suppressing.get() && self.echo_pending.get() {
            self.echo_pending.set(false);
            self.absorbed.set(self.absorbed.get() + 1);
            tracing::trace!(target: "stackit::sync", "echo absorbed");
            true
        } else {
            false
        }
    }

    /// Echoes absorbed over the guard's lifetime.
    pub fn absorbed_count(&self) -> u64 {
        self.absorbed.get()
    }
}

/// Active suppression; cleared on drop.
#[must_use = "suppression ends as soon as the scope is dropped"]
#[derive(Debug)]
pub struct SuppressionScope<'a> {
    guard: &'a SyncGuard,
}

impl Drop for SuppressionScope<'_> {
    fn drop(&mut self) {
        self.guard.suppressing.set(false);
        self.guard.echo_pending.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorbs_exactly_one_echo() {
        let guard = SyncGuard::new();
        {
            let _scope = guard.suppress();
            assert!(guard.is_suppressing());
            assert!(guard.absorb());
            assert!(!guard.absorb());
        }
        assert!(!guard.is_suppressing());
        assert!(!guard.absorb());
        assert_eq!(guard.absorbed_count(), 1);
    }

    #[test]
    fn test_back_to_back_scopes() {
        let guard = SyncGuard::new();
        for _ in 0..3 {
            let _scope = guard.suppress();
            assert!(guard.absorb());
        }
        assert_eq!(guard.absorbed_count(), 3);
        assert!(!guard.absorb());
    }

    #[test]
    fn test_unused_scope_clears() {
        let guard = SyncGuard::new();
        drop(guard.suppress());
        assert!(!guard.absorb());
        assert_eq!(guard.absorbed_count(), 0);
    }
}
