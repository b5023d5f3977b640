//! Extension points around the blocking resync.

use zsync_types::Token;

/// Host callbacks bracketing a blocking refetch.
///
/// `hold` runs before the refetch starts (show a spinner, disable input);
/// `free` runs once it has finished, whether or not it succeeded.
pub trait BlockingHooks: Send + Sync {
    /// Called before a stale unit is refetched.
    fn hold(&self, token: &Token) {
        let _ = token;
    }

    /// Called after the refetch, on every path.
    fn free(&self, token: &Token) {
        let _ = token;
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl BlockingHooks for NoopHooks {}

/// Pairs a `hold` with its `free`.
pub(crate) struct HoldGuard<'a> {
    hooks: &'a dyn BlockingHooks,
    token: &'a Token,
}

impl<'a> HoldGuard<'a> {
    pub(crate) fn engage(hooks: &'a dyn BlockingHooks, token: &'a Token) -> Self {
        hooks.hold(token);
        Self { hooks, token }
    }
}

impl Drop for HoldGuard<'_> {
    fn drop(&mut self) {
        self.hooks.free(self.token);
    }
}
