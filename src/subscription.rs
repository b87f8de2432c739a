//! Listener tasks scoped to the subscriber's own lifetime.

use crate::scope::Scope;

/// Handle to a spawned listener. Cancels the listener on [`cancel`] or drop.
///
/// [`cancel`]: Subscription::cancel
#[must_use = "dropping a Subscription cancels the listener"]
pub struct Subscription {
    scope: Scope,
}

impl Subscription {
    pub(crate) fn new(scope: Scope) -> Self {
        Self { scope }
    }

    pub fn cancel(&self) {
        self.scope.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.scope.is_cancelled()
    }
}
