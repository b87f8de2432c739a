//! Generic consumer of the common event vocabulary.

use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::engine::EventReceiver;
use crate::mvi::CommonUiEvent;
use crate::scope::Scope;
use crate::subscription::Subscription;

/// Host-side handler for [`CommonUiEvent`]s (toasts, back navigation,
/// external flows). One implementation serves every screen.
pub trait CommonEventHandler: Send + Sync + 'static {
    fn handle_common_event(&self, event: CommonUiEvent);
}

impl<F> CommonEventHandler for F
where
    F: Fn(CommonUiEvent) + Send + Sync + 'static,
{
    fn handle_common_event(&self, event: CommonUiEvent) {
        self(event)
    }
}

/// Feed an engine's common events into `handler` on the foreground domain
/// until the returned subscription is cancelled or dropped.
pub fn bind_common_events<H>(
    events: EventReceiver<CommonUiEvent>,
    handler: Arc<H>,
    context: &ExecutionContext,
) -> Subscription
where
    H: CommonEventHandler + ?Sized,
{
    let scope = Scope::new();
    let handle = scope.handle();
    context.spawn_foreground(async move {
        handle
            .run(async move {
                while let Some(event) = events.recv().await {
                    tracing::trace!(event = ?event, "Handling common event");
                    handler.handle_common_event(event);
                }
            })
            .await
    });
    Subscription::new(scope)
}
