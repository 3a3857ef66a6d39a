//! Promise middleware.
//!
//! - [`Message::Future`] becomes a task that awaits the future and
//!   dispatches the resulting action.
//! - A flux-standard [`Message::Pending`] becomes a task that awaits the
//!   payload and dispatches the action with it. A rejected payload is
//!   dispatched with `error: true`, and the task then fails with
//!   [`StoreError::Rejected`].
//! - Anything else, including non-flux-standard pending actions, goes to the
//!   next dispatcher.
//!
//! Tasks are returned as [`Dispatched::Task`] and do nothing until awaited.
//! Their dispatches enter the chain from the top.

use futures::FutureExt;
use holdfast_core::middleware::layer;
use holdfast_core::{
    Action, DispatchResult, Dispatched, Dispatcher, Layer, Message, Middleware, MiddlewareApi,
    PendingAction, StoreError,
};

/// Resolves futures and pending payloads before they reach the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromiseMiddleware;

impl PromiseMiddleware {
    /// Create the middleware.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn settle_pending<S: 'static>(api: MiddlewareApi<S>, pending: PendingAction) -> Dispatched {
    let (action, payload) = pending.into_parts();
    Dispatched::Task(
        async move {
            match payload.await {
                Ok(value) => api.dispatch(action.with_payload(value)),
                Err(reason) => {
                    let action_type = action.kind().to_string();
                    api.dispatch(action.with_payload(reason.clone()).with_error(true))?;
                    Err(StoreError::Rejected {
                        action_type,
                        reason,
                    })
                },
            }
        }
        .boxed_local(),
    )
}

fn handle<S: 'static>(api: &MiddlewareApi<S>, next: &Dispatcher<S>, message: Message<S>) -> DispatchResult {
    match message {
        Message::Future(future) => {
            let api = api.clone();
            Ok(Dispatched::Task(
                async move {
                    let action: Action = future.await;
                    api.dispatch(action)
                }
                .boxed_local(),
            ))
        },
        Message::Pending(pending) if pending.action().is_flux_standard() => {
            Ok(settle_pending(api.clone(), pending))
        },
        other => next.dispatch(other),
    }
}

impl<S: 'static> Middleware<S> for PromiseMiddleware {
    fn wrap(&self, api: MiddlewareApi<S>) -> Result<Layer<S>, StoreError> {
        Ok(layer(move |next: Dispatcher<S>| {
            let api = api.clone();
            Dispatcher::new(move |message: Message<S>| handle(&api, &next, message))
        }))
    }
}
