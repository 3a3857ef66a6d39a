//! Logging middleware.
//!
//! Every message passing through the chain is logged at `debug` inside a
//! `dispatch` span, followed by the state the store reached or the error the
//! rest of the chain returned. Install it last so it only sees messages that
//! will actually reach the store.

use holdfast_core::middleware::layer;
use holdfast_core::{DispatchResult, Dispatcher, Layer, Message, Middleware, MiddlewareApi, StoreError};
use std::fmt::Debug;
use tracing::Level;

/// Logs dispatched messages and the resulting state through `tracing`.
#[derive(Debug, Clone)]
pub struct LoggerMiddleware {
    label: String,
    log_state: bool,
}

impl Default for LoggerMiddleware {
    fn default() -> Self {
        Self::new("store")
    }
}

impl LoggerMiddleware {
    /// Logger whose span carries `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            log_state: true,
        }
    }

    /// Whether the next state is logged after each dispatch. Useful to turn
    /// off for large states.
    #[must_use]
    pub const fn with_state(mut self, log_state: bool) -> Self {
        self.log_state = log_state;
        self
    }
}

fn log_dispatch<S: Debug + Clone + 'static>(
    label: &str,
    log_state: bool,
    api: &MiddlewareApi<S>,
    next: &Dispatcher<S>,
    message: Message<S>,
) -> DispatchResult {
    let span = tracing::span!(Level::DEBUG, "dispatch", store = %label);
    let _entered = span.enter();

    tracing::debug!(input = ?message, "dispatching");
    let result = next.dispatch(message);
    match &result {
        Ok(dispatched) if dispatched.is_task() => tracing::debug!("dispatch deferred"),
        Ok(_) if log_state => match api.get_state() {
            Ok(state) => tracing::debug!(next_state = ?state, "dispatched"),
            Err(error) => tracing::debug!(%error, "dispatched, state unavailable"),
        },
        Ok(_) => tracing::debug!("dispatched"),
        Err(error) => tracing::warn!(%error, code = error.code(), "dispatch failed"),
    }
    result
}

impl<S: Debug + Clone + 'static> Middleware<S> for LoggerMiddleware {
    fn wrap(&self, api: MiddlewareApi<S>) -> Result<Layer<S>, StoreError> {
        let label = self.label.clone();
        let log_state = self.log_state;
        Ok(layer(move |next: Dispatcher<S>| {
            let api = api.clone();
            let label = label.clone();
            Dispatcher::new(move |message: Message<S>| {
                log_dispatch(&label, log_state, &api, &next, message)
            })
        }))
    }
}
