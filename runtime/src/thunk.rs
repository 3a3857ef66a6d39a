//! Thunk middleware.
//!
//! Intercepts [`Message::Thunk`] and runs it with a [`ThunkContext`] instead
//! of passing it on. Everything else goes to the next dispatcher untouched.
//! A thunk's `dispatch` enters the chain from the top, so thunks may
//! dispatch further thunks.

use holdfast_core::middleware::layer;
use holdfast_core::{Dispatcher, Layer, Message, Middleware, MiddlewareApi, StoreError, ThunkContext};
use std::any::Any;
use std::rc::Rc;

/// Runs thunks with access to `dispatch`, `get_state` and an optional extra argument.
#[derive(Clone, Default)]
pub struct ThunkMiddleware {
    extra: Option<Rc<dyn Any>>,
}

impl ThunkMiddleware {
    /// Thunk middleware without an extra argument.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Thunk middleware handing `extra` to every thunk, typically an API
    /// client or other injected service.
    #[must_use]
    pub fn with_extra_argument<T: 'static>(extra: T) -> Self {
        Self {
            extra: Some(Rc::new(extra)),
        }
    }
}

impl std::fmt::Debug for ThunkMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThunkMiddleware")
            .field("has_extra", &self.extra.is_some())
            .finish()
    }
}

impl<S: 'static> Middleware<S> for ThunkMiddleware {
    fn wrap(&self, api: MiddlewareApi<S>) -> Result<Layer<S>, StoreError> {
        let extra = self.extra.clone();
        Ok(layer(move |next: Dispatcher<S>| {
            let api = api.clone();
            let extra = extra.clone();
            Dispatcher::new(move |message: Message<S>| match message {
                Message::Thunk(thunk) => thunk.run(ThunkContext::new(api.clone(), extra.clone())),
                other => next.dispatch(other),
            })
        }))
    }
}
