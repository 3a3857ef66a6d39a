//! The middleware contract.
//!
//! A middleware receives the store's capabilities ([`MiddlewareApi`]) once,
//! when the chain is built, and returns a [`Layer`]: a function from the next
//! dispatcher in the chain to a new dispatcher. Layers are composed right to
//! left, so the first middleware sees every dispatch first and its result last.

use crate::compose::Unary;
use crate::dispatch::{DispatchResult, Dispatcher, Message};
use crate::error::StoreError;
use std::rc::Rc;

/// Wraps the next dispatcher into a new one.
pub type Layer<S> = Unary<Dispatcher<S>>;

/// Capabilities handed to a middleware.
pub struct MiddlewareApi<S> {
    get_state: Rc<dyn Fn() -> Result<S, StoreError>>,
    dispatch: Dispatcher<S>,
}

impl<S> Clone for MiddlewareApi<S> {
    fn clone(&self) -> Self {
        Self {
            get_state: Rc::clone(&self.get_state),
            dispatch: self.dispatch.clone(),
        }
    }
}

impl<S: 'static> MiddlewareApi<S> {
    /// Bundle a state reader with a dispatcher.
    pub fn new<G>(get_state: G, dispatch: Dispatcher<S>) -> Self
    where
        G: Fn() -> Result<S, StoreError> + 'static,
    {
        Self {
            get_state: Rc::new(get_state),
            dispatch,
        }
    }

    /// Read the current state.
    ///
    /// # Errors
    ///
    /// [`StoreError::ReentrantRead`] while the reducer is executing, or
    /// [`StoreError::StoreDropped`] once the store is gone.
    pub fn get_state(&self) -> Result<S, StoreError> {
        (self.get_state)()
    }

    /// Dispatch through the whole chain, starting at the first middleware.
    ///
    /// # Errors
    ///
    /// [`StoreError::PrematureDispatch`] while the chain is still being
    /// built, otherwise whatever the chain returns.
    pub fn dispatch(&self, message: impl Into<Message<S>>) -> DispatchResult {
        self.dispatch.dispatch(message)
    }

    /// The late-bound dispatcher itself.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatch
    }
}

/// A dispatch-wrapping layer with access to `get_state` and `dispatch`.
pub trait Middleware<S> {
    /// Build this middleware's layer.
    ///
    /// # Errors
    ///
    /// An error aborts construction of the enhanced store.
    fn wrap(&self, api: MiddlewareApi<S>) -> Result<Layer<S>, StoreError>;
}

impl<S, F> Middleware<S> for F
where
    F: Fn(MiddlewareApi<S>) -> Result<Layer<S>, StoreError>,
{
    fn wrap(&self, api: MiddlewareApi<S>) -> Result<Layer<S>, StoreError> {
        self(api)
    }
}

/// Box a middleware so differently typed middleware fit in one list.
pub fn boxed<S, M>(middleware: M) -> Box<dyn Middleware<S>>
where
    M: Middleware<S> + 'static,
{
    Box::new(middleware)
}

/// Box a layer closure.
pub fn layer<S, F>(f: F) -> Layer<S>
where
    F: Fn(Dispatcher<S>) -> Dispatcher<S> + 'static,
{
    Box::new(f)
}
