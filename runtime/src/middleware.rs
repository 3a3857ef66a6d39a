//! Applying middleware to a store.
//!
//! [`apply_middleware`] returns an [`Enhancer`]: a function from a store
//! factory to a store factory. The enhanced factory builds the base store
//! (which runs its `INIT` reduction before any middleware exists), hands
//! every middleware the same [`MiddlewareApi`], and composes the resulting
//! layers around the base dispatcher.
//!
//! While the chain is being built, dispatching through the API fails with
//! [`StoreError::PrematureDispatch`]. Afterwards it reaches the first
//! middleware, so a middleware dispatching through its API sees the whole
//! chain again.

use crate::Store;
use holdfast_core::compose::{Composed, Unary};
use holdfast_core::reducer::BoxedReducer;
use holdfast_core::{
    DispatchResult, Dispatcher, Message, Middleware, MiddlewareApi, StoreError, WeakDispatcher,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Builds a store from a reducer and an optional preloaded state.
pub type StoreFactory<S> =
    Box<dyn FnOnce(BoxedReducer<S>, Option<S>) -> Result<Store<S>, StoreError>>;

/// Wraps store construction. Enhancers compose with
/// [`compose`](holdfast_core::compose::compose).
pub type Enhancer<S> = Unary<StoreFactory<S>>;

enum DispatchSlot<S> {
    Building,
    Ready(WeakDispatcher<S>),
}

fn forward<S: 'static>(slot: &RefCell<DispatchSlot<S>>, message: Message<S>) -> DispatchResult {
    let dispatcher = match &*slot.borrow() {
        DispatchSlot::Building => return Err(StoreError::PrematureDispatch),
        DispatchSlot::Ready(dispatcher) => dispatcher.upgrade().ok_or(StoreError::StoreDropped)?,
    };
    dispatcher.dispatch(message)
}

/// Build an enhancer that installs the given middleware, first one outermost.
///
/// `apply_middleware([a, b, c])` dispatches through `a`, then `b`, then `c`,
/// then the store.
///
/// # Example
///
/// ```
/// use holdfast_core::{Action, Message};
/// use holdfast_core::middleware::boxed;
/// use holdfast_runtime::{Store, ThunkMiddleware, apply_middleware};
///
/// let store = Store::builder(|state: Option<&i64>, action: &Action| {
///     let count = state.copied().unwrap_or(0);
///     Some(if action.is("INC") { count + 1 } else { count })
/// })
/// .enhancer(apply_middleware([boxed(ThunkMiddleware::new())]))
/// .build()?;
///
/// store.dispatch(Message::thunk(|ctx| {
///     ctx.dispatch(Action::new("INC"))?;
///     ctx.dispatch(Action::new("INC"))
/// }))?;
/// assert_eq!(store.get_state()?, 2);
/// # Ok::<(), holdfast_core::StoreError>(())
/// ```
pub fn apply_middleware<S, I>(middlewares: I) -> Enhancer<S>
where
    S: Clone + 'static,
    I: IntoIterator<Item = Box<dyn Middleware<S>>>,
{
    let middlewares: Rc<[Box<dyn Middleware<S>>]> = middlewares.into_iter().collect();

    Box::new(move |create: StoreFactory<S>| -> StoreFactory<S> {
        let middlewares = Rc::clone(&middlewares);
        Box::new(
            move |reducer: BoxedReducer<S>, preloaded: Option<S>| -> Result<Store<S>, StoreError> {
                let store = create(reducer, preloaded)?;

                let slot = Rc::new(RefCell::new(DispatchSlot::Building));
                let late_bound = {
                    let slot = Rc::clone(&slot);
                    Dispatcher::new(move |message: Message<S>| forward(&slot, message))
                };
                let state_source = store.state_reader();
                let api = MiddlewareApi::new(move || state_source.read(), late_bound);

                let layers = middlewares
                    .iter()
                    .map(|middleware| middleware.wrap(api.clone()))
                    .collect::<Result<Composed<Dispatcher<S>>, StoreError>>()?;
                let dispatcher = layers.call(store.dispatcher());
                *slot.borrow_mut() = DispatchSlot::Ready(dispatcher.downgrade());

                tracing::debug!(
                    store = %store.config().label,
                    middleware = middlewares.len(),
                    "middleware applied"
                );
                Ok(store.with_dispatcher(dispatcher))
            },
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use holdfast_core::middleware::{Layer, boxed, layer};
    use holdfast_core::{Action, Dispatched, Value};

    fn counter(state: Option<&i64>, action: &Action) -> Option<i64> {
        let count = state.copied().unwrap_or(0);
        Some(if action.is("INC") { count + 1 } else { count })
    }

    #[test]
    fn test_dispatch_during_construction_is_premature() {
        let eager = |api: MiddlewareApi<i64>| -> Result<Layer<i64>, StoreError> {
            api.dispatch(Action::new("INC"))?;
            Ok(layer(|next: Dispatcher<i64>| next))
        };
        let error = Store::builder(counter)
            .enhancer(apply_middleware([boxed(eager)]))
            .build()
            .unwrap_err();
        assert_eq!(error, StoreError::PrematureDispatch);
    }

    #[test]
    fn test_state_is_readable_during_construction() {
        let reader = |api: MiddlewareApi<i64>| -> Result<Layer<i64>, StoreError> {
            assert_eq!(api.get_state()?, 7);
            Ok(layer(|next: Dispatcher<i64>| next))
        };
        let store = Store::builder(counter)
            .preloaded_state(7)
            .enhancer(apply_middleware([boxed(reader)]))
            .build()
            .unwrap();
        assert_eq!(store.get_state().unwrap(), 7);
    }

    #[test]
    fn test_failing_middleware_aborts_construction() {
        let failing = |_api: MiddlewareApi<i64>| -> Result<Layer<i64>, StoreError> {
            Err(StoreError::StoreDropped)
        };
        let result = Store::builder(counter)
            .enhancer(apply_middleware([boxed(failing)]))
            .build();
        assert_eq!(result.unwrap_err(), StoreError::StoreDropped);
    }

    #[test]
    fn test_no_middleware_keeps_base_dispatch() {
        let store = Store::builder(counter)
            .enhancer(apply_middleware(Vec::<Box<dyn Middleware<i64>>>::new()))
            .build()
            .unwrap();
        store.dispatch(Action::new("INC")).unwrap();
        assert_eq!(store.get_state().unwrap(), 1);
    }

    #[test]
    fn test_api_dispatch_fails_after_store_is_dropped() {
        let captured: Rc<RefCell<Option<MiddlewareApi<i64>>>> = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&captured);
        let capture = move |api: MiddlewareApi<i64>| -> Result<Layer<i64>, StoreError> {
            *sink.borrow_mut() = Some(api);
            Ok(layer(|next: Dispatcher<i64>| next))
        };

        let store = Store::builder(counter)
            .enhancer(apply_middleware([boxed(capture)]))
            .build()
            .unwrap();
        let api = captured.borrow_mut().take().unwrap();
        api.dispatch(Action::new("INC")).unwrap();
        assert_eq!(api.get_state().unwrap(), 1);

        drop(store);
        assert_eq!(
            api.dispatch(Action::new("INC")).unwrap_err(),
            StoreError::StoreDropped
        );
        assert_eq!(api.get_state().unwrap_err(), StoreError::StoreDropped);
    }

    #[test]
    fn test_api_reads_state_when_next_is_never_called() {
        let captured: Rc<RefCell<Option<MiddlewareApi<i64>>>> = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&captured);
        let capture = move |api: MiddlewareApi<i64>| -> Result<Layer<i64>, StoreError> {
            *sink.borrow_mut() = Some(api);
            Ok(layer(|next: Dispatcher<i64>| next))
        };
        // Answers every dispatch itself and drops the base dispatcher.
        let terminal = |_api: MiddlewareApi<i64>| -> Result<Layer<i64>, StoreError> {
            Ok(layer(|_next: Dispatcher<i64>| {
                Dispatcher::new(|_message: Message<i64>| Ok(Dispatched::Value(Value::Null)))
            }))
        };

        let store = Store::builder(counter)
            .preloaded_state(7)
            .enhancer(apply_middleware([boxed(capture), boxed(terminal)]))
            .build()
            .unwrap();
        let api = captured.borrow_mut().take().unwrap();

        store.dispatch(Action::new("INC")).unwrap();
        assert_eq!(store.get_state().unwrap(), 7);
        assert_eq!(api.get_state().unwrap(), 7);
    }
}
