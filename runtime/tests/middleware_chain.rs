//! Integration tests for the middleware chain and the built-in middleware.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use holdfast_core::compose::compose;
use holdfast_core::middleware::{Layer, boxed, layer};
use holdfast_core::reducer::BoxedReducer;
use holdfast_core::{
    Action, Dispatched, Dispatcher, Message, MiddlewareApi, PendingAction, StoreError,
    ThunkContext, Value, json,
};
use holdfast_runtime::{
    Enhancer, LoggerMiddleware, PromiseMiddleware, Store, StoreFactory, ThunkMiddleware,
    apply_middleware, create_store,
};
use holdfast_testing::{CallLog, RecordingMiddleware, fixtures};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_first_middleware_intercepts_first_and_last() {
    let log = CallLog::new();
    let store = Store::builder(fixtures::counter)
        .enhancer(apply_middleware([
            boxed(RecordingMiddleware::new("A", &log)),
            boxed(RecordingMiddleware::new("B", &log)),
            boxed(RecordingMiddleware::new("C", &log)),
        ]))
        .build()
        .unwrap();

    store.dispatch(Action::new("INC")).unwrap();
    assert_eq!(
        log.entries(),
        vec!["A>INC", "B>INC", "C>INC", "C<INC", "B<INC", "A<INC"]
    );
    assert_eq!(store.get_state().unwrap(), 1);
}

#[test]
fn test_api_dispatch_reenters_the_whole_chain() {
    let log = CallLog::new();
    // Turns DOUBLE into two INC dispatches through the full chain.
    let doubler = |api: MiddlewareApi<i64>| -> Result<Layer<i64>, StoreError> {
        Ok(layer(move |next: Dispatcher<i64>| {
            let api = api.clone();
            Dispatcher::new(move |message: Message<i64>| match message {
                Message::Action(action) if action.is("DOUBLE") => {
                    api.dispatch(Action::new("INC"))?;
                    api.dispatch(Action::new("INC"))
                },
                other => next.dispatch(other),
            })
        }))
    };
    let store = Store::builder(fixtures::counter)
        .enhancer(apply_middleware([
            boxed(RecordingMiddleware::new("outer", &log)),
            boxed(doubler),
        ]))
        .build()
        .unwrap();

    store.dispatch(Action::new("DOUBLE")).unwrap();
    assert_eq!(store.get_state().unwrap(), 2);
    assert_eq!(
        log.entries(),
        vec!["outer>DOUBLE", "outer>INC", "outer<INC", "outer>INC", "outer<INC", "outer<DOUBLE"]
    );
}

#[tokio::test]
async fn test_thunk_promise_and_logger_together() {
    holdfast_testing::init_tracing();
    let store = Store::builder(fixtures::counter)
        .enhancer(apply_middleware([
            boxed(ThunkMiddleware::new()),
            boxed(PromiseMiddleware::new()),
            boxed(LoggerMiddleware::new("together")),
        ]))
        .build()
        .unwrap();

    // A thunk that starts an async load and returns the pending task.
    let task = store
        .dispatch(Message::thunk(|ctx: ThunkContext<i64>| {
            ctx.dispatch(Action::new("INC"))?;
            ctx.dispatch(PendingAction::new(Action::new("ADD"), async { Ok(json!(40)) }))
        }))
        .unwrap();
    assert!(task.is_task());
    assert_eq!(store.get_state().unwrap(), 1);

    task.settle().await.unwrap();
    assert_eq!(store.get_state().unwrap(), 41);
}

#[test]
fn test_enhancers_compose() {
    let built = Rc::new(Cell::new(0));
    let counting = |built: Rc<Cell<u32>>| -> Enhancer<i64> {
        Box::new(move |create: StoreFactory<i64>| -> StoreFactory<i64> {
            let built = Rc::clone(&built);
            Box::new(move |reducer: BoxedReducer<i64>, preloaded: Option<i64>| {
                built.set(built.get() + 1);
                create(reducer, preloaded)
            })
        })
    };
    let log = CallLog::new();
    let enhancer = compose([
        counting(Rc::clone(&built)),
        apply_middleware([boxed(RecordingMiddleware::new("m", &log))]),
        counting(Rc::clone(&built)),
    ]);

    let store = create_store(fixtures::counter, Some(5), Some(enhancer)).unwrap();
    store.dispatch(Action::new("INC")).unwrap();

    assert_eq!(built.get(), 2);
    assert_eq!(store.get_state().unwrap(), 6);
    assert_eq!(log.entries(), vec!["m>INC", "m<INC"]);
}

#[test]
fn test_replace_reducer_dispatches_through_base_only() {
    let log = CallLog::new();
    let store = Store::builder(fixtures::counter)
        .enhancer(apply_middleware([boxed(RecordingMiddleware::new("m", &log))]))
        .build()
        .unwrap();

    store
        .replace_reducer(|state: Option<&i64>, action: &Action| {
            let count = state.copied().unwrap_or(0);
            Some(if action.is("INC") { count + 10 } else { count })
        })
        .unwrap();
    assert!(log.is_empty());

    store.dispatch(Action::new("INC")).unwrap();
    assert_eq!(store.get_state().unwrap(), 10);
}

#[test]
fn test_thunks_read_state_behind_a_short_circuiting_middleware() {
    let log = CallLog::new();
    let sink = log.clone();
    // Swallows every action without calling `next`.
    let swallow = move |_api: MiddlewareApi<i64>| -> Result<Layer<i64>, StoreError> {
        let sink = sink.clone();
        Ok(layer(move |_next: Dispatcher<i64>| {
            let sink = sink.clone();
            Dispatcher::new(move |message: Message<i64>| {
                sink.push(format!("swallowed {}", message.kind_name()));
                Ok(Dispatched::Value(Value::Null))
            })
        }))
    };
    let store = Store::builder(fixtures::counter)
        .preloaded_state(7)
        .enhancer(apply_middleware([
            boxed(ThunkMiddleware::new()),
            boxed(swallow),
        ]))
        .build()
        .unwrap();

    let seen = Rc::new(Cell::new(0));
    let reads = Rc::clone(&seen);
    store
        .dispatch(Message::thunk(move |ctx: ThunkContext<i64>| {
            reads.set(ctx.get_state()?);
            ctx.dispatch(Action::new("INC"))
        }))
        .unwrap();

    assert_eq!(seen.get(), 7);
    assert_eq!(log.entries(), vec!["swallowed an action"]);
    assert_eq!(store.get_state().unwrap(), 7);
}
