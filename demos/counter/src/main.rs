//! Counter demo binary
//!
//! Drives the combined counter/todo store through synchronous actions, a
//! thunk, a delayed increment and an asynchronously loaded amount.

use counter::{actions, create_app_store, selectors};
use futures::{FutureExt, StreamExt};
use holdfast_core::bind::{ActionCreator, bind_action_creators};
use holdfast_core::composition::CombinedState;
use holdfast_core::{Diagnostics, Message, StoreError, Value};
use std::rc::Rc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), StoreError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter=debug,holdfast_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let diagnostics = Diagnostics::from_env().unwrap_or_else(|error| {
        tracing::warn!(%error, "falling back to the build profile's diagnostics");
        Diagnostics::default()
    });

    println!("=== Counter Demo: Holdfast ===\n");

    let store = create_app_store(diagnostics)?;
    let mut states = store.states()?;
    if let Some(initial) = states.next().await {
        println!("Initial count: {}", selectors::count(&initial));
    }

    let creators: [(&str, ActionCreator<CombinedState>); 3] = [
        ("increment", Rc::new(|_: Value| Message::from(actions::increment()))),
        ("decrement", Rc::new(|_: Value| Message::from(actions::decrement()))),
        (
            "add_todo",
            Rc::new(|text: Value| Message::from(actions::add_todo(text.as_str().unwrap_or_default()))),
        ),
    ];
    let bound = bind_action_creators(creators, &store.dispatcher());

    println!("\n>>> increment, increment, decrement");
    for name in ["increment", "increment", "decrement"] {
        if let Some(creator) = bound.get(name) {
            creator(Value::Null)?;
        }
    }
    println!("Count: {}", selectors::count(&store.get_state()?));

    println!("\n>>> increment_if_odd");
    store.dispatch(actions::increment_if_odd())?;
    println!("Count: {}", selectors::count(&store.get_state()?));

    println!("\n>>> increment_later(50ms) and increment_by_async(10, 20ms)");
    let later = store.dispatch(actions::increment_later(Duration::from_millis(50)))?;
    let loaded = store.dispatch(actions::increment_by_async(10, Duration::from_millis(20)))?;
    let (later, loaded) = futures::join!(later.settle(), loaded.settle());
    later?;
    loaded?;
    println!("Count: {}", selectors::count(&store.get_state()?));

    println!("\n>>> add_todo, toggle_todo(0)");
    if let Some(add_todo) = bound.get("add_todo") {
        add_todo(Value::from("write the changelog"))?;
        add_todo(Value::from("tag the release"))?;
    }
    store.dispatch(actions::toggle_todo(0))?;
    println!("Open todos: {:?}", selectors::open_todos(&store.get_state()?));

    let mut seen = Vec::new();
    while let Some(Some(state)) = states.next().now_or_never() {
        seen.push(selectors::count(&state));
    }
    println!("\nCount history: {seen:?}");

    println!("\n=== Demo Complete ===");
    Ok(())
}
