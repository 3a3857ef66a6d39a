//! # Counter Demo
//!
//! A counter and a todo list sharing one Holdfast store.
//!
//! This demo showcases:
//! - Two slice reducers combined with `combine_reducers`
//! - Thunk, promise and logger middleware installed with `apply_middleware`
//! - Action creators, including a conditional thunk and a delayed increment
//! - Selectors reading typed slices out of the combined state
//!
//! ## Example
//!
//! ```
//! use counter::{actions, create_app_store, selectors};
//! use holdfast_core::Diagnostics;
//!
//! let store = create_app_store(Diagnostics::Production)?;
//! store.dispatch(actions::increment())?;
//! store.dispatch(actions::add_todo("water the plants"))?;
//!
//! let state = store.get_state()?;
//! assert_eq!(selectors::count(&state), 1);
//! assert_eq!(selectors::open_todos(&state), vec!["water the plants"]);
//! # Ok::<(), holdfast_core::StoreError>(())
//! ```

use holdfast_core::composition::{CombinedReducer, CombinedState, ReducerMap, combine_reducers};
use holdfast_core::middleware::boxed;
use holdfast_core::{Action, Diagnostics, StoreError, Value};
use holdfast_runtime::{
    LoggerMiddleware, PromiseMiddleware, Store, StoreConfig, ThunkMiddleware, apply_middleware,
};
use serde::{Deserialize, Serialize};

/// Slice key of the counter.
pub const COUNT: &str = "count";
/// Slice key of the todo list.
pub const TODOS: &str = "todos";

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// What to do
    pub text: String,
    /// Whether it is done
    pub completed: bool,
}

/// Counter reducer: `INCREMENT`, `DECREMENT`, `INCREMENT_BY` and `RESET`.
#[must_use]
pub fn count(state: Option<&i64>, action: &Action) -> Option<i64> {
    let current = state.copied().unwrap_or(0);
    let next = match action.kind().as_str() {
        Some(actions::INCREMENT) => current + 1,
        Some(actions::DECREMENT) => current - 1,
        Some(actions::INCREMENT_BY) => {
            current + action.payload().and_then(Value::as_i64).unwrap_or(0)
        },
        Some(actions::RESET) => 0,
        _ => current,
    };
    Some(next)
}

/// Todo reducer: `ADD_TODO` and `TOGGLE_TODO`.
#[must_use]
pub fn todos(state: Option<&Vec<Todo>>, action: &Action) -> Option<Vec<Todo>> {
    let mut todos = state.cloned().unwrap_or_default();
    match action.kind().as_str() {
        Some(actions::ADD_TODO) => {
            if let Some(text) = action.payload().and_then(Value::as_str) {
                todos.push(Todo {
                    text: text.to_string(),
                    completed: false,
                });
            }
        },
        Some(actions::TOGGLE_TODO) => {
            let index = action
                .payload()
                .and_then(Value::as_u64)
                .and_then(|index| usize::try_from(index).ok());
            if let Some(todo) = index.and_then(|index| todos.get_mut(index)) {
                todo.completed = !todo.completed;
            }
        },
        _ => {},
    }
    Some(todos)
}

/// The combined root reducer.
#[must_use]
pub fn root_reducer(diagnostics: Diagnostics) -> CombinedReducer {
    combine_reducers(ReducerMap::new().slice(COUNT, count).slice(TODOS, todos))
        .with_diagnostics(diagnostics)
}

/// Build the demo store with thunk, promise and logger middleware.
///
/// # Errors
///
/// Whatever store construction returns.
pub fn create_app_store(diagnostics: Diagnostics) -> Result<Store<CombinedState>, StoreError> {
    Store::builder(root_reducer(diagnostics))
        .config(StoreConfig::default().with_label("counter"))
        .enhancer(apply_middleware([
            boxed(ThunkMiddleware::new()),
            boxed(PromiseMiddleware::new()),
            boxed(LoggerMiddleware::new("counter").with_state(diagnostics.is_development())),
        ]))
        .build()
}

/// Action creators.
pub mod actions {
    use holdfast_core::composition::CombinedState;
    use holdfast_core::{Action, Dispatched, Message, PendingAction, ThunkContext, Value};
    use std::time::Duration;

    /// Increment by one
    pub const INCREMENT: &str = "INCREMENT";
    /// Decrement by one
    pub const DECREMENT: &str = "DECREMENT";
    /// Increment by the payload
    pub const INCREMENT_BY: &str = "INCREMENT_BY";
    /// Reset to zero
    pub const RESET: &str = "RESET";
    /// Append a todo with the payload as text
    pub const ADD_TODO: &str = "ADD_TODO";
    /// Toggle the todo at the payload index
    pub const TOGGLE_TODO: &str = "TOGGLE_TODO";

    /// `INCREMENT`
    #[must_use]
    pub fn increment() -> Action {
        Action::new(INCREMENT)
    }

    /// `DECREMENT`
    #[must_use]
    pub fn decrement() -> Action {
        Action::new(DECREMENT)
    }

    /// `INCREMENT_BY` with `amount`
    #[must_use]
    pub fn increment_by(amount: i64) -> Action {
        Action::new(INCREMENT_BY).with_payload(amount)
    }

    /// `RESET`
    #[must_use]
    pub fn reset() -> Action {
        Action::new(RESET)
    }

    /// `ADD_TODO` with `text`
    #[must_use]
    pub fn add_todo(text: &str) -> Action {
        Action::new(ADD_TODO).with_payload(text)
    }

    /// `TOGGLE_TODO` for `index`
    #[must_use]
    pub fn toggle_todo(index: usize) -> Action {
        Action::new(TOGGLE_TODO).with_payload(index)
    }

    /// Increment only when the count is odd.
    #[must_use]
    pub fn increment_if_odd() -> Message<CombinedState> {
        Message::thunk(|ctx: ThunkContext<CombinedState>| {
            let state = ctx.get_state()?;
            if super::selectors::count(&state) % 2 == 0 {
                return Ok(Dispatched::Value(Value::Null));
            }
            ctx.dispatch(increment())
        })
    }

    /// Increment after `delay`.
    #[must_use]
    pub fn increment_later(delay: Duration) -> Message<CombinedState> {
        Message::future(async move {
            tokio::time::sleep(delay).await;
            increment()
        })
    }

    /// `INCREMENT_BY` with an amount that arrives asynchronously.
    #[must_use]
    pub fn increment_by_async(amount: i64, delay: Duration) -> Message<CombinedState> {
        PendingAction::new(Action::new(INCREMENT_BY), async move {
            tokio::time::sleep(delay).await;
            Ok(amount.into())
        })
        .into()
    }
}

/// Typed reads from the combined state.
pub mod selectors {
    use super::{COUNT, TODOS, Todo};
    use holdfast_core::composition::CombinedState;

    /// The counter, zero when absent.
    #[must_use]
    pub fn count(state: &CombinedState) -> i64 {
        state.get::<i64>(COUNT).copied().unwrap_or(0)
    }

    /// Every todo.
    #[must_use]
    pub fn todos(state: &CombinedState) -> &[Todo] {
        state.get::<Vec<Todo>>(TODOS).map(Vec::as_slice).unwrap_or_default()
    }

    /// Texts of todos not yet completed.
    #[must_use]
    pub fn open_todos(state: &CombinedState) -> Vec<&str> {
        todos(state)
            .iter()
            .filter(|todo| !todo.completed)
            .map(|todo| todo.text.as_str())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use holdfast_testing::ReducerTest;

    #[test]
    fn test_count_reducer() {
        ReducerTest::new(count)
            .given_state(3)
            .when_action(actions::increment_by(4))
            .when_action(actions::decrement())
            .then_state(|count| assert_eq!(*count, 6))
            .run();
    }

    #[test]
    fn test_todo_reducer_toggles() {
        ReducerTest::new(todos)
            .when_action(actions::add_todo("a"))
            .when_action(actions::add_todo("b"))
            .when_action(actions::toggle_todo(1))
            .then_state(|todos| {
                assert!(!todos[0].completed);
                assert!(todos[1].completed);
            })
            .run();
    }

    #[test]
    fn test_increment_if_odd() {
        let store = create_app_store(Diagnostics::Production).unwrap();
        store.dispatch(actions::increment_if_odd()).unwrap();
        assert_eq!(selectors::count(&store.get_state().unwrap()), 0);

        store.dispatch(actions::increment()).unwrap();
        store.dispatch(actions::increment_if_odd()).unwrap();
        assert_eq!(selectors::count(&store.get_state().unwrap()), 2);
    }
}
