//! Reducers used across the test suites and demos.
//!
//! - [`counter`]: `INC`, `DEC`, `ADD` (numeric payload) and `RESET`
//! - [`todos`]: `ADD_TODO` (text payload), `TOGGLE_TODO` (index payload) and
//!   `CLEAR_DONE`
//! - [`app_reducer`]: both of the above combined under `count` and `todos`

use holdfast_core::composition::{CombinedReducer, ReducerMap, combine_reducers};
use holdfast_core::{Action, Value};
use serde::{Deserialize, Serialize};

/// Apply a counter action.
#[must_use]
pub fn counter(state: Option<&i64>, action: &Action) -> Option<i64> {
    let count = state.copied().unwrap_or(0);
    let next = match action.kind().as_str() {
        Some("INC") => count + 1,
        Some("DEC") => count - 1,
        Some("ADD") => count + action.payload().and_then(Value::as_i64).unwrap_or(0),
        Some("RESET") => 0,
        _ => count,
    };
    Some(next)
}

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// What to do
    pub text: String,
    /// Whether it is done
    pub done: bool,
}

impl Todo {
    /// An open todo.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }
}

/// Apply a todo-list action. Unknown actions and bad payloads leave the list
/// as it was.
#[must_use]
pub fn todos(state: Option<&Vec<Todo>>, action: &Action) -> Option<Vec<Todo>> {
    let mut todos = state.cloned().unwrap_or_default();
    match action.kind().as_str() {
        Some("ADD_TODO") => {
            if let Some(text) = action.payload().and_then(Value::as_str) {
                todos.push(Todo::new(text));
            }
        },
        Some("TOGGLE_TODO") => {
            let index = action
                .payload()
                .and_then(Value::as_u64)
                .and_then(|index| usize::try_from(index).ok());
            if let Some(todo) = index.and_then(|index| todos.get_mut(index)) {
                todo.done = !todo.done;
            }
        },
        Some("CLEAR_DONE") => todos.retain(|todo| !todo.done),
        _ => {},
    }
    Some(todos)
}

/// [`counter`] under `count` and [`todos`] under `todos`.
#[must_use]
pub fn app_reducer() -> CombinedReducer {
    combine_reducers(ReducerMap::new().slice("count", counter).slice("todos", todos))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use holdfast_core::composition::CombinedState;
    use holdfast_core::{Reducer, json};

    #[test]
    fn test_counter() {
        assert_eq!(counter(None, &Action::new("INC")), Some(1));
        assert_eq!(counter(Some(&5), &Action::new("DEC")), Some(4));
        assert_eq!(counter(Some(&5), &Action::new("ADD").with_payload(10)), Some(15));
        assert_eq!(counter(Some(&5), &Action::new("RESET")), Some(0));
        assert_eq!(counter(Some(&5), &Action::new(json!(7))), Some(5));
    }

    #[test]
    fn test_todos() {
        let list = todos(None, &Action::new("ADD_TODO").with_payload("write")).unwrap();
        let list = todos(Some(&list), &Action::new("ADD_TODO").with_payload("test")).unwrap();
        let list = todos(Some(&list), &Action::new("TOGGLE_TODO").with_payload(0)).unwrap();
        assert_eq!(list, vec![Todo { text: "write".into(), done: true }, Todo::new("test")]);

        let list = todos(Some(&list), &Action::new("TOGGLE_TODO").with_payload(9)).unwrap();
        let list = todos(Some(&list), &Action::new("CLEAR_DONE")).unwrap();
        assert_eq!(list, vec![Todo::new("test")]);
    }

    #[test]
    fn test_app_reducer_initial_state() {
        let reducer = app_reducer();
        reducer.validate().unwrap();
        let state: CombinedState = reducer
            .reduce(None, &Action::new("INC"))
            .unwrap()
            .unwrap();
        assert_eq!(state.get::<i64>("count"), Some(&1));
        assert_eq!(state.get::<Vec<Todo>>("todos"), Some(&Vec::new()));
    }
}
