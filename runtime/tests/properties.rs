//! Property tests for the dispatch fold and the combinator identity law.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use holdfast_core::composition::CombinedState;
use holdfast_core::{Action, Reducer};
use holdfast_runtime::Store;
use holdfast_testing::fixtures::{self, Todo};
use holdfast_testing::properties::{actions, noise_action};
use proptest::prelude::*;

proptest! {
    #[test]
    fn state_is_the_fold_of_dispatched_actions(actions in actions(32)) {
        let store = Store::new(fixtures::app_reducer(), None).unwrap();
        let mut count: Option<i64> = None;
        let mut todos: Option<Vec<Todo>> = None;
        let init = Action::new("@@fold/INIT");
        count = fixtures::counter(count.as_ref(), &init);
        todos = fixtures::todos(todos.as_ref(), &init);

        for action in &actions {
            store.dispatch(action.clone()).unwrap();
            count = fixtures::counter(count.as_ref(), action);
            todos = fixtures::todos(todos.as_ref(), action);

            let state = store.get_state().unwrap();
            prop_assert_eq!(state.get::<i64>("count"), count.as_ref());
            prop_assert_eq!(state.get::<Vec<Todo>>("todos"), todos.as_ref());
        }
    }

    #[test]
    fn unchanged_slices_keep_the_state_object(
        setup in actions(8),
        noise in noise_action(),
    ) {
        let reducer = fixtures::app_reducer();
        let mut state: CombinedState = reducer.reduce(None, &Action::new("@@fold/INIT")).unwrap().unwrap();
        for action in &setup {
            state = reducer.reduce(Some(&state), action).unwrap().unwrap();
        }

        let next = reducer.reduce(Some(&state), &noise).unwrap().unwrap();
        prop_assert!(next.ptr_eq(&state));
    }

    #[test]
    fn counter_store_matches_plain_fold(amounts in proptest::collection::vec(-50_i64..50, 0..20)) {
        let store = Store::new(fixtures::counter, Some(0)).unwrap();
        for amount in &amounts {
            store.dispatch(Action::new("ADD").with_payload(*amount)).unwrap();
        }
        prop_assert_eq!(store.get_state().unwrap(), amounts.iter().sum::<i64>());
    }
}
