//! Property-based testing utilities using proptest.
//!
//! Strategies produce actions understood by the [`fixtures`](crate::fixtures)
//! reducers, plus noise actions no fixture reacts to.

use holdfast_core::{Action, json};
use proptest::collection::vec;
use proptest::prelude::*;

/// Any action understood by [`counter`](crate::fixtures::counter).
pub fn counter_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::new("INC")),
        Just(Action::new("DEC")),
        Just(Action::new("RESET")),
        (-1_000_i64..1_000).prop_map(|amount| Action::new("ADD").with_payload(amount)),
    ]
}

/// Any action understood by [`todos`](crate::fixtures::todos).
pub fn todo_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        "[a-z ]{1,12}".prop_map(|text| Action::new("ADD_TODO").with_payload(text)),
        (0_u64..8).prop_map(|index| Action::new("TOGGLE_TODO").with_payload(index)),
        Just(Action::new("CLEAR_DONE")),
    ]
}

/// Actions no fixture reducer reacts to: unknown string types and
/// non-string types.
pub fn noise_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        "noise/[a-z]{1,8}".prop_map(Action::new),
        any::<i64>().prop_map(|kind| Action::new(json!(kind))),
        Just(Action::new(json!(null))),
    ]
}

/// Any action from the strategies above.
pub fn any_action() -> impl Strategy<Value = Action> {
    prop_oneof![counter_action(), todo_action(), noise_action()]
}

/// Between zero and `max` actions.
pub fn actions(max: usize) -> impl Strategy<Value = Vec<Action>> {
    vec(any_action(), 0..=max)
}
