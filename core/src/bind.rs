//! Binding action creators to a dispatcher.
//!
//! A bound creator builds its message and dispatches it in one call, so
//! callers never handle the dispatcher directly.

use crate::dispatch::{DispatchResult, Dispatcher, Message};
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// A named action creator taking a JSON argument.
pub type ActionCreator<S> = Rc<dyn Fn(Value) -> Message<S>>;

/// An action creator bound to a dispatcher.
pub type BoundActionCreator = Rc<dyn Fn(Value) -> DispatchResult>;

/// Bind one action creator.
///
/// The returned closure takes the creator's argument, dispatches what the
/// creator returns and hands back the dispatch result.
///
/// ```
/// use holdfast_core::{Action, Dispatched, Dispatcher, Message};
/// use holdfast_core::bind::bind_action_creator;
///
/// let dispatcher: Dispatcher<()> =
///     Dispatcher::new(|message: Message<()>| message.into_action().map(Dispatched::Action));
/// let add = bind_action_creator(
///     |amount: i64| Action::new("ADD").with_payload(amount),
///     dispatcher,
/// );
/// let echoed = add(3).unwrap();
/// assert!(echoed.action().unwrap().is("ADD"));
/// ```
pub fn bind_action_creator<S, A, M, F>(
    creator: F,
    dispatcher: Dispatcher<S>,
) -> impl Fn(A) -> DispatchResult
where
    S: 'static,
    M: Into<Message<S>>,
    F: Fn(A) -> M,
{
    move |argument| dispatcher.dispatch(creator(argument))
}

/// Bind a set of named action creators.
///
/// The result has one entry per input key; later duplicates win.
pub fn bind_action_creators<S, K, I>(
    creators: I,
    dispatcher: &Dispatcher<S>,
) -> HashMap<String, BoundActionCreator>
where
    S: 'static,
    K: Into<String>,
    I: IntoIterator<Item = (K, ActionCreator<S>)>,
{
    creators
        .into_iter()
        .map(|(key, creator)| {
            let dispatcher = dispatcher.clone();
            let bound: BoundActionCreator =
                Rc::new(move |argument: Value| dispatcher.dispatch(creator(argument)));
            (key.into(), bound)
        })
        .collect()
}
