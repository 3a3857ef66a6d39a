//! # Holdfast Core
//!
//! Core types for the Holdfast state container.
//!
//! Holdfast keeps one state value per application and changes it only by
//! dispatching actions through a reducer. This crate holds everything that
//! does not need a running store: actions, the [`Reducer`] trait, reducer
//! composition, function composition, the middleware contract, action-creator
//! binding and the error taxonomy. The store itself lives in
//! `holdfast-runtime`.
//!
//! ## Core Concepts
//!
//! - **State**: an application-defined value owned by the store
//! - **Action**: a plain record with a `type` discriminator
//! - **Reducer**: a pure function `(Option<&State>, &Action) -> Option<State>`
//! - **Middleware**: a dispatch-wrapping layer with access to `get_state` and `dispatch`
//! - **Enhancer**: a wrapper around store construction itself
//!
//! ## Example
//!
//! ```
//! use holdfast_core::{Action, Reducer};
//!
//! let counter = |state: Option<&i64>, action: &Action| {
//!     let count = state.copied().unwrap_or(0);
//!     Some(if action.is("INC") { count + 1 } else { count })
//! };
//!
//! assert_eq!(counter.reduce(Some(&1), &Action::new("INC")), Ok(Some(2)));
//! ```

pub mod action;
pub mod bind;
pub mod compose;
pub mod composition;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod middleware;

mod macros;

pub use action::{Action, ActionType, ReservedType};
pub use config::{ConfigError, Diagnostics};
pub use dispatch::{
    DispatchResult, Dispatched, Dispatcher, Message, PendingAction, Thunk, ThunkContext,
    WeakDispatcher,
};
pub use error::StoreError;
pub use middleware::{Layer, Middleware, MiddlewareApi};
pub use reducer::{BoxedReducer, Reducer};

// Re-exported so downstream crates build actions and payloads without a
// direct dependency.
pub use serde_json::{Value, json};

/// Reducer module - the transition function contract
///
/// Reducers are pure: given the previous state (absent before the first
/// reduction) and an action, they return the next state. Returning `None`
/// is a programming error that the store reports as
/// [`StoreError::UndefinedState`]; to ignore an action, return the previous
/// state.
pub mod reducer {
    use crate::action::Action;
    use crate::error::StoreError;
    use std::rc::Rc;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// Every closure `Fn(Option<&S>, &Action) -> Option<S>` is a reducer.
    /// Implement the trait directly when reducing can fail for reasons other
    /// than producing no state.
    ///
    /// # Example
    ///
    /// ```
    /// use holdfast_core::{Action, Reducer, StoreError};
    ///
    /// struct Toggle;
    ///
    /// impl Reducer<bool> for Toggle {
    ///     fn reduce(&self, state: Option<&bool>, action: &Action) -> Result<Option<bool>, StoreError> {
    ///         let on = state.copied().unwrap_or(false);
    ///         Ok(Some(if action.is("TOGGLE") { !on } else { on }))
    ///     }
    /// }
    ///
    /// assert_eq!(Toggle.reduce(None, &Action::new("TOGGLE")), Ok(Some(true)));
    /// ```
    pub trait Reducer<S> {
        /// Reduce an action into the next state
        ///
        /// # Arguments
        ///
        /// - `state`: The previous state, `None` before the first reduction
        /// - `action`: The action to process
        ///
        /// # Returns
        ///
        /// The next state, or `None` if the reducer produced no state
        ///
        /// # Errors
        ///
        /// Composite reducers return faults of their sub-reducers.
        fn reduce(&self, state: Option<&S>, action: &Action) -> Result<Option<S>, StoreError>;
    }

    impl<S, F> Reducer<S> for F
    where
        F: Fn(Option<&S>, &Action) -> Option<S>,
    {
        fn reduce(&self, state: Option<&S>, action: &Action) -> Result<Option<S>, StoreError> {
            Ok(self(state, action))
        }
    }

    /// A shared, type-erased reducer.
    pub type BoxedReducer<S> = Rc<dyn Reducer<S>>;

    /// Erase a reducer's type.
    pub fn boxed<S, R>(reducer: R) -> BoxedReducer<S>
    where
        R: Reducer<S> + 'static,
    {
        Rc::new(reducer)
    }
}
