//! Error types shared by every layer of the container.
//!
//! All faults are synchronous and never retried. The store only guarantees
//! that its own bookkeeping (the dispatching flag) is restored before a fault
//! reaches the caller.

use serde_json::Value;
use thiserror::Error;

/// Errors raised by reducers, the store, and middleware.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The dispatched value is not a plain record.
    ///
    /// Thunks and futures need the matching middleware installed before they
    /// reach the store.
    #[error("actions must be plain records, received {received}; use custom middleware for async actions")]
    InvalidAction {
        /// Short description of what was received
        received: String,
    },

    /// The dispatched record has no `type` field.
    #[error("actions may not have an undefined \"type\" field; have you misspelled a constant?")]
    MissingActionType,

    /// `dispatch` was called while the reducer was executing.
    #[error("reducers may not dispatch actions")]
    ReentrantDispatch,

    /// `get_state` was called while the reducer was executing.
    #[error(
        "get_state may not be called while the reducer is executing; \
         the reducer has already received the state as an argument"
    )]
    ReentrantRead,

    /// `subscribe` was called while the reducer was executing.
    #[error(
        "subscribe may not be called while the reducer is executing; \
         subscribe from outside and read the state in the listener instead"
    )]
    ReentrantSubscribe,

    /// A subscription was cancelled while the reducer was executing.
    #[error("a listener may not be unsubscribed while the reducer is executing")]
    ReentrantUnsubscribe,

    /// A reducer produced no state.
    #[error(
        "given action `{action_type}`, reducer `{reducer}` returned no state; \
         to ignore an action, return the previous state"
    )]
    UndefinedState {
        /// Key of the offending sub-reducer, or `root` for the store reducer
        reducer: String,
        /// Type of the action being reduced
        action_type: String,
    },

    /// A sub-reducer failed the probe performed when reducers are combined.
    #[error(
        "reducer `{key}` returned no state {during}; when the previous state is absent a \
         reducer must return its initial state, whatever the action type"
    )]
    ReducerShape {
        /// Key of the offending sub-reducer
        key: String,
        /// Which probe failed
        during: &'static str,
    },

    /// A combined-state slice holds a value of a different type than its reducer.
    #[error("slice `{key}` does not hold a value of type `{expected}`")]
    SliceType {
        /// Key of the slice
        key: String,
        /// Type the reducer expected
        expected: &'static str,
    },

    /// A middleware dispatched while the middleware chain was being built.
    #[error(
        "dispatching while constructing your middleware is not allowed; \
         other middleware would not be applied to this dispatch"
    )]
    PrematureDispatch,

    /// The store behind a middleware dispatcher has been dropped.
    #[error("the store behind this dispatcher has been dropped")]
    StoreDropped,

    /// A pending payload resolved to an error.
    ///
    /// The error action has already been dispatched when this is returned.
    #[error("payload of `{action_type}` was rejected: {reason}")]
    Rejected {
        /// Type of the pending action
        action_type: String,
        /// Rejection reason, as dispatched in the error action's payload
        reason: Value,
    },
}

impl StoreError {
    /// Stable snake-case name of the variant, used as a metric label.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidAction { .. } => "invalid_action",
            Self::MissingActionType => "missing_action_type",
            Self::ReentrantDispatch => "reentrant_dispatch",
            Self::ReentrantRead => "reentrant_read",
            Self::ReentrantSubscribe => "reentrant_subscribe",
            Self::ReentrantUnsubscribe => "reentrant_unsubscribe",
            Self::UndefinedState { .. } => "undefined_state",
            Self::ReducerShape { .. } => "reducer_shape",
            Self::SliceType { .. } => "slice_type",
            Self::PrematureDispatch => "premature_dispatch",
            Self::StoreDropped => "store_dropped",
            Self::Rejected { .. } => "rejected",
        }
    }

    /// Whether this error reports a call made while the reducer was executing.
    #[must_use]
    pub const fn is_reentrancy(&self) -> bool {
        matches!(
            self,
            Self::ReentrantDispatch
                | Self::ReentrantRead
                | Self::ReentrantSubscribe
                | Self::ReentrantUnsubscribe
        )
    }
}
