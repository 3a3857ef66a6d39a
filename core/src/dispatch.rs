//! What flows into and out of a dispatch function.
//!
//! The raw store only understands [`Message::Action`] and well-formed
//! [`Message::Record`]s. The other variants exist for middleware: a thunk
//! middleware runs [`Message::Thunk`], and a promise middleware resolves
//! [`Message::Future`] and [`Message::Pending`].

use crate::action::{Action, describe_value};
use crate::error::StoreError;
use crate::middleware::MiddlewareApi;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

/// Result of every dispatch.
pub type DispatchResult = Result<Dispatched, StoreError>;

/// Input to a dispatch function.
pub enum Message<S> {
    /// A typed action.
    Action(Action),
    /// An untyped record, validated into an [`Action`] by the store.
    Record(Value),
    /// A deferred computation run by thunk middleware.
    Thunk(Thunk<S>),
    /// A future resolving to an action, run by promise middleware.
    Future(LocalBoxFuture<'static, Action>),
    /// A flux-standard action whose payload is still resolving.
    Pending(PendingAction),
}

impl<S> Message<S> {
    /// Wrap a closure as a thunk message.
    pub fn thunk<F>(f: F) -> Self
    where
        F: FnOnce(ThunkContext<S>) -> DispatchResult + 'static,
    {
        Self::Thunk(Thunk::new(f))
    }

    /// Wrap a future as a message.
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = Action> + 'static,
    {
        Self::Future(future.boxed_local())
    }

    /// Convert into a plain action, as the raw store requires.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidAction`] for thunks, futures, pending actions
    /// and non-object records; [`StoreError::MissingActionType`] for a record
    /// without `type`.
    pub fn into_action(self) -> Result<Action, StoreError> {
        match self {
            Self::Action(action) => Ok(action),
            Self::Record(value) => Action::try_from(value),
            other => Err(StoreError::InvalidAction {
                received: other.kind_name().to_string(),
            }),
        }
    }

    /// Short description of the variant.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Action(_) => "an action",
            Self::Record(value) => describe_value(value),
            Self::Thunk(_) => "a thunk",
            Self::Future(_) => "a future",
            Self::Pending(_) => "a pending action",
        }
    }
}

impl<S> fmt::Debug for Message<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Self::Record(value) => f.debug_tuple("Record").field(value).finish(),
            Self::Thunk(_) => f.write_str("Thunk(..)"),
            Self::Future(_) => f.write_str("Future(..)"),
            Self::Pending(pending) => f.debug_tuple("Pending").field(&pending.action).finish(),
        }
    }
}

impl<S> From<Action> for Message<S> {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

impl<S> From<Value> for Message<S> {
    fn from(value: Value) -> Self {
        Self::Record(value)
    }
}

impl<S> From<Thunk<S>> for Message<S> {
    fn from(thunk: Thunk<S>) -> Self {
        Self::Thunk(thunk)
    }
}

impl<S> From<PendingAction> for Message<S> {
    fn from(pending: PendingAction) -> Self {
        Self::Pending(pending)
    }
}

/// Output of a dispatch function.
pub enum Dispatched {
    /// The dispatched action, echoed back by the store.
    Action(Action),
    /// A value returned by a thunk.
    Value(Value),
    /// Asynchronous work started by middleware.
    Task(LocalBoxFuture<'static, DispatchResult>),
}

impl Dispatched {
    /// The echoed action, if this is one.
    #[must_use]
    pub const fn action(&self) -> Option<&Action> {
        match self {
            Self::Action(action) => Some(action),
            _ => None,
        }
    }

    /// Take the echoed action, if this is one.
    #[must_use]
    pub fn into_action(self) -> Option<Action> {
        match self {
            Self::Action(action) => Some(action),
            _ => None,
        }
    }

    /// Whether asynchronous work is still outstanding.
    #[must_use]
    pub const fn is_task(&self) -> bool {
        matches!(self, Self::Task(_))
    }

    /// Await tasks until a synchronous outcome remains.
    ///
    /// # Errors
    ///
    /// Propagates the first error produced by an awaited task.
    pub async fn settle(self) -> DispatchResult {
        let mut current = self;
        loop {
            match current {
                Self::Task(task) => current = task.await?,
                settled => return Ok(settled),
            }
        }
    }
}

impl fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Task(_) => f.write_str("Task(..)"),
        }
    }
}

impl From<Action> for Dispatched {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

impl From<Value> for Dispatched {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

type DispatchFn<S> = dyn Fn(Message<S>) -> DispatchResult;

/// A cheap-to-clone dispatch function.
pub struct Dispatcher<S>(Rc<DispatchFn<S>>);

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<S: 'static> Dispatcher<S> {
    /// Wrap a dispatch closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Message<S>) -> DispatchResult + 'static,
    {
        Self(Rc::new(f))
    }

    /// Dispatch a message.
    ///
    /// # Errors
    ///
    /// Whatever the underlying dispatch function returns.
    pub fn dispatch(&self, message: impl Into<Message<S>>) -> DispatchResult {
        (self.0)(message.into())
    }

    /// A weak handle that does not keep this dispatcher alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakDispatcher<S> {
        WeakDispatcher(Rc::downgrade(&self.0))
    }

    /// Whether both handles refer to the same dispatch function.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<S> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatcher(..)")
    }
}

/// Weak counterpart of [`Dispatcher`].
pub struct WeakDispatcher<S>(Weak<DispatchFn<S>>);

impl<S> Clone for WeakDispatcher<S> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<S> WeakDispatcher<S> {
    /// Upgrade to a strong handle if the dispatcher is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Dispatcher<S>> {
        self.0.upgrade().map(Dispatcher)
    }
}

/// A deferred computation that receives the store's capabilities.
pub struct Thunk<S>(Box<dyn FnOnce(ThunkContext<S>) -> DispatchResult>);

impl<S> Thunk<S> {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(ThunkContext<S>) -> DispatchResult + 'static,
    {
        Self(Box::new(f))
    }

    /// Run the thunk.
    ///
    /// # Errors
    ///
    /// Whatever the thunk returns.
    pub fn run(self, context: ThunkContext<S>) -> DispatchResult {
        (self.0)(context)
    }
}

/// Capabilities handed to a running thunk.
pub struct ThunkContext<S> {
    api: MiddlewareApi<S>,
    extra: Option<Rc<dyn Any>>,
}

impl<S: 'static> ThunkContext<S> {
    /// Build a context from the middleware capabilities and an optional extra argument.
    #[must_use]
    pub fn new(api: MiddlewareApi<S>, extra: Option<Rc<dyn Any>>) -> Self {
        Self { api, extra }
    }

    /// Dispatch through the full middleware chain.
    ///
    /// # Errors
    ///
    /// Whatever the chain returns.
    pub fn dispatch(&self, message: impl Into<Message<S>>) -> DispatchResult {
        self.api.dispatch(message)
    }

    /// Read the current state.
    ///
    /// # Errors
    ///
    /// [`StoreError::ReentrantRead`] if called while the reducer is executing.
    pub fn get_state(&self) -> Result<S, StoreError> {
        self.api.get_state()
    }

    /// The extra argument, if one of type `T` was configured.
    #[must_use]
    pub fn extra<T: 'static>(&self) -> Option<&T> {
        self.extra.as_deref()?.downcast_ref::<T>()
    }
}

/// A flux-standard action whose payload is a future.
pub struct PendingAction {
    action: Action,
    payload: LocalBoxFuture<'static, Result<Value, Value>>,
}

impl PendingAction {
    /// Pair an action with the future that produces its payload.
    ///
    /// `Ok` resolves to the payload; `Err` carries the rejection reason.
    pub fn new<F>(action: Action, payload: F) -> Self
    where
        F: Future<Output = Result<Value, Value>> + 'static,
    {
        Self {
            action,
            payload: payload.boxed_local(),
        }
    }

    /// The action the payload will be attached to.
    #[must_use]
    pub const fn action(&self) -> &Action {
        &self.action
    }

    /// Split into the action and its payload future.
    #[must_use]
    pub fn into_parts(self) -> (Action, LocalBoxFuture<'static, Result<Value, Value>>) {
        (self.action, self.payload)
    }
}
