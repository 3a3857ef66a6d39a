//! # Holdfast Runtime
//!
//! The state container and everything that runs around it.
//!
//! ## Core Components
//!
//! - **Store**: owns the current state, the reducer and the listener list
//! - **Middleware chain**: [`apply_middleware`] wraps the store's dispatch
//! - **Built-in middleware**: [`ThunkMiddleware`], [`PromiseMiddleware`], [`LoggerMiddleware`]
//! - **Observer interop**: [`Store::observe`] and [`Store::states`]
//! - **Event emitter**: a small named-event fan-out utility
//!
//! The store is single-threaded: every dispatch runs the reducer and then the
//! listeners to completion before it returns. Handles are `Rc`-based and not
//! `Send`.
//!
//! ## Example
//!
//! ```
//! use holdfast_core::Action;
//! use holdfast_runtime::Store;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let store = Store::new(
//!     |state: Option<&i64>, action: &Action| {
//!         let count = state.copied().unwrap_or(0);
//!         Some(if action.is("INC") { count + 1 } else { count })
//!     },
//!     None,
//! )?;
//!
//! let seen = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&seen);
//! let _subscription = store.subscribe(move || counter.set(counter.get() + 1))?;
//!
//! store.dispatch(Action::new("INC"))?;
//! store.dispatch(Action::new("INC"))?;
//! assert_eq!(store.get_state()?, 2);
//! assert_eq!(seen.get(), 2);
//! # Ok::<(), holdfast_core::StoreError>(())
//! ```

/// Event emitter collaborator
pub mod emitter;

/// Store metrics through the `metrics` facade
pub mod metrics;

/// Middleware chain builder and store enhancers
pub mod middleware;

/// Observer interop layered over `subscribe`
pub mod observable;

/// Logs every dispatch through `tracing`
pub mod logger;

/// Resolves futures and pending payloads before they reach the store
pub mod promise;

/// Runs deferred computations with access to `dispatch` and `get_state`
pub mod thunk;

pub use emitter::{EmitterError, EventEmitter};
pub use logger::LoggerMiddleware;
pub use middleware::{Enhancer, StoreFactory, apply_middleware};
pub use observable::{Observer, StateStream};
pub use promise::PromiseMiddleware;
pub use store::{Listener, Store, StoreBuilder, Subscription, WeakStore, create_store};
pub use thunk::ThunkMiddleware;

use holdfast_core::StoreError;
use std::cell::Cell;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use holdfast_runtime::StoreConfig;
///
/// let config = StoreConfig::default().with_label("session").with_metrics(false);
/// assert_eq!(config.label, "session");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Label attached to logs and metrics
    pub label: String,
    /// Whether dispatches are recorded through the `metrics` facade
    pub record_metrics: bool,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub fn new(label: impl Into<String>, record_metrics: bool) -> Self {
        Self {
            label: label.into(),
            record_metrics,
        }
    }

    /// Set the label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Enable or disable metric recording
    #[must_use]
    pub const fn with_metrics(mut self, record_metrics: bool) -> Self {
        self.record_metrics = record_metrics;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: "store".to_string(),
            record_metrics: true,
        }
    }
}

/// Internal: RAII guard that clears the dispatching flag on drop
///
/// Ensures the flag is always cleared, even if the reducer returns an error
/// or panics.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn undefined_root_state(action: &holdfast_core::Action) -> StoreError {
    StoreError::UndefinedState {
        reducer: "root".to_string(),
        action_type: action.kind().to_string(),
    }
}

/// Store module - the state container
///
/// The store owns the current state, the reducer and the listener list, and
/// only changes them through `dispatch`, `subscribe` and `replace_reducer`.
pub mod store {
    use super::{DispatchGuard, StoreConfig, StoreError, undefined_root_state};
    use crate::metrics::StoreMetrics;
    use crate::middleware::Enhancer;
    use holdfast_core::reducer::{self, BoxedReducer, Reducer};
    use holdfast_core::{Action, DispatchResult, Dispatched, Dispatcher, Message, ReservedType};
    use std::cell::{Cell, RefCell};
    use std::fmt;
    use std::rc::{Rc, Weak};
    use std::time::Instant;

    /// A zero-argument callback invoked after every successful dispatch.
    pub type Listener = Rc<dyn Fn()>;

    pub(crate) struct StoreInner<S> {
        reducer: RefCell<BoxedReducer<S>>,
        state: RefCell<S>,
        /// Listeners for the next notification pass. A dispatch in progress
        /// iterates its own clone of the `Rc`, so mutations copy first.
        listeners: RefCell<Rc<Vec<Listener>>>,
        dispatching: Cell<bool>,
        config: StoreConfig,
        metrics: StoreMetrics,
    }

    impl<S: Clone + 'static> StoreInner<S> {
        fn get_state(&self) -> Result<S, StoreError> {
            if self.dispatching.get() {
                return Err(StoreError::ReentrantRead);
            }
            Ok(self.state.borrow().clone())
        }

        fn dispatch(&self, message: Message<S>) -> DispatchResult {
            let result = message.into_action().and_then(|action| {
                if action.kind().is_reserved() {
                    return Err(StoreError::InvalidAction {
                        received: format!("the reserved action `{}`", action.kind()),
                    });
                }
                self.dispatch_action(action)
            });
            self.recorded(result)
        }

        /// Dispatch one of the reserved actions only the store may send.
        fn dispatch_reserved(&self, kind: ReservedType) -> DispatchResult {
            let result = self.dispatch_action(Action::reserved(kind));
            self.recorded(result)
        }

        fn recorded(&self, result: DispatchResult) -> DispatchResult {
            if let Err(error) = &result {
                self.metrics.record_rejected(error);
            }
            result
        }

        fn dispatch_action(&self, action: Action) -> DispatchResult {
            if self.dispatching.get() {
                return Err(StoreError::ReentrantDispatch);
            }
            self.reduce_and_notify(action).map(Dispatched::Action)
        }

        fn reduce_and_notify(&self, action: Action) -> Result<Action, StoreError> {
            tracing::trace!(store = %self.config.label, action = %action, "dispatching");
            let reducer = Rc::clone(&self.reducer.borrow());

            let started = Instant::now();
            let next = {
                let _guard = DispatchGuard::enter(&self.dispatching);
                let state = self.state.borrow();
                reducer.reduce(Some(&*state), &action)
            };
            self.metrics.record_dispatch(started.elapsed());

            let next = next?.ok_or_else(|| undefined_root_state(&action))?;
            *self.state.borrow_mut() = next;

            let snapshot = Rc::clone(&self.listeners.borrow());
            for listener in snapshot.iter() {
                listener();
            }
            self.metrics.record_notified(snapshot.len());

            Ok(action)
        }
    }

    /// The Store - single owner of the application state
    ///
    /// A `Store` is a cheap handle: clones share the same state, reducer and
    /// listeners. Stores returned by an enhancer differ from the base store
    /// only in their dispatcher.
    ///
    /// # Example
    ///
    /// ```
    /// use holdfast_core::Action;
    /// use holdfast_runtime::Store;
    ///
    /// let store = Store::builder(|state: Option<&Vec<String>>, action: &Action| {
    ///     let mut todos = state.cloned().unwrap_or_default();
    ///     if action.is("ADD") {
    ///         todos.push(action.payload()?.as_str()?.to_string());
    ///     }
    ///     Some(todos)
    /// })
    /// .preloaded_state(vec!["existing".to_string()])
    /// .build()?;
    ///
    /// store.dispatch(Action::new("ADD").with_payload("next"))?;
    /// assert_eq!(store.get_state()?, vec!["existing", "next"]);
    /// # Ok::<(), holdfast_core::StoreError>(())
    /// ```
    pub struct Store<S> {
        inner: Rc<StoreInner<S>>,
        dispatcher: Dispatcher<S>,
    }

    impl<S> Clone for Store<S> {
        fn clone(&self) -> Self {
            Self {
                inner: Rc::clone(&self.inner),
                dispatcher: self.dispatcher.clone(),
            }
        }
    }

    impl<S> fmt::Debug for Store<S> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Store")
                .field("label", &self.inner.config.label)
                .field("listeners", &self.inner.listeners.borrow().len())
                .field("dispatching", &self.inner.dispatching.get())
                .finish_non_exhaustive()
        }
    }

    impl<S: Clone + 'static> Store<S> {
        /// Create a store with the default configuration and no enhancer.
        ///
        /// # Errors
        ///
        /// Whatever the reducer returns for the initial `INIT` action, or
        /// [`StoreError::UndefinedState`] if it yields no state.
        pub fn new<R>(reducer: R, preloaded_state: Option<S>) -> Result<Self, StoreError>
        where
            R: Reducer<S> + 'static,
        {
            let builder = Self::builder(reducer);
            match preloaded_state {
                Some(state) => builder.preloaded_state(state).build(),
                None => builder.build(),
            }
        }

        /// Start building a store.
        pub fn builder<R>(reducer: R) -> StoreBuilder<S>
        where
            R: Reducer<S> + 'static,
        {
            StoreBuilder {
                reducer: reducer::boxed(reducer),
                preloaded_state: None,
                enhancer: None,
                config: StoreConfig::default(),
            }
        }

        /// Build the base store and run the initial `INIT` reduction.
        pub(crate) fn create_base(
            reducer: BoxedReducer<S>,
            preloaded_state: Option<S>,
            config: StoreConfig,
        ) -> Result<Self, StoreError> {
            let dispatching = Cell::new(false);
            let metrics = StoreMetrics::new(&config);
            let init = Action::reserved(ReservedType::Init);

            let started = Instant::now();
            let initial = {
                let _guard = DispatchGuard::enter(&dispatching);
                reducer.reduce(preloaded_state.as_ref(), &init)
            };
            metrics.record_dispatch(started.elapsed());
            let state = initial?.ok_or_else(|| undefined_root_state(&init))?;

            let inner = Rc::new(StoreInner {
                reducer: RefCell::new(reducer),
                state: RefCell::new(state),
                listeners: RefCell::new(Rc::new(Vec::new())),
                dispatching,
                config,
                metrics,
            });
            let base = Rc::clone(&inner);
            let dispatcher = Dispatcher::new(move |message: Message<S>| base.dispatch(message));

            tracing::debug!(store = %inner.config.label, "store created");
            Ok(Self { inner, dispatcher })
        }

        /// The current state.
        ///
        /// # Errors
        ///
        /// [`StoreError::ReentrantRead`] while the reducer is executing.
        pub fn get_state(&self) -> Result<S, StoreError> {
            self.inner.get_state()
        }

        /// Dispatch a message through the store's dispatcher (including any
        /// middleware).
        ///
        /// The raw store accepts actions and well-formed records, reduces
        /// them, notifies every listener subscribed when the dispatch started
        /// and echoes the action back.
        ///
        /// # Errors
        ///
        /// - [`StoreError::InvalidAction`] / [`StoreError::MissingActionType`] for malformed input
        /// - [`StoreError::ReentrantDispatch`] when called from a reducer
        /// - [`StoreError::UndefinedState`] when the reducer yields no state
        /// - anything a middleware or the reducer returns
        pub fn dispatch(&self, message: impl Into<Message<S>>) -> DispatchResult {
            self.dispatcher.dispatch(message)
        }

        /// The dispatcher used by [`dispatch`](Self::dispatch).
        #[must_use]
        pub fn dispatcher(&self) -> Dispatcher<S> {
            self.dispatcher.clone()
        }

        /// Register a listener.
        ///
        /// # Errors
        ///
        /// [`StoreError::ReentrantSubscribe`] while the reducer is executing.
        pub fn subscribe<F>(&self, listener: F) -> Result<Subscription<S>, StoreError>
        where
            F: Fn() + 'static,
        {
            self.subscribe_shared(Rc::new(listener))
        }

        /// Register an existing listener reference.
        ///
        /// The same reference may be registered several times; each
        /// registration is notified and removed separately.
        ///
        /// # Errors
        ///
        /// [`StoreError::ReentrantSubscribe`] while the reducer is executing.
        pub fn subscribe_shared(&self, listener: Listener) -> Result<Subscription<S>, StoreError> {
            if self.inner.dispatching.get() {
                return Err(StoreError::ReentrantSubscribe);
            }
            let count = {
                let mut listeners = self.inner.listeners.borrow_mut();
                let pending = Rc::make_mut(&mut listeners);
                pending.push(Rc::clone(&listener));
                pending.len()
            };
            self.inner.metrics.record_listeners(count);

            Ok(Subscription {
                store: Rc::downgrade(&self.inner),
                listener,
                active: Cell::new(true),
            })
        }

        /// Number of registered listeners.
        #[must_use]
        pub fn listener_count(&self) -> usize {
            self.inner.listeners.borrow().len()
        }

        /// Swap the reducer and dispatch the reserved `REPLACE` action.
        ///
        /// # Errors
        ///
        /// [`StoreError::ReentrantDispatch`] while the reducer is executing
        /// (the reducer is not swapped), otherwise whatever the `REPLACE`
        /// dispatch returns.
        pub fn replace_reducer<R>(&self, reducer: R) -> Result<(), StoreError>
        where
            R: Reducer<S> + 'static,
        {
            if self.inner.dispatching.get() {
                return Err(StoreError::ReentrantDispatch);
            }
            *self.inner.reducer.borrow_mut() = reducer::boxed(reducer);
            tracing::debug!(store = %self.inner.config.label, "reducer replaced");

            self.inner
                .dispatch_reserved(ReservedType::Replace)
                .map(|_| ())
        }

        /// A weak handle that does not keep the store alive.
        #[must_use]
        pub fn downgrade(&self) -> WeakStore<S> {
            WeakStore {
                inner: Rc::downgrade(&self.inner),
                dispatcher: self.dispatcher.downgrade(),
            }
        }

        /// Reads the base state directly, whatever dispatcher this handle holds.
        pub(crate) fn state_reader(&self) -> StateReader<S> {
            StateReader(Rc::downgrade(&self.inner))
        }

        /// The store's configuration.
        #[must_use]
        pub fn config(&self) -> &StoreConfig {
            &self.inner.config
        }

        /// The same store with a different dispatcher.
        pub(crate) fn with_dispatcher(&self, dispatcher: Dispatcher<S>) -> Self {
            Self {
                inner: Rc::clone(&self.inner),
                dispatcher,
            }
        }
    }

    /// Weak counterpart of [`Store`].
    pub struct WeakStore<S> {
        inner: Weak<StoreInner<S>>,
        dispatcher: holdfast_core::WeakDispatcher<S>,
    }

    impl<S> Clone for WeakStore<S> {
        fn clone(&self) -> Self {
            Self {
                inner: Weak::clone(&self.inner),
                dispatcher: self.dispatcher.clone(),
            }
        }
    }

    impl<S> WeakStore<S> {
        /// Upgrade if the store is still alive.
        #[must_use]
        pub fn upgrade(&self) -> Option<Store<S>> {
            Some(Store {
                inner: self.inner.upgrade()?,
                dispatcher: self.dispatcher.upgrade()?,
            })
        }
    }

    /// Weak access to a store's state that bypasses every dispatcher.
    pub(crate) struct StateReader<S>(Weak<StoreInner<S>>);

    impl<S: Clone + 'static> StateReader<S> {
        pub(crate) fn read(&self) -> Result<S, StoreError> {
            self.0.upgrade().ok_or(StoreError::StoreDropped)?.get_state()
        }
    }

    /// Handle returned by [`Store::subscribe`].
    ///
    /// Dropping a subscription does not unsubscribe.
    pub struct Subscription<S> {
        store: Weak<StoreInner<S>>,
        listener: Listener,
        active: Cell<bool>,
    }

    impl<S> Subscription<S> {
        /// Remove this registration. Later calls do nothing.
        ///
        /// Takes effect from the next dispatch: a dispatch already notifying
        /// listeners still calls this one.
        ///
        /// # Errors
        ///
        /// [`StoreError::ReentrantUnsubscribe`] while the reducer is executing.
        pub fn unsubscribe(&self) -> Result<(), StoreError> {
            if !self.active.get() {
                return Ok(());
            }
            let Some(inner) = self.store.upgrade() else {
                self.active.set(false);
                return Ok(());
            };
            if inner.dispatching.get() {
                return Err(StoreError::ReentrantUnsubscribe);
            }
            self.active.set(false);

            let count = {
                let mut listeners = inner.listeners.borrow_mut();
                if let Some(index) = listeners
                    .iter()
                    .position(|registered| Rc::ptr_eq(registered, &self.listener))
                {
                    Rc::make_mut(&mut listeners).remove(index);
                }
                listeners.len()
            };
            inner.metrics.record_listeners(count);
            Ok(())
        }

        /// Whether [`unsubscribe`](Self::unsubscribe) has not succeeded yet.
        #[must_use]
        pub fn is_active(&self) -> bool {
            self.active.get()
        }
    }

    impl<S> fmt::Debug for Subscription<S> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Subscription")
                .field("active", &self.active.get())
                .finish_non_exhaustive()
        }
    }

    /// Builder for [`Store`].
    pub struct StoreBuilder<S> {
        reducer: BoxedReducer<S>,
        preloaded_state: Option<S>,
        enhancer: Option<Enhancer<S>>,
        config: StoreConfig,
    }

    impl<S: Clone + 'static> StoreBuilder<S> {
        /// State passed to the reducer with the initial `INIT` action.
        #[must_use]
        pub fn preloaded_state(mut self, state: S) -> Self {
            self.preloaded_state = Some(state);
            self
        }

        /// Wrap store construction, e.g. with [`apply_middleware`](crate::apply_middleware).
        #[must_use]
        pub fn enhancer(mut self, enhancer: Enhancer<S>) -> Self {
            self.enhancer = Some(enhancer);
            self
        }

        /// Use a custom configuration.
        #[must_use]
        pub fn config(mut self, config: StoreConfig) -> Self {
            self.config = config;
            self
        }

        /// Build the store, delegating to the enhancer if one is set.
        ///
        /// # Errors
        ///
        /// Whatever the initial reduction or the enhancer returns.
        pub fn build(self) -> Result<Store<S>, StoreError> {
            let config = self.config;
            let base: crate::StoreFactory<S> =
                Box::new(move |reducer: BoxedReducer<S>, preloaded: Option<S>| {
                    Store::create_base(reducer, preloaded, config)
                });
            let factory = match self.enhancer {
                Some(enhancer) => enhancer(base),
                None => base,
            };
            factory(self.reducer, self.preloaded_state)
        }
    }

    /// Create a store, optionally preloaded and enhanced.
    ///
    /// # Errors
    ///
    /// Whatever the initial reduction or the enhancer returns.
    pub fn create_store<S, R>(
        reducer: R,
        preloaded_state: Option<S>,
        enhancer: Option<Enhancer<S>>,
    ) -> Result<Store<S>, StoreError>
    where
        S: Clone + 'static,
        R: Reducer<S> + 'static,
    {
        let mut builder = Store::builder(reducer);
        if let Some(state) = preloaded_state {
            builder = builder.preloaded_state(state);
        }
        if let Some(enhancer) = enhancer {
            builder = builder.enhancer(enhancer);
        }
        builder.build()
    }
}
