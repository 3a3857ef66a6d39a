//! Recording mocks.
//!
//! All mocks write into a [`CallLog`], a shared list of strings, so tests can
//! assert on the interleaving of listeners and middleware in one place.

use holdfast_core::middleware::layer;
use holdfast_core::{Action, Dispatcher, Layer, Message, Middleware, MiddlewareApi, StoreError};
use holdfast_runtime::{Store, Subscription};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared, ordered record of calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    /// Copy of every entry so far.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Remove and return every entry so far.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether nothing was logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// A listener that counts its calls and logs its name.
#[derive(Debug, Clone)]
pub struct RecordingListener {
    name: String,
    calls: Rc<Cell<usize>>,
    log: CallLog,
}

impl RecordingListener {
    /// Listener logging `name` into `log` on every call.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            calls: Rc::new(Cell::new(0)),
            log: log.clone(),
        }
    }

    /// A fresh callback for `Store::subscribe`. Every callback from the same
    /// recorder shares its counter.
    pub fn callback(&self) -> impl Fn() + 'static {
        let name = self.name.clone();
        let calls = Rc::clone(&self.calls);
        let log = self.log.clone();
        move || {
            calls.set(calls.get() + 1);
            log.push(name.clone());
        }
    }

    /// Calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

/// Middleware that logs `name>TYPE` before and `name<TYPE` after passing an
/// action on, and remembers every action it saw.
#[derive(Debug, Clone)]
pub struct RecordingMiddleware {
    name: String,
    log: CallLog,
    seen: Rc<RefCell<Vec<Action>>>,
}

impl RecordingMiddleware {
    /// Middleware logging into `log` under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            seen: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Actions that passed through, in order.
    #[must_use]
    pub fn seen(&self) -> Vec<Action> {
        self.seen.borrow().clone()
    }
}

impl<S: 'static> Middleware<S> for RecordingMiddleware {
    fn wrap(&self, _api: MiddlewareApi<S>) -> Result<Layer<S>, StoreError> {
        let recorder = self.clone();
        Ok(layer(move |next: Dispatcher<S>| {
            let recorder = recorder.clone();
            Dispatcher::new(move |message: Message<S>| {
                let label = match &message {
                    Message::Action(action) => {
                        recorder.seen.borrow_mut().push(action.clone());
                        action.kind().to_string()
                    },
                    other => other.kind_name().to_string(),
                };
                recorder.log.push(format!("{}>{label}", recorder.name));
                let result = next.dispatch(message);
                recorder.log.push(format!("{}<{label}", recorder.name));
                result
            })
        }))
    }
}

/// Records every state a store reaches, starting with the current one.
pub struct StateRecorder<S> {
    states: Rc<RefCell<Vec<S>>>,
    subscription: Subscription<S>,
}

impl<S: Clone + 'static> StateRecorder<S> {
    /// Start observing `store`.
    ///
    /// # Errors
    ///
    /// Whatever `Store::observe` returns.
    pub fn attach(store: &Store<S>) -> Result<Self, StoreError> {
        let states = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&states);
        let subscription = store.observe(move |state: S| sink.borrow_mut().push(state))?;
        Ok(Self {
            states,
            subscription,
        })
    }

    /// States recorded so far.
    #[must_use]
    pub fn states(&self) -> Vec<S> {
        self.states.borrow().clone()
    }

    /// Stop recording.
    ///
    /// # Errors
    ///
    /// Whatever `Subscription::unsubscribe` returns.
    pub fn detach(&self) -> Result<(), StoreError> {
        self.subscription.unsubscribe()
    }
}

impl<S> std::fmt::Debug for StateRecorder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRecorder")
            .field("recorded", &self.states.borrow().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_listener_counts_and_logs() {
        let log = CallLog::new();
        let listener = RecordingListener::new("a", &log);
        let first = listener.callback();
        let second = listener.callback();
        first();
        second();
        assert_eq!(listener.calls(), 2);
        assert_eq!(log.take(), vec!["a", "a"]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_recording_middleware_brackets_next() {
        let log = CallLog::new();
        let recorder = RecordingMiddleware::new("m", &log);
        let inner_log = log.clone();
        let base = Dispatcher::new(move |message: Message<()>| {
            inner_log.push("base");
            message.into_action().map(Into::into)
        });
        let api = MiddlewareApi::new(|| Ok(()), base.clone());

        let wrap = recorder.wrap(api).unwrap();
        wrap(base).dispatch(Action::new("PING")).unwrap();

        assert_eq!(log.entries(), vec!["m>PING", "base", "m<PING"]);
        assert_eq!(recorder.seen().len(), 1);
    }
}
