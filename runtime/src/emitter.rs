//! Named-event fan-out.
//!
//! A small companion to the store for application events that are not state
//! transitions. Handlers are identified by `Rc` identity, so the handler
//! passed to [`EventEmitter::on`] is also the key for
//! [`EventEmitter::remove_listener`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Default per-event handler cap.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Event handler.
pub type Handler<T> = Rc<dyn Fn(&T)>;

/// Errors raised by [`EventEmitter`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitterError {
    /// The event already has the maximum number of handlers.
    #[error("Cannot add listener for `{event}`: limit of {max} listeners reached")]
    MaxListeners {
        /// Event name
        event: String,
        /// Configured cap
        max: usize,
    },
}

struct Registration<T> {
    handler: Handler<T>,
    once: bool,
}

impl<T> Clone for Registration<T> {
    fn clone(&self) -> Self {
        Self {
            handler: Rc::clone(&self.handler),
            once: self.once,
        }
    }
}

/// Emits values of type `T` to handlers registered by event name.
///
/// # Example
///
/// ```
/// use holdfast_runtime::EventEmitter;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let emitter = EventEmitter::new();
/// let total = Rc::new(Cell::new(0));
/// let sink = Rc::clone(&total);
/// emitter.on("added", Rc::new(move |amount: &i32| sink.set(sink.get() + amount)))?;
///
/// assert!(emitter.emit("added", &3));
/// assert!(!emitter.emit("removed", &3));
/// assert_eq!(total.get(), 3);
/// # Ok::<(), holdfast_runtime::EmitterError>(())
/// ```
pub struct EventEmitter<T> {
    events: RefCell<HashMap<String, Rc<Vec<Registration<T>>>>>,
    max_listeners: Cell<usize>,
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self {
            events: RefCell::new(HashMap::new()),
            max_listeners: Cell::new(DEFAULT_MAX_LISTENERS),
        }
    }
}

impl<T> EventEmitter<T> {
    /// Emitter with no handlers and the default cap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn register(
        &self,
        event: &str,
        handler: Handler<T>,
        once: bool,
        prepend: bool,
    ) -> Result<&Self, EmitterError> {
        let mut events = self.events.borrow_mut();
        let registrations = events.entry(event.to_string()).or_default();

        let max = self.max_listeners.get();
        if max > 0 && registrations.len() >= max {
            tracing::warn!(event, max, "max listeners exceeded");
            return Err(EmitterError::MaxListeners {
                event: event.to_string(),
                max,
            });
        }

        let registration = Registration { handler, once };
        let registrations = Rc::make_mut(registrations);
        if prepend {
            registrations.insert(0, registration);
        } else {
            registrations.push(registration);
        }
        Ok(self)
    }

    /// Append a handler for `event`.
    ///
    /// # Errors
    ///
    /// [`EmitterError::MaxListeners`] when the event is at its cap.
    pub fn on(&self, event: &str, handler: Handler<T>) -> Result<&Self, EmitterError> {
        self.register(event, handler, false, false)
    }

    /// Insert a handler for `event` ahead of the existing ones.
    ///
    /// # Errors
    ///
    /// [`EmitterError::MaxListeners`] when the event is at its cap.
    pub fn prepend_listener(&self, event: &str, handler: Handler<T>) -> Result<&Self, EmitterError> {
        self.register(event, handler, false, true)
    }

    /// Append a handler that runs for the next emission only.
    ///
    /// # Errors
    ///
    /// [`EmitterError::MaxListeners`] when the event is at its cap.
    pub fn once(&self, event: &str, handler: Handler<T>) -> Result<&Self, EmitterError> {
        self.register(event, handler, true, false)
    }

    /// Insert a handler that runs for the next emission only, ahead of the
    /// existing ones.
    ///
    /// # Errors
    ///
    /// [`EmitterError::MaxListeners`] when the event is at its cap.
    pub fn prepend_once_listener(
        &self,
        event: &str,
        handler: Handler<T>,
    ) -> Result<&Self, EmitterError> {
        self.register(event, handler, true, true)
    }

    /// Call every handler registered for `event`, in order. Returns whether
    /// there were any.
    ///
    /// Handlers registered or removed by a handler take effect from the next
    /// emission. One-shot handlers are removed before any handler runs.
    pub fn emit(&self, event: &str, value: &T) -> bool {
        let snapshot = {
            let mut events = self.events.borrow_mut();
            let Some(registrations) = events.get_mut(event) else {
                return false;
            };
            let snapshot = Rc::clone(registrations);
            if snapshot.iter().any(|registration| registration.once) {
                Rc::make_mut(registrations).retain(|registration| !registration.once);
            }
            snapshot
        };

        for registration in snapshot.iter() {
            (registration.handler)(value);
        }
        !snapshot.is_empty()
    }

    /// Remove every registration of `handler` for `event`, one-shot ones
    /// included.
    pub fn remove_listener(&self, event: &str, handler: &Handler<T>) -> &Self {
        if let Some(registrations) = self.events.borrow_mut().get_mut(event) {
            if registrations
                .iter()
                .any(|registration| Rc::ptr_eq(&registration.handler, handler))
            {
                Rc::make_mut(registrations)
                    .retain(|registration| !Rc::ptr_eq(&registration.handler, handler));
            }
        }
        self
    }

    /// Remove the handlers for `event`, or for every event when `None`.
    pub fn remove_all_listeners(&self, event: Option<&str>) -> &Self {
        let mut events = self.events.borrow_mut();
        match event {
            Some(event) => {
                events.remove(event);
            },
            None => events.clear(),
        }
        self
    }

    /// Handlers currently registered for `event`.
    #[must_use]
    pub fn listeners(&self, event: &str) -> Vec<Handler<T>> {
        self.events
            .borrow()
            .get(event)
            .map(|registrations| {
                registrations
                    .iter()
                    .map(|registration| Rc::clone(&registration.handler))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of handlers registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.events.borrow().get(event).map_or(0, |registrations| registrations.len())
    }

    /// Names of events with at least one handler.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .events
            .borrow()
            .iter()
            .filter(|(_, registrations)| !registrations.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Change the per-event cap. Zero removes it.
    pub fn set_max_listeners(&self, max: usize) -> &Self {
        self.max_listeners.set(max);
        self
    }

    /// The per-event cap.
    #[must_use]
    pub fn max_listeners(&self) -> usize {
        self.max_listeners.get()
    }
}

impl<T> fmt::Debug for EventEmitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("events", &self.event_names())
            .field("max_listeners", &self.max_listeners.get())
            .finish()
    }
}
