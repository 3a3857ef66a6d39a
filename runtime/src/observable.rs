//! Observer interop built from `subscribe` and `get_state`.
//!
//! Observers receive the current state once on registration and then the
//! post-dispatch state after every successful dispatch. Nothing here keeps
//! its own copy of the state: each notification reads it back from the store.

use crate::store::{Store, Subscription};
use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::stream::Stream;
use holdfast_core::StoreError;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Receives store states.
pub trait Observer<S> {
    /// Called with the current state on registration and after each dispatch.
    fn next(&self, state: S);
}

impl<S, F> Observer<S> for F
where
    F: Fn(S),
{
    fn next(&self, state: S) {
        self(state);
    }
}

impl<S: Clone + 'static> Store<S> {
    /// Replay the current state to `observer`, then forward every
    /// post-dispatch state until the returned subscription is cancelled.
    ///
    /// The observer holds only a weak reference to the store.
    ///
    /// # Errors
    ///
    /// [`StoreError::ReentrantRead`] / [`StoreError::ReentrantSubscribe`]
    /// while the reducer is executing.
    ///
    /// # Example
    ///
    /// ```
    /// use holdfast_core::Action;
    /// use holdfast_runtime::Store;
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// let store = Store::new(
    ///     |state: Option<&u32>, action: &Action| {
    ///         let count = state.copied().unwrap_or(0);
    ///         Some(if action.is("INC") { count + 1 } else { count })
    ///     },
    ///     None,
    /// )?;
    ///
    /// let seen = Rc::new(RefCell::new(Vec::new()));
    /// let sink = Rc::clone(&seen);
    /// let _subscription = store.observe(move |state: u32| sink.borrow_mut().push(state))?;
    ///
    /// store.dispatch(Action::new("INC"))?;
    /// assert_eq!(*seen.borrow(), vec![0, 1]);
    /// # Ok::<(), holdfast_core::StoreError>(())
    /// ```
    pub fn observe<O>(&self, observer: O) -> Result<Subscription<S>, StoreError>
    where
        O: Observer<S> + 'static,
    {
        observer.next(self.get_state()?);

        let state_source = self.state_reader();
        self.subscribe(move || match state_source.read() {
            Ok(state) => observer.next(state),
            Err(error) => tracing::warn!(%error, "observer skipped a notification"),
        })
    }

    /// The current state followed by every post-dispatch state, as a stream.
    ///
    /// States queue in an unbounded channel until polled. Dropping the
    /// stream unsubscribes.
    ///
    /// # Errors
    ///
    /// As for [`observe`](Self::observe).
    pub fn states(&self) -> Result<StateStream<S>, StoreError> {
        let (sender, receiver) = mpsc::unbounded();
        let subscription = self.observe(move |state: S| {
            // A closed receiver means the stream is being dropped.
            let _ = sender.unbounded_send(state);
        })?;
        Ok(StateStream {
            receiver,
            subscription,
        })
    }
}

/// Stream of store states returned by [`Store::states`].
pub struct StateStream<S> {
    receiver: UnboundedReceiver<S>,
    subscription: Subscription<S>,
}

impl<S> Stream for StateStream<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        self.receiver.poll_next_unpin(cx)
    }
}

impl<S> Drop for StateStream<S> {
    fn drop(&mut self) {
        if let Err(error) = self.subscription.unsubscribe() {
            tracing::warn!(%error, "state stream dropped without unsubscribing");
        }
    }
}

impl<S> fmt::Debug for StateStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStream")
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use holdfast_core::Action;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counter(state: Option<&u32>, action: &Action) -> Option<u32> {
        let count = state.copied().unwrap_or(0);
        Some(if action.is("INC") { count + 1 } else { count })
    }

    #[test]
    fn test_observe_replays_then_forwards() {
        let store = Store::new(counter, Some(4)).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let subscription = store
            .observe(move |state: u32| sink.borrow_mut().push(state))
            .unwrap();
        store.dispatch(Action::new("INC")).unwrap();
        store.dispatch(Action::new("NOOP")).unwrap();
        subscription.unsubscribe().unwrap();
        store.dispatch(Action::new("INC")).unwrap();

        assert_eq!(*seen.borrow(), vec![4, 5, 5]);
    }

    #[test]
    fn test_observer_does_not_keep_store_alive() {
        let store = Store::new(counter, None).unwrap();
        let weak = store.downgrade();
        let _subscription = store.observe(|_: u32| {}).unwrap();
        drop(store);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_states_stream() {
        let store = Store::new(counter, None).unwrap();
        let mut states = store.states().unwrap();
        assert_eq!(store.listener_count(), 1);

        store.dispatch(Action::new("INC")).unwrap();
        store.dispatch(Action::new("INC")).unwrap();

        assert_eq!(states.next().await, Some(0));
        assert_eq!(states.next().await, Some(1));
        assert_eq!(states.next().await, Some(2));
        assert!(states.next().now_or_never().is_none());

        drop(states);
        assert_eq!(store.listener_count(), 0);
    }
}
