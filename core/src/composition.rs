//! Reducer composition.
//!
//! [`combine_reducers`] turns a [`ReducerMap`] of named sub-reducers into one
//! [`CombinedReducer`] whose state is a [`CombinedState`]: an ordered list of
//! keyed slices, one per sub-reducer.
//!
//! # Examples
//!
//! ```
//! use holdfast_core::{Action, Reducer};
//! use holdfast_core::composition::{combine_reducers, ReducerMap};
//!
//! let reducer = combine_reducers(ReducerMap::new().slice(
//!     "count",
//!     |state: Option<&i64>, action: &Action| {
//!         let count = state.copied().unwrap_or(0);
//!         Some(if action.is("INC") { count + 1 } else { count })
//!     },
//! ));
//!
//! let state = reducer.reduce(None, &Action::new("INC")).unwrap().unwrap();
//! let state = reducer.reduce(Some(&state), &Action::new("INC")).unwrap().unwrap();
//! assert_eq!(state.get::<i64>("count"), Some(&2));
//! ```
//!
//! # Identity
//!
//! When no sub-reducer changes its slice, the combined reducer returns the
//! previous [`CombinedState`] itself, so [`CombinedState::ptr_eq`] can stand in
//! for deep comparison. How "unchanged" is decided depends on how the slice
//! was registered: by value equality ([`ReducerMap::slice`]), by pointer
//! identity ([`ReducerMap::shared`], [`ReducerMap::nest`]), or by a custom
//! predicate ([`ReducerMap::slice_with`]).
//!
//! # Shape assertion
//!
//! Every sub-reducer is probed with no previous state, first with the
//! reserved `INIT` action and then with a reserved unknown action. A
//! sub-reducer that yields no state fails the probe. The failure is not
//! raised when reducers are combined; it is returned by every call to the
//! combined reducer instead, and by [`CombinedReducer::validate`].

use crate::action::{Action, ReservedType};
use crate::config::Diagnostics;
use crate::error::StoreError;
use crate::reducer::Reducer;
use std::any::{Any, type_name};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// A type-erased state slice.
pub type Slice = Rc<dyn Any>;

/// State produced by a [`CombinedReducer`].
///
/// Cloning is cheap: the slices live behind a shared pointer and are copied
/// only when a clone is modified with [`with`](Self::with).
#[derive(Clone, Default)]
pub struct CombinedState(Rc<Vec<(String, Slice)>>);

impl CombinedState {
    /// An empty state, usually the start of a preloaded state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a slice, replacing any slice with the same key in place.
    #[must_use]
    pub fn with<T: 'static>(self, key: impl Into<String>, value: T) -> Self {
        self.with_slice(key, Rc::new(value))
    }

    /// Set an already type-erased slice.
    #[must_use]
    pub fn with_slice(mut self, key: impl Into<String>, slice: Slice) -> Self {
        let key = key.into();
        let slices = Rc::make_mut(&mut self.0);
        match slices.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => *existing = slice,
            None => slices.push((key, slice)),
        }
        self
    }

    /// Typed access to a slice. `None` if the key is absent or holds another type.
    #[must_use]
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        (**self.slice(key)?).downcast_ref::<T>()
    }

    /// Untyped access to a slice.
    #[must_use]
    pub fn slice(&self, key: &str) -> Option<&Slice> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, slice)| slice)
    }

    /// Whether a slice exists for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.slice(key).is_some()
    }

    /// Slice keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    /// Number of slices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether both values are the same state object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn from_slices(slices: Vec<(String, Slice)>) -> Self {
        Self(Rc::new(slices))
    }
}

impl fmt::Debug for CombinedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedState")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

trait SliceReducer {
    fn reduce_slice(
        &self,
        key: &str,
        previous: Option<&Slice>,
        action: &Action,
    ) -> Result<Option<Slice>, StoreError>;
}

struct TypedSlice<T, R> {
    reducer: R,
    unchanged: fn(&T, &T) -> bool,
    _state: PhantomData<fn() -> T>,
}

impl<T: 'static, R: Reducer<T>> SliceReducer for TypedSlice<T, R> {
    fn reduce_slice(
        &self,
        key: &str,
        previous: Option<&Slice>,
        action: &Action,
    ) -> Result<Option<Slice>, StoreError> {
        let typed = previous
            .map(|slice| {
                (**slice)
                    .downcast_ref::<T>()
                    .ok_or_else(|| StoreError::SliceType {
                        key: key.to_string(),
                        expected: type_name::<T>(),
                    })
            })
            .transpose()?;

        let Some(next) = self.reducer.reduce(typed, action)? else {
            return Ok(None);
        };

        if let (Some(slice), Some(current)) = (previous, typed) {
            if (self.unchanged)(current, &next) {
                return Ok(Some(Rc::clone(slice)));
            }
        }
        Ok(Some(Rc::new(next)))
    }
}

/// Named sub-reducers in declaration order.
#[derive(Default)]
pub struct ReducerMap {
    entries: Vec<(String, Box<dyn SliceReducer>)>,
}

impl ReducerMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value slice. An output equal to the previous value keeps the
    /// previous slice.
    #[must_use]
    pub fn slice<T, R>(self, key: impl Into<String>, reducer: R) -> Self
    where
        T: PartialEq + 'static,
        R: Reducer<T> + 'static,
    {
        self.slice_with(key, reducer, <T as PartialEq>::eq)
    }

    /// Register an `Rc` slice compared by pointer identity.
    #[must_use]
    pub fn shared<T, R>(self, key: impl Into<String>, reducer: R) -> Self
    where
        T: 'static,
        R: Reducer<Rc<T>> + 'static,
    {
        self.slice_with(key, reducer, Rc::ptr_eq)
    }

    /// Register a nested combined reducer.
    #[must_use]
    pub fn nest(self, key: impl Into<String>, reducer: CombinedReducer) -> Self {
        self.slice_with(key, reducer, CombinedState::ptr_eq)
    }

    /// Register a slice with a custom "unchanged" predicate.
    ///
    /// Re-registering a key replaces the earlier reducer at its original position.
    #[must_use]
    pub fn slice_with<T, R>(
        mut self,
        key: impl Into<String>,
        reducer: R,
        unchanged: fn(&T, &T) -> bool,
    ) -> Self
    where
        T: 'static,
        R: Reducer<T> + 'static,
    {
        let key = key.into();
        let entry: Box<dyn SliceReducer> = Box::new(TypedSlice {
            reducer,
            unchanged,
            _state: PhantomData,
        });
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((key, entry)),
        }
        self
    }

    /// Registered keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Number of registered sub-reducers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no sub-reducer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Combine into one reducer. Same as [`combine_reducers`].
    #[must_use]
    pub fn combine(self) -> CombinedReducer {
        combine_reducers(self)
    }
}

/// Combine named sub-reducers into one reducer over [`CombinedState`].
///
/// Never fails: a sub-reducer that fails the shape assertion is reported on
/// first use instead.
#[must_use]
pub fn combine_reducers(map: ReducerMap) -> CombinedReducer {
    let shape_error = assert_reducer_shape(&map.entries).err();
    if let Some(error) = &shape_error {
        tracing::debug!(%error, "combined reducer failed its shape assertion");
    }
    CombinedReducer {
        entries: map.entries,
        shape_error,
        diagnostics: Diagnostics::default(),
        unexpected_keys: RefCell::new(HashSet::new()),
    }
}

fn assert_reducer_shape(entries: &[(String, Box<dyn SliceReducer>)]) -> Result<(), StoreError> {
    let probes = [
        (ReservedType::Init, "during initialization"),
        (ReservedType::ProbeUnknown, "when probed with an unknown action type"),
    ];
    for (key, reducer) in entries {
        for (kind, during) in probes {
            if reducer
                .reduce_slice(key, None, &Action::reserved(kind))?
                .is_none()
            {
                return Err(StoreError::ReducerShape {
                    key: key.clone(),
                    during,
                });
            }
        }
    }
    Ok(())
}

/// Reducer produced by [`combine_reducers`].
pub struct CombinedReducer {
    entries: Vec<(String, Box<dyn SliceReducer>)>,
    shape_error: Option<StoreError>,
    diagnostics: Diagnostics,
    unexpected_keys: RefCell<HashSet<String>>,
}

impl CombinedReducer {
    /// Override the diagnostics mode (defaults to the build profile).
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Surface a shape assertion failure now rather than on first use.
    ///
    /// # Errors
    ///
    /// The captured [`StoreError::ReducerShape`], or whatever a sub-reducer
    /// returned while being probed.
    pub fn validate(&self) -> Result<(), StoreError> {
        self.shape_error.clone().map_or(Ok(()), Err)
    }

    /// Sub-reducer keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    fn warn_unexpected_shape(&self, state: Option<&CombinedState>, action: &Action) {
        if self.entries.is_empty() {
            tracing::warn!(
                "store does not have a valid reducer; register at least one sub-reducer \
                 before combining"
            );
            return;
        }
        let Some(state) = state else {
            return;
        };

        let mut cache = self.unexpected_keys.borrow_mut();
        let unexpected: Vec<String> = state
            .keys()
            .filter(|key| !self.entries.iter().any(|(known, _)| known == key))
            .filter(|key| !cache.contains(*key))
            .map(str::to_string)
            .collect();
        cache.extend(unexpected.iter().cloned());

        if unexpected.is_empty() || action.is_reserved(ReservedType::Replace) {
            return;
        }
        let source = if action.is_reserved(ReservedType::Init) {
            "preloaded state passed to the store"
        } else {
            "previous state received by the reducer"
        };
        let expected: Vec<&str> = self.keys().collect();
        tracing::warn!(
            ?unexpected,
            ?expected,
            "unexpected keys found in {source}; expected one of the known reducer keys, \
             unexpected keys will be ignored"
        );
    }
}

impl fmt::Debug for CombinedReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("shape_error", &self.shape_error)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl Reducer<CombinedState> for CombinedReducer {
    fn reduce(
        &self,
        state: Option<&CombinedState>,
        action: &Action,
    ) -> Result<Option<CombinedState>, StoreError> {
        if let Some(error) = &self.shape_error {
            return Err(error.clone());
        }
        if self.diagnostics.is_development() {
            self.warn_unexpected_shape(state, action);
        }

        let mut changed = false;
        let mut next = Vec::with_capacity(self.entries.len());
        for (key, reducer) in &self.entries {
            let previous = state.and_then(|current| current.slice(key));
            let Some(slice) = reducer.reduce_slice(key, previous, action)? else {
                return Err(StoreError::UndefinedState {
                    reducer: key.clone(),
                    action_type: action.kind().to_string(),
                });
            };
            changed = changed || previous.is_none_or(|current| !Rc::ptr_eq(current, &slice));
            next.push((key.clone(), slice));
        }

        match state {
            Some(current) if !changed && current.len() == next.len() => Ok(Some(current.clone())),
            _ => Ok(Some(CombinedState::from_slices(next))),
        }
    }
}
