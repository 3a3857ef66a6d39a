//! Right-to-left composition of unary functions.
//!
//! `compose([f, g, h])(x)` is `f(g(h(x)))`: the leftmost function is the
//! outermost one and runs last. Middleware layers and store enhancers are
//! chained with this single primitive, so their ordering stays auditable.
//!
//! ```
//! use holdfast_core::compose::{compose, Unary};
//!
//! let fns: Vec<Unary<i32>> = vec![
//!     Box::new(|x| x + 1),
//!     Box::new(|x| x * 2),
//!     Box::new(|x| x - 3),
//! ];
//! assert_eq!(compose(fns)(5), 5);
//! ```

use smallvec::SmallVec;

/// A boxed function from `T` to `T`.
pub type Unary<T> = Box<dyn Fn(T) -> T>;

/// An ordered list of unary functions applied right to left.
pub struct Composed<T> {
    fns: SmallVec<[Unary<T>; 4]>,
}

impl<T> Default for Composed<T> {
    fn default() -> Self {
        Self {
            fns: SmallVec::new(),
        }
    }
}

impl<T: 'static> Composed<T> {
    /// An empty composition (the identity function).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a function. It becomes the innermost one and runs first.
    #[must_use]
    pub fn then_inner(mut self, f: impl Fn(T) -> T + 'static) -> Self {
        self.fns.push(Box::new(f));
        self
    }

    /// Number of composed functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fns.len()
    }

    /// Whether nothing has been composed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }

    /// Apply the composition: the last function first, the first function last.
    pub fn call(&self, input: T) -> T {
        self.fns.iter().rev().fold(input, |value, f| f(value))
    }

    /// Collapse into a single function.
    ///
    /// With no functions this is the identity, and with exactly one function
    /// it is that function itself.
    #[must_use]
    pub fn into_fn(mut self) -> Unary<T> {
        match self.fns.len() {
            0 => Box::new(|value: T| value),
            1 => match self.fns.pop() {
                Some(only) => only,
                None => Box::new(|value: T| value),
            },
            _ => Box::new(move |value: T| self.call(value)),
        }
    }
}

impl<T> FromIterator<Unary<T>> for Composed<T> {
    fn from_iter<I: IntoIterator<Item = Unary<T>>>(iter: I) -> Self {
        Self {
            fns: iter.into_iter().collect(),
        }
    }
}

/// Compose unary functions right to left.
pub fn compose<T: 'static, I>(fns: I) -> Unary<T>
where
    I: IntoIterator<Item = Unary<T>>,
{
    fns.into_iter().collect::<Composed<T>>().into_fn()
}
