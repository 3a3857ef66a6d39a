//! Declarative macros for composing functions without boxing.

/// Compose closures right to left at compile time.
///
/// `compose!(f, g, h)` expands to a closure computing `f(g(h(x)))`. With no
/// arguments it is the identity closure, and with one argument it is that
/// argument unchanged. Use [`compose`](crate::compose::compose) when the
/// functions are only known at runtime.
///
/// # Example
///
/// ```
/// use holdfast_core::compose;
///
/// let f = |x: i32| x + 1;
/// let g = |x: i32| x * 2;
/// let h = |x: i32| x - 3;
/// assert_eq!(compose!(f, g, h)(5), 5);
/// ```
#[macro_export]
macro_rules! compose {
    () => {
        |value| value
    };
    ($only:expr $(,)?) => {
        $only
    };
    ($outer:expr, $($inner:expr),+ $(,)?) => {{
        let outer = $outer;
        let inner = $crate::compose!($($inner),+);
        move |value| outer(inner(value))
    }};
}
