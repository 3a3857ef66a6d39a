//! # Holdfast Testing
//!
//! Testing utilities and helpers for the Holdfast state container.
//!
//! This crate provides:
//! - [`ReducerTest`], a Given/When/Then harness for reducers
//! - Recording mocks for listeners, middleware and observed states
//! - Fixture reducers (a counter and a todo list) and a combined app reducer
//! - `proptest` strategies for actions
//! - [`init_tracing`] for readable logs in tests
//!
//! ## Example
//!
//! ```
//! use holdfast_core::Action;
//! use holdfast_testing::{ReducerTest, fixtures};
//!
//! ReducerTest::new(fixtures::counter)
//!     .given_state(1)
//!     .when_action(Action::new("INC"))
//!     .then_state(|count| assert_eq!(*count, 2))
//!     .run();
//! ```

/// Fixture reducers shared by the test suites
pub mod fixtures;

/// Recording mocks for listeners, middleware and state observation
pub mod mocks;

/// Property-based testing strategies using proptest
pub mod properties;


pub use mocks::{CallLog, RecordingListener, RecordingMiddleware, StateRecorder};
pub use reducer_test::ReducerTest;

use tracing_subscriber::EnvFilter;

/// Install a test-friendly `tracing` subscriber.
///
/// Honors `RUST_LOG` and defaults to `holdfast=debug`. Output goes through the
/// test harness's capture. Safe to call from every test: only the first call
/// installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("holdfast_core=debug,holdfast_runtime=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
