//! Dispatch Performance Benchmarks
//!
//! These benchmarks track the cost of the core paths:
//! - Reducer execution in isolation
//! - Store dispatch throughput, bare and with middleware
//! - Listener fan-out
//! - Combined reducers, including the unchanged-state fast path
//!
//! Run with: `cargo bench`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::unwrap_used)] // Benchmarks can unwrap during setup

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use holdfast_core::composition::{CombinedState, ReducerMap, combine_reducers};
use holdfast_core::middleware::boxed;
use holdfast_core::{Action, Reducer};
use holdfast_runtime::{Store, StoreConfig, ThunkMiddleware, apply_middleware};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
struct BenchState {
    counter: i64,
    data: Rc<Vec<u8>>, // For testing state size impact
}

impl Default for BenchState {
    fn default() -> Self {
        Self {
            counter: 0,
            data: Rc::new(vec![0; 1024]), // 1KB of data
        }
    }
}

fn bench_reducer(state: Option<&BenchState>, action: &Action) -> Option<BenchState> {
    let mut next = state.cloned().unwrap_or_default();
    match action.kind().as_str() {
        Some("INC") => next.counter += 1,
        Some("DEC") => next.counter -= 1,
        Some("RESET") => next.counter = 0,
        _ => {},
    }
    Some(next)
}

fn quiet() -> StoreConfig {
    StoreConfig::default().with_label("bench").with_metrics(false)
}

/// Benchmark reducer execution in isolation (no Store overhead)
fn benchmark_reducer_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("reducer");
    group.throughput(Throughput::Elements(1));

    let state = BenchState::default();
    let inc = Action::new("INC");
    group.bench_function("increment", |b| {
        b.iter(|| bench_reducer(black_box(Some(&state)), black_box(&inc)));
    });

    group.finish();
}

/// Benchmark Store throughput (actions/sec)
fn benchmark_store_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_throughput");
    group.throughput(Throughput::Elements(1));

    group.bench_function("dispatch", |b| {
        let store = Store::builder(bench_reducer).config(quiet()).build().unwrap();
        b.iter(|| store.dispatch(black_box(Action::new("INC"))).unwrap());
    });

    group.bench_function("dispatch_and_read_state", |b| {
        let store = Store::builder(bench_reducer).config(quiet()).build().unwrap();
        b.iter(|| {
            store.dispatch(black_box(Action::new("INC"))).unwrap();
            store.get_state().unwrap().counter
        });
    });

    group.bench_function("dispatch_with_metrics", |b| {
        let store = Store::builder(bench_reducer).build().unwrap();
        b.iter(|| store.dispatch(black_box(Action::new("INC"))).unwrap());
    });

    group.bench_function("dispatch_through_thunk_middleware", |b| {
        let store = Store::builder(bench_reducer)
            .config(quiet())
            .enhancer(apply_middleware([boxed(ThunkMiddleware::new())]))
            .build()
            .unwrap();
        b.iter(|| store.dispatch(black_box(Action::new("INC"))).unwrap());
    });

    group.finish();
}

/// Benchmark listener fan-out
fn benchmark_listeners(c: &mut Criterion) {
    let mut group = c.benchmark_group("listeners");

    for count in [1_usize, 10, 100] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let store = Store::builder(bench_reducer).config(quiet()).build().unwrap();
            let calls = Rc::new(Cell::new(0_u64));
            let _subscriptions: Vec<_> = (0..count)
                .map(|_| {
                    let calls = Rc::clone(&calls);
                    store.subscribe(move || calls.set(calls.get() + 1)).unwrap()
                })
                .collect();
            b.iter(|| store.dispatch(black_box(Action::new("INC"))).unwrap());
        });
    }

    group.finish();
}

/// Benchmark combined reducers
fn benchmark_combined(c: &mut Criterion) {
    let mut group = c.benchmark_group("combined");
    group.throughput(Throughput::Elements(1));

    let reducer = combine_reducers(
        (0..8).fold(ReducerMap::new(), |map, index| {
            map.slice(format!("slice_{index}"), bench_reducer)
        }),
    );
    let state: CombinedState = reducer.reduce(None, &Action::new("INIT")).unwrap().unwrap();

    let inc = Action::new("INC");
    group.bench_function("changed", |b| {
        b.iter(|| reducer.reduce(black_box(Some(&state)), black_box(&inc)).unwrap());
    });

    let noop = Action::new("NOOP");
    group.bench_function("unchanged", |b| {
        b.iter(|| reducer.reduce(black_box(Some(&state)), black_box(&noop)).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_reducer_execution,
    benchmark_store_throughput,
    benchmark_listeners,
    benchmark_combined
);
criterion_main!(benches);
