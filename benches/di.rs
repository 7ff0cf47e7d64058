use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ferrous_scopes::*;
use std::sync::Arc;

// ===== Micro Benchmarks =====

fn bench_value_hit(c: &mut Criterion) {
    let scope = Scope::new();
    scope.provide_value(42u64).unwrap();

    c.bench_function("value_hit_u64", |b| {
        b.iter(|| {
            let v = scope.invoke::<u64>().unwrap();
            black_box(v);
        })
    });
}

fn bench_lazy_hit(c: &mut Criterion) {
    let scope = Scope::new();
    scope.provide(|_| Ok(42u64)).unwrap();

    // Prime the lazy service
    let _ = scope.invoke::<u64>().unwrap();

    c.bench_function("lazy_hit_u64", |b| {
        b.iter(|| {
            let v = scope.invoke::<u64>().unwrap();
            black_box(v);
        })
    });
}

fn bench_lazy_cold(c: &mut Criterion) {
    struct ExpensiveToCreate {
        data: Vec<u64>,
    }

    c.bench_function("lazy_cold_expensive", |b| {
        b.iter_batched(
            || {
                let scope = Scope::new();
                scope
                    .provide(|_| Ok(ExpensiveToCreate { data: (0..1000).collect() }))
                    .unwrap();
                scope
            },
            |scope| {
                let v = scope.invoke::<ExpensiveToCreate>().unwrap();
                black_box(v.data.len());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_lazy_vs_transient(c: &mut Criterion) {
    struct Service {
        data: [u8; 64],
    }

    let mut group = c.benchmark_group("lazy_vs_transient");

    let lazy = Scope::new();
    lazy.provide(|_| Ok(Service { data: [0; 64] })).unwrap();
    let _ = lazy.invoke::<Service>().unwrap();

    group.bench_function("lazy_hit", |b| {
        b.iter(|| {
            let v = lazy.invoke::<Service>().unwrap();
            black_box(&v.data);
        })
    });

    let transient = Scope::new();
    transient.provide_transient(|_| Ok(Service { data: [0; 64] })).unwrap();

    group.bench_function("transient", |b| {
        b.iter(|| {
            let v = transient.invoke::<Service>().unwrap();
            black_box(&v.data);
        })
    });

    group.finish();
}

fn bench_concrete_vs_alias(c: &mut Criterion) {
    trait MyTrait: Send + Sync {
        fn value(&self) -> u64;
    }

    struct ConcreteImpl {
        val: u64,
    }

    impl MyTrait for ConcreteImpl {
        fn value(&self) -> u64 {
            self.val
        }
    }

    let mut group = c.benchmark_group("concrete_vs_alias");

    let scope = Scope::new();
    scope.provide_value(ConcreteImpl { val: 42 }).unwrap();
    scope
        .as_alias::<ConcreteImpl, dyn MyTrait>(|concrete| concrete as Arc<dyn MyTrait>)
        .unwrap();

    group.bench_function("concrete", |b| {
        b.iter(|| {
            let v = scope.invoke::<ConcreteImpl>().unwrap();
            black_box(v.val);
        })
    });

    group.bench_function("alias", |b| {
        b.iter(|| {
            let v = scope.invoke::<dyn MyTrait>().unwrap();
            black_box(v.value());
        })
    });

    group.finish();
}

fn bench_nested_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_lookup");

    for &depth in &[1usize, 4, 16, 64] {
        let root = Scope::new();
        root.provide_value(42u64).unwrap();
        let mut leaf = root.clone();
        for level in 0..depth {
            leaf = leaf.scope(format!("level-{}", level));
        }

        group.bench_with_input(BenchmarkId::new("invoke_from_depth", depth), &depth, |b, _| {
            b.iter(|| {
                let v = leaf.invoke::<u64>().unwrap();
                black_box(v);
            })
        });
    }

    group.finish();
}

fn bench_scope_lifecycle(c: &mut Criterion) {
    struct Connection {
        data: Vec<u8>,
    }

    impl Shutdown for Connection {
        fn shutdown(&self) {
            black_box(&self.data);
        }
    }

    let mut group = c.benchmark_group("scope_lifecycle");

    group.bench_function("empty_child_create_drop", |b| {
        b.iter(|| {
            let child = Scope::new().scope("request");
            black_box(&child);
        })
    });

    group.bench_function("child_with_service_shutdown", |b| {
        b.iter(|| {
            let child = Scope::new().scope("request");
            child
                .service::<Connection>()
                .shutdown()
                .lazy(|_| Ok(Connection { data: vec![0; 1024] }))
                .unwrap();
            let _conn = child.invoke::<Connection>().unwrap();
            child.shutdown(&CancellationToken::new()).unwrap();
        })
    });

    group.finish();
}

fn bench_dependency_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("dependency_chain");

    // Non-circular chain of depth 8, rebuilt on every iteration
    group.bench_function("chain_depth_8_cold", |b| {
        b.iter_batched(
            || {
                let scope = Scope::new();
                scope.provide_named_value("s0", 0u64).unwrap();
                for i in 1..8u64 {
                    let previous = format!("s{}", i - 1);
                    scope
                        .provide_named(format!("s{}", i), move |scope| {
                            Ok(*scope.invoke_named::<u64>(&previous)? + 1)
                        })
                        .unwrap();
                }
                scope
            },
            |scope| {
                let v = scope.invoke_named::<u64>("s7").unwrap();
                black_box(v);
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");

    let scope = Scope::new();
    scope.provide(|_| Ok(42u64)).unwrap();
    let _ = scope.invoke::<u64>().unwrap();

    for &thread_count in &[1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("lazy_threads", thread_count),
            &thread_count,
            |b, &threads| {
                b.iter_custom(|iters| {
                    let start = std::time::Instant::now();
                    crossbeam_utils::thread::scope(|s| {
                        for _ in 0..threads {
                            let scope_ref = &scope;
                            s.spawn(move |_| {
                                for _ in 0..iters / threads as u64 {
                                    let v = scope_ref.invoke::<u64>().unwrap();
                                    black_box(v);
                                }
                            });
                        }
                    })
                    .unwrap();
                    start.elapsed()
                })
            },
        );
    }

    group.finish();
}

// ===== Macro Benchmarks =====

fn bench_large_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_registry");

    for &service_count in &[10, 100, 1000] {
        let scope = Scope::new();
        scope.provide_value(42u64).unwrap();
        for i in 0..service_count {
            scope.provide_named_value(format!("filler-{}", i), i as u32).unwrap();
        }

        group.bench_with_input(
            BenchmarkId::new("invoke_from_large_registry", service_count),
            &service_count,
            |b, _| {
                b.iter(|| {
                    let v = scope.invoke::<u64>().unwrap();
                    black_box(v);
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    micro_benches,
    bench_value_hit,
    bench_lazy_hit,
    bench_lazy_cold,
    bench_lazy_vs_transient,
    bench_concrete_vs_alias,
    bench_nested_lookup,
    bench_scope_lifecycle,
    bench_dependency_chain,
    bench_contention
);

criterion_group!(macro_benches, bench_large_registry);

criterion_main!(micro_benches, macro_benches);
