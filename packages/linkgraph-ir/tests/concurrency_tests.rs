//! Concurrency tests for the link computer
//!
//! Summaries are requested from many threads at once. No request may block
//! on another one, and every method is computed from source at most once.

mod common;

use common::*;
use linkgraph_ir::features::linkage::application::recursion::Acquire;
use linkgraph_ir::features::linkage::application::{AnalysisTask, RecursionGuard};
use linkgraph_ir::shared::models::{Expression, MethodBuilder, MethodRef, TypeInfo, TypeName};

/// `a.C.id(Item)` plus a caller `a.C.twice(Item)` that calls it twice
fn chained() -> (linkgraph_ir::ProgramBuilder, MethodRef, MethodRef) {
    let (mut builder, lib) = program_with_library();
    let info = TypeInfo::new("a.C");
    let id = MethodBuilder::new(&info.name, "id")
        .parameter("x", lib.item_type())
        .returns(lib.item_type())
        .static_method();
    let x = id.parameter_variable(0);
    let id_ref = id.id();
    let id = id.body(body(vec![ret(var(&x))])).build();

    let twice = MethodBuilder::new(&info.name, "twice")
        .parameter("y", lib.item_type())
        .returns(lib.item_type())
        .static_method();
    let y = twice.parameter_variable(0);
    let twice_ref = twice.id();
    let inner = Expression::call(&id_ref, None, vec![var(&y)]);
    let twice = twice
        .body(body(vec![ret(Expression::call(
            &id_ref,
            None,
            vec![inner],
        ))]))
        .build();

    builder.add_type(info).add_method(id).add_method(twice);
    (builder, id_ref, twice_ref)
}

// ============================================================================
// Loom-based Tests
// ============================================================================

#[cfg(loom)]
mod loom_tests {
    use super::*;
    use loom::sync::Arc;
    use loom::thread;

    #[test]
    fn concurrent_summary_requests() {
        loom::model(|| {
            let (builder, id, twice) = chained();
            let computer = Arc::new(computer(builder));

            let handles: Vec<_> = [id, twice]
                .into_iter()
                .map(|m| {
                    let computer = Arc::clone(&computer);
                    thread::spawn(move || {
                        assert!(computer.summary(&m).unwrap().is_available());
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    }

    #[test]
    fn concurrent_guard_acquire() {
        loom::model(|| {
            let guard = Arc::new(RecursionGuard::new());
            let method = MethodRef::new("a.C.m()");

            let handles: Vec<_> = (0..2u64)
                .map(|i| {
                    let guard = Arc::clone(&guard);
                    let method = method.clone();
                    thread::spawn(move || {
                        let task = AnalysisTask::new(i);
                        match guard.try_acquire(&method, &task) {
                            Acquire::Owned(token) => assert_eq!(token.method(), &method),
                            Acquire::Contended(owner) => assert_ne!(owner, i),
                            Acquire::Reentrant => panic!("task {} is not recursive", i),
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(guard.in_progress(), 0);
        });
    }
}

// ============================================================================
// Regular concurrency tests (without loom)
// ============================================================================

#[cfg(not(loom))]
mod stress_concurrency {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn stress_concurrent_requests_compute_once() {
        let (builder, id, twice) = chained();
        let computer = Arc::new(computer(builder));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let computer = Arc::clone(&computer);
                let m = if i % 2 == 0 { id.clone() } else { twice.clone() };
                thread::spawn(move || computer.summary(&m).unwrap().is_available())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(computer.stats().source_computations, 2);
        assert!(computer.failure(&twice).is_none());
    }

    #[test]
    fn stress_owner_is_seen_as_contended() {
        let guard = RecursionGuard::new();
        let method = MethodRef::new("a.C.m()");
        let acquired = Barrier::new(2);
        let checked = Barrier::new(2);

        thread::scope(|s| {
            s.spawn(|| {
                let task = AnalysisTask::new(1);
                let token = guard.try_acquire(&method, &task);
                assert!(matches!(token, Acquire::Owned(_)));
                acquired.wait();
                checked.wait();
                drop(token);
            });
            s.spawn(|| {
                let task = AnalysisTask::new(2);
                acquired.wait();
                assert!(matches!(guard.try_acquire(&method, &task), Acquire::Contended(1)));
                checked.wait();
            });
        });

        assert_eq!(guard.in_progress(), 0);
        assert_eq!(guard.owner(&method), None);
    }

    #[test]
    fn stress_parallel_analysis_matches_sequential() {
        let (builder, _, _) = chained();
        let sequential = computer(builder);
        let (builder, _, _) = chained();
        let config = linkgraph_ir::config::LinkConfig::default()
            .parallel(true)
            .num_workers(4);
        let parallel = computer_with(builder, config);

        let types = vec![
            TypeName::new("a.C"),
            TypeName::new("a.Item"),
        ];
        let left = sequential.analyze_types(&types).unwrap();
        let right = parallel.analyze_types(&types).unwrap();

        assert_eq!(left.len(), right.len());
        for (ty, methods) in &left {
            for (m, outcome) in methods {
                let other = &right[ty][m];
                assert_eq!(
                    outcome.summary().map(|s| s.to_string()),
                    other.summary().map(|s| s.to_string()),
                    "{} differs",
                    m
                );
            }
        }
    }

    #[test]
    fn stress_many_threads_on_one_computer() {
        let (builder, _, twice) = chained();
        let computer = Arc::new(computer(builder));
        let handles: Vec<_> = (0..64)
            .map(|_| {
                let computer = Arc::clone(&computer);
                let twice = twice.clone();
                thread::spawn(move || computer.summary(&twice).unwrap().is_available())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        let stats = computer.stats();
        assert_eq!(stats.failures, 0);
        assert!(stats.source_computations <= 2);
    }
}
