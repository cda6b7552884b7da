//! Thread Safety Tests
//!
//! Hammers a shared registry from many threads. Failures show up as panics,
//! deadlocks (the test hangs) or inconsistent reads.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use envreg::{merge, variables, ConfigValue, MapSource, Registry, UintPtr, Variable};

const READERS: usize = 100;

fn read_concurrently<T: ConfigValue>(registry: &Registry) {
    thread::scope(|scope| {
        for i in 0..READERS {
            scope.spawn(move || {
                let key: Variable<T> = Variable::owned(format!("KEY_{}", i));
                let _ = registry.get(&key);
            });
        }
    });
}

#[test]
fn test_concurrent_reads_every_type() {
    let registry = Registry::new();

    read_concurrently::<String>(&registry);
    read_concurrently::<isize>(&registry);
    read_concurrently::<i8>(&registry);
    read_concurrently::<i16>(&registry);
    read_concurrently::<i32>(&registry);
    read_concurrently::<i64>(&registry);
    read_concurrently::<usize>(&registry);
    read_concurrently::<u8>(&registry);
    read_concurrently::<u16>(&registry);
    read_concurrently::<u32>(&registry);
    read_concurrently::<u64>(&registry);
    read_concurrently::<UintPtr>(&registry);
    read_concurrently::<Vec<u8>>(&registry);
    read_concurrently::<Vec<char>>(&registry);
    read_concurrently::<f32>(&registry);
    read_concurrently::<f64>(&registry);
    read_concurrently::<bool>(&registry);

    assert!(registry.is_empty());
}

#[test]
fn test_concurrent_reads_of_static_values() {
    let registry = Registry::new();
    let mut values = HashMap::new();
    for i in 0..READERS {
        values.insert(Variable::<u64>::owned(format!("KEY_{}", i)), i as u64);
    }
    registry.write_configuration(values);

    thread::scope(|scope| {
        for i in 0..READERS {
            let registry = &registry;
            scope.spawn(move || {
                let key: Variable<u64> = Variable::owned(format!("KEY_{}", i));
                assert_eq!(registry.get(&key), i as u64);
            });
        }
    });
}

#[test]
fn test_concurrent_writers_and_readers() {
    let registry = Arc::new(Registry::new());
    let counter: Variable<u32> = Variable::new("COUNTER");
    let label: Variable<String> = Variable::new("LABEL");

    let handles: Vec<_> = (0..16)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let counter = counter.clone();
            let label = label.clone();
            thread::spawn(move || {
                let source = MapSource::from_iter([("LABEL", format!("writer-{}", t))]);
                for n in 0..200u32 {
                    if t % 2 == 0 {
                        registry.set(&counter, n);
                        registry.load_from(&source, &label, String::new());
                    } else {
                        let _ = registry.get(&counter);
                        let _ = registry.get(&label);
                        let _ = registry.configuration_keys_registered(variables![counter, label]);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.get(&counter), 199);
    assert!(registry.get(&label).starts_with("writer-"));
}

#[test]
fn test_merge_during_writes() {
    let a = Registry::new();
    let b = Registry::new();
    let key: Variable<i64> = Variable::new("SHARED");
    b.set(&key, -1);

    thread::scope(|scope| {
        scope.spawn(|| {
            for n in 0..500 {
                a.set(&key, n);
                a.set(&Variable::<bool>::new("FLAG"), n % 2 == 0);
            }
        });
        scope.spawn(|| {
            for _ in 0..50 {
                let merged = merge(&[&a, &b]);
                // `b` comes last, so its value always wins.
                assert_eq!(merged.get(&key), -1);
            }
        });
    });
}
