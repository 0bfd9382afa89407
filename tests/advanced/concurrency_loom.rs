#![cfg(all(feature = "advanced-tests", loom))]
//! Concurrency tests for the identifier pool using loom.
//!
//! `loom` explores every interleaving of concurrent allocators and releasers
//! to check that no identifier is ever handed out twice.

use fragmux::ident::IdentifierPool;
use loom::{model, sync::Arc, thread};

#[test]
fn racing_allocators_never_share_an_identifier() {
    model(|| {
        let pool = Arc::new(IdentifierPool::with_capacity(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || pool.allocate().ok())
            })
            .collect();

        let ids: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("allocator thread panicked"))
            .collect();

        let first = ids[0].expect("first allocation");
        let second = ids[1].expect("second allocation");
        assert_ne!(first, second, "identifier handed out twice");
        assert_eq!(pool.in_use(), 2);
    });
}

#[test]
fn single_slot_goes_to_exactly_one_allocator() {
    model(|| {
        let pool = Arc::new(IdentifierPool::with_capacity(1));
        let p1 = Arc::clone(&pool);
        let p2 = Arc::clone(&pool);

        let t1 = thread::spawn(move || p1.allocate().is_ok());
        let t2 = thread::spawn(move || p2.allocate().is_ok());

        let won = [
            t1.join().expect("first thread panicked"),
            t2.join().expect("second thread panicked"),
        ];
        assert_eq!(won.iter().filter(|ok| **ok).count(), 1);
    });
}

#[test]
fn release_races_with_allocation() {
    model(|| {
        let pool = Arc::new(IdentifierPool::with_capacity(1));
        let held = pool.allocate().expect("initial allocation");

        let releaser = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.release(held))
        };
        let allocator = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.allocate().ok())
        };

        assert!(releaser.join().expect("releaser panicked"));
        let reused = allocator.join().expect("allocator panicked");

        match reused {
            Some(id) => {
                assert_eq!(id, held);
                assert_eq!(pool.in_use(), 1);
            }
            None => assert_eq!(pool.in_use(), 0),
        }
    });
}
