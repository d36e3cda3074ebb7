//! Miri-compatible tests for detecting undefined behavior.
//!
//! Run with: `cargo +nightly miri test --test miri_tests`
//!
//! These exercise the unsafe code paths: slot writes and moves in the ring,
//! the validated peek copy, node allocation/reclamation in the linked queue,
//! and `Drop` of unconsumed elements. Thread counts and element counts are
//! kept tiny so miri's interpreter stays fast.

use mpqueue::{MpmcRing, MpscLinked};
use std::sync::Arc;
use std::thread;

#[test]
fn miri_ring_basic_operations() {
    let ring = MpmcRing::with_capacity(4).unwrap();
    assert!(ring.offer(100u64).is_ok());
    assert!(ring.offer(200).is_ok());
    assert_eq!(ring.size(), 2);
    assert_eq!(ring.poll(), Some(100));
    assert_eq!(ring.poll(), Some(200));
    assert_eq!(ring.poll(), None);
}

#[test]
fn miri_ring_wrap_around() {
    let ring = MpmcRing::with_capacity(4).unwrap();

    // Fill and drain multiple times to exercise slot reuse across laps.
    for round in 0..3u32 {
        for i in 0..4 {
            assert!(ring.offer(round * 10 + i).is_ok());
        }
        assert_eq!(ring.offer(99), Err(99));
        for i in 0..4 {
            assert_eq!(ring.poll(), Some(round * 10 + i));
        }
    }
}

#[test]
fn miri_ring_peek_validated_copy() {
    let ring = MpmcRing::with_capacity(2).unwrap();
    assert_eq!(ring.peek(), None);
    assert_eq!(ring.relaxed_peek(), None);

    ring.offer(5u64).unwrap();
    assert_eq!(ring.peek(), Some(5));
    assert_eq!(ring.relaxed_peek(), Some(5));
    assert_eq!(ring.poll(), Some(5));
    assert_eq!(ring.relaxed_peek(), None);
}

#[test]
fn miri_ring_drop_with_items() {
    let ring = MpmcRing::with_capacity(4).unwrap();
    ring.offer(String::from("hello")).unwrap();
    ring.offer(String::from("world")).unwrap();

    // Consume only one; the other must drop with the ring.
    assert_eq!(ring.poll().as_deref(), Some("hello"));
}

#[test]
fn miri_ring_two_producers() {
    let ring = Arc::new(MpmcRing::with_capacity(8).unwrap());

    let handles: Vec<_> = (0..2)
        .map(|p| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for i in 0..4u64 {
                    assert!(ring.offer(p * 100 + i).is_ok());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut all = Vec::new();
    while let Some(e) = ring.poll() {
        all.push(e);
    }
    all.sort_unstable();
    assert_eq!(all, vec![0, 1, 2, 3, 100, 101, 102, 103]);
}

#[test]
fn miri_linked_basic_operations() {
    let queue = MpscLinked::new();
    queue.offer(String::from("a")).unwrap();
    queue.offer(String::from("b")).unwrap();
    assert_eq!(queue.size(), 2);
    assert_eq!(queue.poll().as_deref(), Some("a"));
    assert_eq!(queue.poll().as_deref(), Some("b"));
    assert_eq!(queue.poll(), None);
}

#[test]
fn miri_linked_drop_reclaims_chain() {
    let queue = MpscLinked::new();
    for i in 0..5 {
        queue.offer(vec![i; 4]).unwrap();
    }
    // Take two, leave three for Drop to reclaim.
    assert_eq!(queue.poll(), Some(vec![0; 4]));
    assert_eq!(queue.drain_up_to(1, |v| assert_eq!(v, vec![1; 4])), 1);
}

#[test]
fn miri_linked_two_producers() {
    let queue = Arc::new(MpscLinked::new());

    let handles: Vec<_> = (0..2)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..4u64 {
                    queue.offer(p * 100 + i).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut all = Vec::new();
    assert_eq!(queue.drain(|e| all.push(e)), 8);
    all.sort_unstable();
    assert_eq!(all, vec![0, 1, 2, 3, 100, 101, 102, 103]);
}

#[test]
fn miri_linked_fill_then_peek() {
    let queue = MpscLinked::new();
    let mut next = 0u64;
    queue.fill_up_to(3, || {
        next += 1;
        next
    });
    assert_eq!(queue.peek(), Some(1));
    assert_eq!(queue.relaxed_peek(), Some(1));
    assert_eq!(queue.poll(), Some(1));
    assert_eq!(queue.peek(), Some(2));
}
