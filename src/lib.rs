//! Lock-free in-process message-passing queues, specialized by
//! producer/consumer concurrency class.
//!
//! Two queue flavors, one shared contract:
//!
//! - [`MpmcRing`] - bounded multi-producer multi-consumer ring buffer using a
//!   per-slot sequence protocol (Vyukov-style). Wait-free slot hand-off,
//!   lock-free claim loops, strict full/empty laws on `offer`/`poll`.
//! - [`MpscLinked`] - unbounded multi-producer single-consumer linked queue
//!   built on an atomic tail exchange (Vyukov-style). FIFO in exchange order.
//!
//! Both expose strict and relaxed primitives through [`MessagePassing`]: the
//! strict forms report full/empty only when the queue actually is, the
//! relaxed forms may report them spuriously under contention but are cheaper.
//! Hot counters are kept on their own 128-byte cache lines via
//! [`CachePadded`].
//!
//! # Example
//!
//! ```
//! use mpqueue::{MpmcRing, MpscLinked};
//!
//! let ring = MpmcRing::with_capacity(8).unwrap();
//! assert!(ring.offer(1u64).is_ok());
//! assert_eq!(ring.poll(), Some(1));
//! assert_eq!(ring.poll(), None);
//!
//! let queue = MpscLinked::new();
//! queue.offer("hello").unwrap();
//! assert_eq!(queue.poll(), Some("hello"));
//! assert_eq!(queue.poll(), None);
//! ```

mod backoff;
mod config;
mod invariants;
mod metrics;
mod mpmc;
mod mpsc;
mod pad;
mod queue;

pub use backoff::{Backoff, SpinWait, YieldWait};
pub use config::{Config, MIN_CAPACITY};
pub use metrics::{Metrics, MetricsSnapshot};
pub use mpmc::MpmcRing;
pub use mpsc::MpscLinked;
pub use pad::CachePadded;
pub use queue::{ExitCondition, MessagePassing, QueueError, QueueProgress, WaitStrategy};
