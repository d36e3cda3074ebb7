use thiserror::Error;

/// Error types for queue construction and unsupported operations.
///
/// Transient full/empty conditions are never errors: `offer` hands the
/// element back through `Err(element)` and `poll`/`peek` return `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Construction was attempted with a capacity below the minimum of 2.
    #[error("capacity {requested} is below the minimum of 2")]
    InvalidCapacity {
        /// The capacity that was requested.
        requested: usize,
    },
    /// The operation is not provided by this queue flavor.
    #[error("{op} is not supported by this queue")]
    Unsupported {
        /// Name of the rejected operation.
        op: &'static str,
    },
}

/// Idle policy consulted by the bulk loops when a queue is momentarily
/// empty (drain) or an offer is rejected (fill).
///
/// `idle` receives the number of consecutive unproductive iterations and
/// returns the updated count; the caller resets it to zero after progress.
/// Implemented for any `FnMut(u64) -> u64` closure and by the concrete
/// strategies in this crate.
pub trait WaitStrategy {
    fn idle(&mut self, idle_count: u64) -> u64;
}

impl<F> WaitStrategy for F
where
    F: FnMut(u64) -> u64,
{
    #[inline]
    fn idle(&mut self, idle_count: u64) -> u64 {
        self(idle_count)
    }
}

/// Termination test consulted between iterations of the open-ended bulk
/// loops. Implemented for any `Fn() -> bool` closure.
pub trait ExitCondition {
    fn keep_running(&self) -> bool;
}

impl<F> ExitCondition for F
where
    F: Fn() -> bool,
{
    #[inline]
    fn keep_running(&self) -> bool {
        self()
    }
}

/// The shared message-passing contract.
///
/// Strict `offer`/`poll` honor exact full/empty laws: `offer` fails only when
/// the queue is actually full at the linearization point, `poll` returns
/// `None` only when it is actually empty. The `relaxed_*` variants may signal
/// spurious full/empty under contention in exchange for fewer cross-index
/// loads, but never corrupt state.
///
/// `peek` variants require `T: Copy`: a peeked slot may be recycled by a
/// concurrent consumer, so the implementation copies the value and validates
/// the read instead of handing out a reference.
pub trait MessagePassing<T> {
    /// Capacity for bounded queues, `None` for unbounded ones.
    fn capacity(&self) -> Option<usize>;

    /// Number of elements currently in the queue. Bounded queues report a
    /// value in `[0, capacity]`; the estimate may be stale under contention
    /// but is never negative.
    fn size(&self) -> usize;

    /// Conservative emptiness test.
    fn is_empty(&self) -> bool;

    /// Enqueue an element. `Err(element)` hands the element back when the
    /// queue is full.
    fn offer(&self, element: T) -> Result<(), T>;

    /// Like [`offer`](MessagePassing::offer) but may report full spuriously
    /// under contention.
    fn relaxed_offer(&self, element: T) -> Result<(), T>;

    /// Dequeue the oldest element, `None` when empty.
    fn poll(&self) -> Option<T>;

    /// Like [`poll`](MessagePassing::poll) but may report empty spuriously
    /// under contention.
    fn relaxed_poll(&self) -> Option<T>;

    /// Copy of the oldest element without removing it.
    fn peek(&self) -> Option<T>
    where
        T: Copy;

    /// Single-attempt peek; may return `None` even when the queue holds
    /// elements.
    fn relaxed_peek(&self) -> Option<T>
    where
        T: Copy;

    /// Repeatedly poll into `consumer` until the queue looks empty or an
    /// implementation-defined bound is reached. Returns the number delivered.
    fn drain<F: FnMut(T)>(&self, consumer: F) -> usize;

    /// Poll at most `limit` elements into `consumer`, stopping early on
    /// empty. Returns the number delivered.
    fn drain_up_to<F: FnMut(T)>(&self, limit: usize, consumer: F) -> usize;

    /// Drain until `exit` stops the loop, idling through `wait` whenever the
    /// queue looks empty.
    fn drain_until<F, W, X>(&self, consumer: F, wait: W, exit: X)
    where
        F: FnMut(T),
        W: WaitStrategy,
        X: ExitCondition;

    /// Offer supplied elements until an implementation-defined bound.
    /// Unsupported by the strict MPMC ring.
    fn fill<S: FnMut() -> T>(&self, supplier: S) -> Result<usize, QueueError>;

    /// Offer exactly `limit` supplied elements. Unsupported by the strict
    /// MPMC ring.
    fn fill_up_to<S: FnMut() -> T>(&self, limit: usize, supplier: S) -> Result<usize, QueueError>;

    /// Fill until `exit` stops the loop. Unsupported by the strict MPMC ring.
    fn fill_until<S, W, X>(&self, supplier: S, wait: W, exit: X) -> Result<(), QueueError>
    where
        S: FnMut() -> T,
        W: WaitStrategy,
        X: ExitCondition;
}

/// Monotone index snapshots for progress monitoring, offered by the
/// index-based queues only.
pub trait QueueProgress {
    /// Total offers that have reserved a slot since construction.
    fn current_producer_index(&self) -> u64;

    /// Total polls that have claimed a slot since construction.
    fn current_consumer_index(&self) -> u64;
}
