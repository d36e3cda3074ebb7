use crate::invariants::{
    debug_assert_bounded_count, debug_assert_index_order, debug_assert_slot_residue,
};
use crate::pad::CachePadded;
use crate::queue::{ExitCondition, MessagePassing, QueueError, QueueProgress, WaitStrategy};
use crate::{Config, Metrics, MetricsSnapshot};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{fence, AtomicU64, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// Bounded MPMC ring with a per-slot sequence protocol (Vyukov's bounded MPMC
// queue). Two monotone 64-bit counters, `producer_index` and `consumer_index`,
// are claimed by CAS; each slot carries its own sequence number that encodes
// which round of the ring it belongs to and whether it is empty or full:
//
//     empty for round n:  seq == n * capacity + i        (slot i)
//     full for round n:   seq == n * capacity + i + 1
//
// A producer may claim index p only after observing seq == p on slot
// `p & mask`; a consumer may claim index c only after observing seq == c + 1.
// Ownership of a slot therefore rotates producer -> consumer -> producer
// without any global lock.
//
// ## Memory ordering protocol
//
// **Producer (offer):**
// 1. Load `producer_index` with Acquire
// 2. Load the slot sequence with Acquire (pairs with the consumer's recycle
//    publish, so the slot is known drained before we write it)
// 3. CAS `producer_index` with AcqRel on success (the claim)
// 4. Write the element (plain store - the claim made us the sole writer)
// 5. Store the sequence = p + 1 with Release (publishes the element)
//
// **Consumer (poll):**
// 1. Load `consumer_index` with Acquire
// 2. Load the slot sequence with Acquire (pairs with the producer's publish,
//    so the element write is visible before we read it)
// 3. CAS `consumer_index` with AcqRel on success (the claim)
// 4. Move the element out (plain read - the claim made us the sole reader)
// 5. Store the sequence = c + capacity with Release (recycles the slot)
//
// A failed CAS means another producer/consumer claimed the index, which is
// global progress: the loops are lock-free though not wait-free per thread.
//
// ## Strict vs relaxed
//
// Observing `delta = seq - expected < 0` means the opposing side has not
// released the slot: the queue may be full (offer) or empty (poll), or the
// release is merely in flight. Strict variants confirm against a cached and
// then freshly reloaded opposing index before reporting full/empty, which
// makes "offer fails iff full" and "poll is None iff empty" hold at the
// confirmation load. Relaxed variants report on the first observation and may
// be spuriously negative under contention.
//
// =============================================================================

/// One ring slot: the element cell and the sequence that gates access to it.
///
/// The array-of-structs layout keeps a slot's sequence and payload on the
/// same cache line, which is the locality the original Vyukov formulation
/// asks for.
struct Slot<T> {
    seq: AtomicU64,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Bounded lock-free multi-producer multi-consumer queue.
///
/// Any number of threads may call any method concurrently. Strict
/// [`offer`](MpmcRing::offer)/[`poll`](MpmcRing::poll) honor exact full/empty
/// semantics; the `relaxed_*` variants trade those laws for fewer loads.
///
/// Capacity is fixed at construction and rounded up to a power of two.
#[repr(C)]
pub struct MpmcRing<T> {
    // === PRODUCER HOT === (128-byte aligned)
    producer_index: CachePadded<AtomicU64>,

    // === CONSUMER HOT === (128-byte aligned)
    consumer_index: CachePadded<AtomicU64>,

    // === READ-MOSTLY === (slot storage is its own allocation, so the hot
    // counters never share a line with slot data)
    slots: Box<[Slot<T>]>,
    mask: u64,

    // === COLD ===
    metrics: Metrics,
}

// Safety: elements move across threads through the slots; the sequence
// protocol serializes every slot access as documented above.
unsafe impl<T: Send> Send for MpmcRing<T> {}
unsafe impl<T: Send> Sync for MpmcRing<T> {}

impl<T> MpmcRing<T> {
    /// Creates a ring from a validated [`Config`].
    pub fn new(config: Config) -> Self {
        let capacity = config.capacity();
        let slots = (0..capacity as u64)
            .map(|i| Slot {
                seq: AtomicU64::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect::<Box<[Slot<T>]>>();

        Self {
            producer_index: CachePadded::new(AtomicU64::new(0)),
            consumer_index: CachePadded::new(AtomicU64::new(0)),
            slots,
            mask: config.mask(),
            metrics: Metrics::new(),
        }
    }

    /// Creates a ring holding at least `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<Self, QueueError> {
        Ok(Self::new(Config::new(capacity)?))
    }

    /// Returns the actual (power-of-two) capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        (self.mask + 1) as usize
    }

    #[inline]
    fn slot(&self, index: u64) -> &Slot<T> {
        &self.slots[(index & self.mask) as usize]
    }

    /// Enqueue an element; `Err(element)` hands it back when the ring is
    /// full. Fails only when the ring is actually full at the confirmation
    /// load of the consumer index.
    pub fn offer(&self, element: T) -> Result<(), T> {
        let capacity = self.capacity() as i64;
        // Stale snapshot of the consumer index; reloaded at most once per
        // full-looking observation.
        let mut c_index = i64::MAX;
        let claimed = loop {
            let p = self.producer_index.load(Ordering::Acquire);
            let seq = self.slot(p).seq.load(Ordering::Acquire);
            debug_assert_slot_residue!(seq, p, self.mask);
            let delta = seq as i64 - p as i64;

            if delta == 0 {
                // Slot is empty for this round; claim the index.
                if self
                    .producer_index
                    .compare_exchange(p, p + 1, Ordering::AcqRel, Ordering::Relaxed)
                    .is_ok()
                {
                    break p;
                }
                // Lost the claim to another producer, retry.
            } else if delta < 0 {
                // The consumer one lap behind has not recycled the slot;
                // confirm fullness against the cached then the fresh index.
                if p as i64 - capacity <= c_index {
                    c_index = self.consumer_index.load(Ordering::Acquire) as i64;
                    if p as i64 - capacity <= c_index {
                        return Err(element);
                    }
                }
            }
            // delta > 0: another producer already published this index, retry.
        };

        self.write_and_publish(claimed, element);
        Ok(())
    }

    /// Like [`offer`](MpmcRing::offer) but reports full on the first
    /// unreleased-slot observation, which may be spurious under contention.
    pub fn relaxed_offer(&self, element: T) -> Result<(), T> {
        let claimed = loop {
            let p = self.producer_index.load(Ordering::Acquire);
            let seq = self.slot(p).seq.load(Ordering::Acquire);
            debug_assert_slot_residue!(seq, p, self.mask);
            let delta = seq as i64 - p as i64;

            if delta == 0 {
                if self
                    .producer_index
                    .compare_exchange(p, p + 1, Ordering::AcqRel, Ordering::Relaxed)
                    .is_ok()
                {
                    break p;
                }
            } else if delta < 0 {
                return Err(element);
            }
        };

        self.write_and_publish(claimed, element);
        Ok(())
    }

    #[inline]
    fn write_and_publish(&self, index: u64, element: T) {
        let slot = self.slot(index);
        // SAFETY: the index CAS made this thread the sole owner of the slot
        // until the sequence publish below; no consumer reads the cell before
        // observing seq == index + 1.
        unsafe { (*slot.value.get()).write(element) };
        slot.seq.store(index + 1, Ordering::Release);
    }

    /// Dequeue the oldest element. Returns `None` only when the ring is
    /// actually empty at the confirmation load of the producer index.
    pub fn poll(&self) -> Option<T> {
        // Stale snapshot of the producer index; reloaded at most once per
        // empty-looking observation.
        let mut p_index: i64 = -1;
        let claimed = loop {
            let c = self.consumer_index.load(Ordering::Acquire);
            let seq = self.slot(c).seq.load(Ordering::Acquire);
            debug_assert_slot_residue!(seq, c, self.mask);
            let delta = seq as i64 - (c as i64 + 1);

            if delta == 0 {
                // Slot holds the element for this index; claim it.
                if self
                    .consumer_index
                    .compare_exchange(c, c + 1, Ordering::AcqRel, Ordering::Relaxed)
                    .is_ok()
                {
                    break c;
                }
                // Lost the claim to another consumer, retry.
            } else if delta < 0 {
                // Not yet filled; only report empty once a fresh producer
                // index confirms nothing is outstanding.
                if c as i64 >= p_index {
                    p_index = self.producer_index.load(Ordering::Acquire) as i64;
                    if c as i64 == p_index {
                        return None;
                    }
                }
            }
            // delta > 0: another consumer already recycled this index, retry.
        };

        Some(self.take_and_recycle(claimed))
    }

    /// Like [`poll`](MpmcRing::poll) but reports empty on the first
    /// unfilled-slot observation, which may be spurious under contention.
    pub fn relaxed_poll(&self) -> Option<T> {
        let claimed = loop {
            let c = self.consumer_index.load(Ordering::Acquire);
            let seq = self.slot(c).seq.load(Ordering::Acquire);
            debug_assert_slot_residue!(seq, c, self.mask);
            let delta = seq as i64 - (c as i64 + 1);

            if delta == 0 {
                if self
                    .consumer_index
                    .compare_exchange(c, c + 1, Ordering::AcqRel, Ordering::Relaxed)
                    .is_ok()
                {
                    break c;
                }
            } else if delta < 0 {
                return None;
            }
        };

        Some(self.take_and_recycle(claimed))
    }

    #[inline]
    fn take_and_recycle(&self, index: u64) -> T {
        let slot = self.slot(index);
        // SAFETY: seq == index + 1 was observed with Acquire before the claim,
        // so the producer's element write happens-before this read, and the
        // claim CAS made this thread the sole reader. Moving the bytes out
        // leaves the cell logically uninitialized until the producer one lap
        // ahead rewrites it.
        let element = unsafe { (*slot.value.get()).assume_init_read() };
        slot.seq.store(index + self.mask + 1, Ordering::Release);
        element
    }

    /// Copy of the oldest element without removing it. Returns `None` only
    /// when the ring is empty; retries while other consumers race it.
    pub fn peek(&self) -> Option<T>
    where
        T: Copy,
    {
        loop {
            let c = self.consumer_index.load(Ordering::Acquire);
            let slot = self.slot(c);
            let seq = slot.seq.load(Ordering::Acquire);
            let delta = seq as i64 - (c as i64 + 1);

            if delta == 0 {
                if let Some(element) = self.read_validated(slot, seq) {
                    return Some(element);
                }
                // The slot was recycled mid-copy, retry.
            } else if delta < 0 {
                if self.producer_index.load(Ordering::Acquire) == c {
                    return None;
                }
                // An offer is in flight, retry.
            }
            // delta > 0: our consumer index was stale, retry.
        }
    }

    /// Single-attempt peek; may return `None` even when elements are present.
    pub fn relaxed_peek(&self) -> Option<T>
    where
        T: Copy,
    {
        let c = self.consumer_index.load(Ordering::Acquire);
        let slot = self.slot(c);
        let seq = slot.seq.load(Ordering::Acquire);
        if seq == c.wrapping_add(1) {
            self.read_validated(slot, seq)
        } else {
            None
        }
    }

    /// Copy the slot and confirm the sequence did not move, seqlock style.
    /// Sequences are monotonic, so an unchanged value proves the slot was not
    /// recycled while the bytes were read.
    fn read_validated(&self, slot: &Slot<T>, expected_seq: u64) -> Option<T>
    where
        T: Copy,
    {
        // SAFETY: seq == index + 1 was observed, so the cell was initialized
        // by the producer that published it. The copy may race with a later
        // round's rewrite; the re-check below discards any such read before
        // the bytes are interpreted as a value.
        let copied = unsafe { ptr::read_volatile(slot.value.get()) };
        fence(Ordering::Acquire);
        if slot.seq.load(Ordering::Relaxed) == expected_seq {
            // SAFETY: validated above.
            Some(unsafe { copied.assume_init() })
        } else {
            None
        }
    }

    /// Number of elements in the ring, in `[0, capacity]`.
    ///
    /// A thread can be rescheduled between the two index reads, so the
    /// consumer index is read before and after the producer index and the
    /// pass is retried until it is stable. Reading the consumer first makes
    /// concurrent activity over-estimate rather than under-estimate.
    pub fn size(&self) -> usize {
        let mut after = self.consumer_index.load(Ordering::Acquire);
        loop {
            let before = after;
            let p = self.producer_index.load(Ordering::Acquire);
            after = self.consumer_index.load(Ordering::Acquire);
            if before == after {
                debug_assert_index_order!(after, p);
                debug_assert_bounded_count!(p, after, self.mask + 1);
                return (p - after) as usize;
            }
        }
    }

    /// Conservative emptiness test.
    ///
    /// The consumer index is loaded first so producer increments that land
    /// in between read as non-empty, never the reverse.
    pub fn is_empty(&self) -> bool {
        self.consumer_index.load(Ordering::Acquire) == self.producer_index.load(Ordering::Acquire)
    }

    /// Monotone snapshot of total slot reservations by producers.
    #[inline]
    pub fn current_producer_index(&self) -> u64 {
        self.producer_index.load(Ordering::Acquire)
    }

    /// Monotone snapshot of total slot claims by consumers.
    #[inline]
    pub fn current_consumer_index(&self) -> u64 {
        self.consumer_index.load(Ordering::Acquire)
    }

    /// Drain up to one capacity's worth of elements into `consumer`.
    pub fn drain<F: FnMut(T)>(&self, consumer: F) -> usize {
        self.drain_up_to(self.capacity(), consumer)
    }

    /// Poll at most `limit` elements into `consumer`, stopping early on the
    /// first empty-looking observation. Returns the number delivered.
    pub fn drain_up_to<F: FnMut(T)>(&self, limit: usize, mut consumer: F) -> usize {
        let mut count = 0;
        while count < limit {
            match self.relaxed_poll() {
                Some(element) => {
                    count += 1;
                    consumer(element);
                }
                None => break,
            }
        }
        self.metrics.add_drained(count as u64);
        count
    }

    /// Drain until `exit` stops the loop, idling through `wait` whenever the
    /// ring looks empty.
    pub fn drain_until<F, W, X>(&self, mut consumer: F, mut wait: W, exit: X)
    where
        F: FnMut(T),
        W: WaitStrategy,
        X: ExitCondition,
    {
        let mut idle_count = 0;
        let mut delivered: u64 = 0;
        while exit.keep_running() {
            match self.relaxed_poll() {
                Some(element) => {
                    idle_count = 0;
                    delivered += 1;
                    consumer(element);
                }
                None => idle_count = wait.idle(idle_count),
            }
        }
        self.metrics.add_drained(delivered);
    }

    /// Get a snapshot of the bulk-operation counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl<T> Drop for MpmcRing<T> {
    fn drop(&mut self) {
        // Exclusive access: every claim has completed, so exactly the
        // elements between the two indices are initialized.
        let c = self.consumer_index.load(Ordering::Relaxed);
        let p = self.producer_index.load(Ordering::Relaxed);
        for index in c..p {
            let slot = self.slot(index);
            unsafe {
                ptr::drop_in_place((*slot.value.get()).as_mut_ptr());
            }
        }
    }
}

impl<T> MessagePassing<T> for MpmcRing<T> {
    #[inline]
    fn capacity(&self) -> Option<usize> {
        Some(MpmcRing::capacity(self))
    }

    #[inline]
    fn size(&self) -> usize {
        MpmcRing::size(self)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        MpmcRing::is_empty(self)
    }

    #[inline]
    fn offer(&self, element: T) -> Result<(), T> {
        MpmcRing::offer(self, element)
    }

    #[inline]
    fn relaxed_offer(&self, element: T) -> Result<(), T> {
        MpmcRing::relaxed_offer(self, element)
    }

    #[inline]
    fn poll(&self) -> Option<T> {
        MpmcRing::poll(self)
    }

    #[inline]
    fn relaxed_poll(&self) -> Option<T> {
        MpmcRing::relaxed_poll(self)
    }

    #[inline]
    fn peek(&self) -> Option<T>
    where
        T: Copy,
    {
        MpmcRing::peek(self)
    }

    #[inline]
    fn relaxed_peek(&self) -> Option<T>
    where
        T: Copy,
    {
        MpmcRing::relaxed_peek(self)
    }

    fn drain<F: FnMut(T)>(&self, consumer: F) -> usize {
        MpmcRing::drain(self, consumer)
    }

    fn drain_up_to<F: FnMut(T)>(&self, limit: usize, consumer: F) -> usize {
        MpmcRing::drain_up_to(self, limit, consumer)
    }

    fn drain_until<F, W, X>(&self, consumer: F, wait: W, exit: X)
    where
        F: FnMut(T),
        W: WaitStrategy,
        X: ExitCondition,
    {
        MpmcRing::drain_until(self, consumer, wait, exit)
    }

    /// A failed inner offer would discard an already-supplied element, so
    /// bulk fill is rejected rather than given lossy semantics.
    fn fill<S: FnMut() -> T>(&self, _supplier: S) -> Result<usize, QueueError> {
        Err(QueueError::Unsupported { op: "fill" })
    }

    fn fill_up_to<S: FnMut() -> T>(&self, _limit: usize, _supplier: S) -> Result<usize, QueueError> {
        Err(QueueError::Unsupported { op: "fill_up_to" })
    }

    fn fill_until<S, W, X>(&self, _supplier: S, _wait: W, _exit: X) -> Result<(), QueueError>
    where
        S: FnMut() -> T,
        W: WaitStrategy,
        X: ExitCondition,
    {
        Err(QueueError::Unsupported { op: "fill_until" })
    }
}

impl<T> QueueProgress for MpmcRing<T> {
    #[inline]
    fn current_producer_index(&self) -> u64 {
        MpmcRing::current_producer_index(self)
    }

    #[inline]
    fn current_consumer_index(&self) -> u64 {
        MpmcRing::current_consumer_index(self)
    }
}
