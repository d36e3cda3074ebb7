use crate::queue::WaitStrategy;
use std::hint;
use std::thread;

/// Adaptive backoff strategy (Crossbeam-style).
///
/// Progressively increases wait time: spin with PAUSE → yield to OS → give up.
#[derive(Debug)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // 2^6 = 64 spins max before yielding
    const YIELD_LIMIT: u32 = 10; // Then give up

    /// Creates a new backoff instance.
    #[inline]
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Light spin with PAUSE hints.
    #[inline]
    pub fn spin(&mut self) {
        let spins = 1 << self.step.min(Self::SPIN_LIMIT);
        for _ in 0..spins {
            hint::spin_loop();
        }
        if self.step <= Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Heavier backoff: spin then yield.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            self.spin();
        } else {
            thread::yield_now();
            if self.step <= Self::YIELD_LIMIT {
                self.step += 1;
            }
        }
    }

    /// Check if we've exhausted patience.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.step > Self::YIELD_LIMIT
    }

    /// Reset for next wait cycle.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// The idle counter restarting at zero signals that the queue made progress
/// since the last idle call, so the progression starts over.
impl WaitStrategy for Backoff {
    #[inline]
    fn idle(&mut self, idle_count: u64) -> u64 {
        if idle_count == 0 {
            self.reset();
        }
        self.snooze();
        idle_count + 1
    }
}

/// Busy-spin strategy: a PAUSE hint per idle iteration, lowest latency,
/// highest CPU burn.
#[derive(Debug, Default)]
pub struct SpinWait;

impl WaitStrategy for SpinWait {
    #[inline]
    fn idle(&mut self, idle_count: u64) -> u64 {
        hint::spin_loop();
        idle_count + 1
    }
}

/// Spin briefly, then hand the core back to the OS on every iteration.
#[derive(Debug)]
pub struct YieldWait {
    spin_iterations: u64,
}

impl YieldWait {
    pub const fn new(spin_iterations: u64) -> Self {
        Self { spin_iterations }
    }
}

impl Default for YieldWait {
    fn default() -> Self {
        Self::new(64)
    }
}

impl WaitStrategy for YieldWait {
    #[inline]
    fn idle(&mut self, idle_count: u64) -> u64 {
        if idle_count < self.spin_iterations {
            hint::spin_loop();
        } else {
            thread::yield_now();
        }
        idle_count + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let mut b = Backoff::new();

        // Should start at step 0
        assert_eq!(b.step, 0);

        // Spin should increment
        b.spin();
        assert!(b.step > 0);

        // Should eventually complete
        while !b.is_completed() {
            b.snooze();
        }
        assert!(b.step > Backoff::YIELD_LIMIT);

        // Reset
        b.reset();
        assert_eq!(b.step, 0);
    }

    #[test]
    fn test_backoff_as_wait_strategy() {
        let mut b = Backoff::new();
        let mut count = 0;
        for _ in 0..3 {
            count = b.idle(count);
        }
        assert_eq!(count, 3);
        assert!(b.step > 0);

        // A restarted counter resets the progression.
        let step_before = b.step;
        b.idle(0);
        assert!(b.step <= step_before);
    }

    #[test]
    fn test_stateless_strategies_count() {
        let mut spin = SpinWait;
        assert_eq!(spin.idle(0), 1);
        assert_eq!(spin.idle(1), 2);

        let mut yield_wait = YieldWait::new(1);
        assert_eq!(yield_wait.idle(0), 1);
        assert_eq!(yield_wait.idle(1), 2); // past the spin threshold, yields
    }
}
