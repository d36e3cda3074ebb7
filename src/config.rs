use crate::QueueError;

/// Minimum capacity a bounded queue will accept.
pub const MIN_CAPACITY: usize = 2;

/// Configuration for bounded queues.
///
/// Capacity is validated at construction and rounded up to the next power of
/// two so slot lookup is a mask instead of a modulo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    capacity: usize,
}

impl Config {
    /// Creates a configuration for at least `requested` elements.
    ///
    /// Fails with [`QueueError::InvalidCapacity`] when `requested` is below
    /// [`MIN_CAPACITY`].
    pub fn new(requested: usize) -> Result<Self, QueueError> {
        if requested < MIN_CAPACITY {
            return Err(QueueError::InvalidCapacity { requested });
        }
        Ok(Self {
            capacity: requested.next_power_of_two(),
        })
    }

    /// Returns the actual (power-of-two) capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the mask for index wrapping.
    #[inline]
    pub const fn mask(&self) -> u64 {
        (self.capacity - 1) as u64
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}
