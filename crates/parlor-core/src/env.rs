//! Environment abstraction for deterministic testing.
//!
//! Decouples drivers from system resources (wall clock, randomness) so tests
//! can pin the time stamped on messages.

use std::time::SystemTime;

/// Abstract environment providing time and randomness.
///
/// Production uses the system clock and OS entropy; tests use a fixed clock
/// and a counter.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time.
    fn wall_clock(&self) -> SystemTime;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
