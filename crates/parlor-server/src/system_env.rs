//! Production [`Environment`] using the system clock and OS randomness.

use std::time::SystemTime;

use parlor_core::Environment;

/// Production environment.
///
/// Wall-clock time from [`SystemTime::now`]; randomness from getrandom, used
/// for session ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn wall_clock(&self) -> SystemTime {
        SystemTime::now()
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        // Session ids come from here; running without OS entropy is not an option.
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bytes_differ() {
        let env = SystemEnv::new();

        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        env.random_bytes(&mut a);
        env.random_bytes(&mut b);

        assert_ne!(a, b);
    }

    #[test]
    fn wall_clock_is_after_epoch() {
        let env = SystemEnv::new();
        assert!(env.wall_clock() > SystemTime::UNIX_EPOCH);
    }
}
