//! Host timing capability.

use std::thread;
use std::time::Duration;

use audio_stream_core::traits::clock::Clock;

/// `Clock` backend over `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn delay_ms(&self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn delay_blocks_for_at_least_the_requested_time() {
        let start = Instant::now();
        SystemClock.delay_ms(5);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
