use log::info;
use std::time::Duration;

/// Spacing for calls against the external service quota. Every call waits
/// a fixed delay, and every `long_pause_every` calls take a longer pause.
/// This is the only place inter-call sleeps live; stages stay strictly
/// sequential.
pub struct Pacer {
    delay: Duration,
    long_pause_every: u64,
    long_pause: Duration,
    calls: u64,
}

impl Pacer {
    pub fn new(delay_ms: u64, long_pause_every: u64, long_pause_secs: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            long_pause_every,
            long_pause: Duration::from_secs(long_pause_secs),
            calls: 0,
        }
    }

    /// Record one completed external call and sleep accordingly.
    pub async fn pace(&mut self) {
        self.calls += 1;
        if self.long_pause_every > 0 && self.calls % self.long_pause_every == 0 {
            info!(
                "Rate limit protection: pausing {}s after {} calls",
                self.long_pause.as_secs(),
                self.calls
            );
            tokio::time::sleep(self.long_pause).await;
        } else if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_calls() {
        let mut pacer = Pacer::new(0, 50, 0);
        for _ in 0..3 {
            pacer.pace().await;
        }
        assert_eq!(pacer.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_pause_cadence() {
        let mut pacer = Pacer::new(10, 2, 1);
        let start = tokio::time::Instant::now();
        pacer.pace().await; // 10ms
        pacer.pace().await; // second call: 1s pause
        assert!(start.elapsed() >= Duration::from_millis(1010));
    }
}
