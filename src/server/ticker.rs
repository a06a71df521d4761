//! The tick scheduler's bookkeeping.

use std::collections::VecDeque;
use std::time::Duration;

/// How many recent tick durations feed the average.
const SAMPLE_WINDOW: usize = 64;

/// Run state and timing of the simulation ticker.
#[derive(Debug, Clone)]
pub struct Ticker {
    running: bool,
    interval: Duration,
    samples: VecDeque<Duration>,
}

impl Ticker {
    /// Create a stopped ticker that targets `frequency` ticks per second.
    pub fn new(frequency: u32) -> Self {
        Self {
            running: false,
            interval: interval_for(frequency),
            samples: VecDeque::with_capacity(SAMPLE_WINDOW),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Target time between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_frequency(&mut self, frequency: u32) {
        self.interval = interval_for(frequency);
    }

    /// Record how long one tick took.
    pub fn record(&mut self, elapsed: Duration) {
        if self.samples.len() == SAMPLE_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(elapsed);
    }

    /// Average of the recorded tick durations, in milliseconds.
    pub fn average_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: Duration = self.samples.iter().sum();
        total.as_secs_f64() * 1000.0 / self.samples.len() as f64
    }
}

fn interval_for(frequency: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(frequency.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ticker_is_stopped() {
        let ticker = Ticker::new(25);
        assert!(!ticker.is_running());
        assert_eq!(ticker.interval(), Duration::from_millis(40));
    }

    #[test]
    fn zero_frequency_is_clamped() {
        let ticker = Ticker::new(0);
        assert_eq!(ticker.interval(), Duration::from_secs(1));
    }

    #[test]
    fn average_over_samples() {
        let mut ticker = Ticker::new(25);
        assert_eq!(ticker.average_ms(), 0.0);
        ticker.record(Duration::from_millis(2));
        ticker.record(Duration::from_millis(4));
        assert!((ticker.average_ms() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn window_drops_oldest() {
        let mut ticker = Ticker::new(25);
        ticker.record(Duration::from_millis(1000));
        for _ in 0..SAMPLE_WINDOW {
            ticker.record(Duration::from_millis(1));
        }
        assert!((ticker.average_ms() - 1.0).abs() < 1e-9);
    }
}
