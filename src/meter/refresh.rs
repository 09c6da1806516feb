//! Display refresh rate derived from animation-frame callbacks.

use std::time::Duration;

use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(1);

/// Counts animation frames per wall-clock second.
#[derive(Debug, Clone)]
pub struct RefreshRateCounter {
    window_start: Instant,
    frames: u32,
    rate_hz: u32,
}

impl RefreshRateCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            rate_hz: 0,
        }
    }

    /// Records one animation frame, returning the new rate when a window closes.
    pub fn on_frame(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        if now.duration_since(self.window_start) >= WINDOW {
            self.rate_hz = self.frames;
            self.frames = 0;
            self.window_start = now;
            Some(self.rate_hz)
        } else {
            None
        }
    }

    pub fn rate_hz(&self) -> u32 {
        self.rate_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_frames_per_second() {
        let start = Instant::now();
        let mut counter = RefreshRateCounter::new(start);
        let step = Duration::from_micros(16_667);
        let mut published = None;
        for index in 1..=60 {
            published = published.or(counter.on_frame(start + step * index));
        }
        assert_eq!(published, Some(60));
        assert_eq!(counter.rate_hz(), 60);
    }

    #[test]
    fn rate_is_zero_until_first_window_closes() {
        let start = Instant::now();
        let mut counter = RefreshRateCounter::new(start);
        assert_eq!(counter.on_frame(start + Duration::from_millis(10)), None);
        assert_eq!(counter.rate_hz(), 0);
    }
}
