use instant::{Duration, Instant};

/// Frame timing: the delta since the previous frame and the time since start.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

/// One tick of the [`FrameClock`], in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    pub delta: f32,
    pub elapsed: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now }
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let delta = now.saturating_duration_since(self.last);
        self.last = now;
        FrameTime {
            delta: delta.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.last.saturating_duration_since(self.start)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn ticks_measure_delta_and_elapsed() {
        let mut clock = FrameClock::new();
        let start = clock.start;
        let first = clock.tick_at(start + Duration::from_millis(16));
        assert_relative_eq!(first.delta, 0.016, epsilon = 1e-6);
        assert_relative_eq!(first.elapsed, 0.016, epsilon = 1e-6);

        let second = clock.tick_at(start + Duration::from_millis(50));
        assert_relative_eq!(second.delta, 0.034, epsilon = 1e-6);
        assert_relative_eq!(second.elapsed, 0.05, epsilon = 1e-6);
        assert_eq!(clock.elapsed(), Duration::from_millis(50));
    }
}
