/// Elapsed-time stopwatch driven by frame deltas.
///
/// The host hands every frame's delta to [`advance`](Self::advance), so a
/// stopped timer costs nothing and tests can step time deterministically.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    elapsed: f32,
    running: bool,
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarts the timer from zero.
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.running = true;
    }

    /// Freezes the timer, keeping the elapsed time readable.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Adds `dt` seconds when running. Negative deltas are ignored.
    pub fn advance(&mut self, dt: f32) {
        if self.running && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds accumulated since the last [`start`](Self::start).
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Returns `true` once a running timer has gone past `expiry` seconds.
    #[inline]
    #[must_use]
    pub fn has_expired(&self, expiry: f32) -> bool {
        self.running && self.elapsed > expiry
    }
}

#[cfg(test)]
mod tests {
    use super::Timer;

    #[test]
    fn stopped_timer_ignores_deltas() {
        let mut timer = Timer::new();
        timer.advance(1.0);
        assert_eq!(timer.elapsed(), 0.0);
        assert!(!timer.has_expired(0.0));
    }

    #[test]
    fn expiry_is_strictly_greater() {
        let mut timer = Timer::new();
        timer.start();
        assert!(!timer.has_expired(0.0));
        timer.advance(0.25);
        assert!(timer.has_expired(0.2));
        assert!(!timer.has_expired(0.25));
    }
}
