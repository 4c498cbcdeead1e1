use std::time::Duration;

use super::Instant;

/// A Timer with a given duration after which it will enter into a "Ringing"
/// state. The Timer can be reset at an given time, or manually set to start
/// "Ringing" again.
pub struct Timer {
    duration: Duration,
    last: Instant,
}

impl Timer {
    /// Creates a new Timer with a given duration
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            last: Instant::now(),
        }
    }

    /// Reset the Timer to stop ringing and wait till 'duration' has elapsed
    /// again
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Gets whether or not the Timer is "Ringing" (i.e. the given duration has
    /// elapsed since the last "reset")
    pub fn ringing(&self) -> bool {
        self.last.elapsed() >= self.duration
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
