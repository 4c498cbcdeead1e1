use std::time::Duration;

/// Represents a specific moment in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instant {
    inner: std::time::Instant,
}

impl Instant {
    /// Creates an Instant from the moment the method is called
    pub fn now() -> Self {
        Self {
            inner: std::time::Instant::now(),
        }
    }

    /// Returns time elapsed since the Instant
    pub fn elapsed(&self) -> Duration {
        self.inner.elapsed()
    }

    /// Returns time elapsed from an earlier Instant, or zero if `earlier` is later
    pub fn duration_since(&self, earlier: &Instant) -> Duration {
        self.inner.saturating_duration_since(earlier.inner)
    }
}
