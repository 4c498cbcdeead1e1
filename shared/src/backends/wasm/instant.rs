use std::time::Duration;

/// Represents a specific moment in time
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Instant {
    millis: f64,
}

impl Instant {
    /// Creates an Instant from the moment the method is called
    pub fn now() -> Self {
        Self {
            millis: js_sys::Date::now(),
        }
    }

    /// Returns time elapsed since the Instant
    pub fn elapsed(&self) -> Duration {
        Self::now().duration_since(self)
    }

    /// Returns time elapsed from an earlier Instant, or zero if `earlier` is later
    pub fn duration_since(&self, earlier: &Instant) -> Duration {
        let millis = (self.millis - earlier.millis).max(0.0);
        Duration::from_micros((millis * 1000.0) as u64)
    }
}
