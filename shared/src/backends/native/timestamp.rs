use std::time::SystemTime;

use thiserror::Error;

/// Error type for timestamp operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    /// System time is before UNIX epoch
    #[error("System time is before UNIX epoch")]
    SystemTimeBeforeEpoch,
}

pub struct Timestamp;

impl Timestamp {
    /// Returns the current timestamp in seconds since UNIX epoch.
    ///
    /// # Errors
    /// Returns `TimeError::SystemTimeBeforeEpoch` if system time is before UNIX epoch.
    pub fn try_now() -> Result<u64, TimeError> {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|_| TimeError::SystemTimeBeforeEpoch)
    }

    /// Returns the current timestamp, or 0 when the clock is before the epoch
    pub fn now_or_zero() -> u64 {
        Self::try_now().unwrap_or(0)
    }
}
