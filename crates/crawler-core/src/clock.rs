use std::time::Duration;

/// Source of wall-clock time and blocking sleeps
pub trait Clock {
    /// Current time in seconds since the Unix epoch
    fn now_epoch_secs(&self) -> i64;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Real clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
