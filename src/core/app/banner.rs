use std::time::{Duration, Instant};

/// Transient error strip. A newer error replaces the current one and
/// restarts the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    pub expires_at: Instant,
}

impl ErrorBanner {
    pub fn new(message: impl Into<String>, now: Instant, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_ttl() {
        let now = Instant::now();
        let banner = ErrorBanner::new("boom", now, Duration::from_secs(5));
        assert!(!banner.is_expired(now + Duration::from_millis(4999)));
        assert!(banner.is_expired(now + Duration::from_secs(5)));
    }
}
