// In-memory fixed-window rate limiter for credential endpoints.
//
// Keyed by client network address; the critical section is a single
// HashMap lookup-and-update guarded by a mutex, so contention stays O(1)
// regardless of how many distinct clients are tracked. A periodic sweep
// task drops windows that have expired so the map doesn't grow without
// bound.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::services::ids;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl RateLimitConfig {
    pub fn from_config() -> Self {
        let config = crate::app_config::config();
        Self {
            max_requests: config.rate_limit_max_requests,
            window_seconds: config.rate_limit_window_seconds,
        }
    }
}

#[derive(Debug)]
struct Window {
    started_at_ms: i64,
    count: u32,
}

pub struct RateLimitService {
    config: RateLimitConfig,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

#[derive(thiserror::Error, Debug)]
pub enum RateLimitError {
    #[error("rate limit exceeded")]
    Exceeded,
}

impl RateLimitService {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Checks and records one event for `addr`. Returns `Err` once the
    /// caller has exceeded `max_requests` within the current window.
    pub fn check(&self, addr: IpAddr) -> Result<(), RateLimitError> {
        let now = ids::now_millis();
        let window_ms = self.config.window_seconds as i64 * 1000;

        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let entry = windows.entry(addr).or_insert(Window {
            started_at_ms: now,
            count: 0,
        });

        if now - entry.started_at_ms >= window_ms {
            entry.started_at_ms = now;
            entry.count = 0;
        }

        if entry.count >= self.config.max_requests {
            return Err(RateLimitError::Exceeded);
        }

        entry.count += 1;
        Ok(())
    }

    /// Drop windows that closed more than one window-length ago. Run
    /// periodically from a background task; never run from the request
    /// path.
    pub fn sweep(&self) {
        let now = ids::now_millis();
        let window_ms = self.config.window_seconds as i64 * 1000;
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let before = windows.len();
        windows.retain(|_, w| now - w.started_at_ms < window_ms * 2);
        debug!(
            dropped = before.saturating_sub(windows.len()),
            remaining = windows.len(),
            "rate limiter sweep"
        );
    }
}

/// Spawns the periodic sweep task. Runs for the lifetime of the process;
/// there is no cancellation handle because the server has no graceful way
/// to stop background maintenance independent of process shutdown.
pub fn spawn_sweeper(service: std::sync::Arc<RateLimitService>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            service.sweep();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
    }

    #[test]
    fn test_allows_up_to_max_requests() {
        let service = RateLimitService::new(RateLimitConfig {
            max_requests: 3,
            window_seconds: 60,
        });

        assert!(service.check(addr()).is_ok());
        assert!(service.check(addr()).is_ok());
        assert!(service.check(addr()).is_ok());
        assert!(service.check(addr()).is_err());
    }

    #[test]
    fn test_distinct_addresses_tracked_independently() {
        let service = RateLimitService::new(RateLimitConfig {
            max_requests: 1,
            window_seconds: 60,
        });

        assert!(service.check(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1))).is_ok());
        assert!(service.check(IpAddr::V4(Ipv4Addr::new(2, 2, 2, 2))).is_ok());
        assert!(service.check(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1))).is_err());
    }
}
