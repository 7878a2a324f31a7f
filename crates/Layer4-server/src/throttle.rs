//! In-process sliding-window request throttle
//!
//! Per-client request caps enforced before dispatch: a short burst window
//! and a longer hourly window. State lives only in this process; the
//! orchestration core below stays stateless per invocation.

use lumina_foundation::Error;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// One sliding window limit
#[derive(Debug, Clone, Copy)]
pub struct ThrottleWindow {
    pub window: Duration,
    pub max_requests: usize,
    pub name: &'static str,
}

/// Default limits: 5 requests per minute, 60 per hour
pub const DEFAULT_WINDOWS: &[ThrottleWindow] = &[
    ThrottleWindow {
        window: Duration::from_secs(60),
        max_requests: 5,
        name: "burst",
    },
    ThrottleWindow {
        window: Duration::from_secs(3600),
        max_requests: 60,
        name: "hourly",
    },
];

/// Rejection detail for a throttled request
#[derive(Debug, Clone, Copy)]
pub struct ThrottleExceeded {
    pub window: &'static str,
    pub wait_secs: u64,
}

impl From<ThrottleExceeded> for Error {
    fn from(e: ThrottleExceeded) -> Self {
        Error::RateLimited(format!(
            "Usage limit reached ({} window). Please wait {}s before exploring more.",
            e.window, e.wait_secs
        ))
    }
}

/// Sliding-window throttle over per-client request timestamps
pub struct RequestThrottle {
    windows: Vec<ThrottleWindow>,
    log: Mutex<HashMap<String, Vec<Instant>>>,
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestThrottle {
    pub fn new() -> Self {
        Self::with_windows(DEFAULT_WINDOWS.to_vec())
    }

    pub fn with_windows(windows: Vec<ThrottleWindow>) -> Self {
        Self {
            windows,
            log: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject one request from the given client
    pub fn check(&self, client: &str) -> Result<(), ThrottleExceeded> {
        let now = Instant::now();
        let max_window = self
            .windows
            .iter()
            .map(|w| w.window)
            .max()
            .unwrap_or(Duration::ZERO);

        let mut log = self.log.lock();
        let entries = log.entry(client.to_string()).or_default();

        // Timestamps older than the largest window can never matter again
        entries.retain(|t| now.duration_since(*t) < max_window);

        for limit in &self.windows {
            let in_window: Vec<Instant> = entries
                .iter()
                .copied()
                .filter(|t| now.duration_since(*t) < limit.window)
                .collect();

            if in_window.len() >= limit.max_requests {
                let oldest = in_window.iter().min().copied().unwrap_or(now);
                let wait = limit.window.saturating_sub(now.duration_since(oldest));
                return Err(ThrottleExceeded {
                    window: limit.name,
                    wait_secs: wait.as_secs().max(1),
                });
            }
        }

        entries.push(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_window_admits_then_rejects() {
        let throttle = RequestThrottle::new();

        for _ in 0..5 {
            throttle.check("client-a").expect("burst budget should admit");
        }

        let rejection = throttle.check("client-a").unwrap_err();
        assert_eq!(rejection.window, "burst");
        assert!(rejection.wait_secs >= 1);
    }

    #[test]
    fn test_clients_are_independent() {
        let throttle = RequestThrottle::new();

        for _ in 0..5 {
            throttle.check("client-a").unwrap();
        }
        assert!(throttle.check("client-a").is_err());
        assert!(throttle.check("client-b").is_ok());
    }

    #[test]
    fn test_rejection_converts_to_rate_limited_error() {
        let throttle = RequestThrottle::with_windows(vec![ThrottleWindow {
            window: Duration::from_secs(60),
            max_requests: 1,
            name: "burst",
        }]);

        throttle.check("client-a").unwrap();
        let err: Error = throttle.check("client-a").unwrap_err().into();
        assert!(err.is_transient());
        assert!(err.to_string().contains("wait"));
    }
}
