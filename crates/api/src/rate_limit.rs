//! A minimal in-process token-bucket-by-sliding-window guard on
//! `place_bid`, grounded in the teacher's `security::RateLimiter`
//! (`HashMap<String, Vec<Instant>>`, retained over a trailing window).
//! Request-level rate limiting for the rest of the surface is out of
//! scope; this one guard exists because §1 calls it out explicitly.

use dashmap::DashMap;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

pub struct RateLimiter {
    requests: DashMap<String, Vec<Instant>>,
    limit_per_minute: u32,
}

impl RateLimiter {
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            requests: DashMap::new(),
            limit_per_minute,
        }
    }

    /// `true` if `client_id` has not yet exceeded the limit within the
    /// trailing minute; records the attempt either way it counts.
    pub fn is_allowed(&self, client_id: &str) -> bool {
        let now = Instant::now();
        let cutoff = now - WINDOW;
        let mut entry = self.requests.entry(client_id.to_string()).or_default();
        entry.retain(|&t| t > cutoff);

        if entry.len() < self.limit_per_minute as usize {
            entry.push(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.is_allowed("alice"));
        assert!(limiter.is_allowed("alice"));
        assert!(!limiter.is_allowed("alice"));
    }

    #[test]
    fn clients_are_tracked_independently() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.is_allowed("alice"));
        assert!(limiter.is_allowed("bob"));
    }
}
