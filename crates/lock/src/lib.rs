//! The per-auction distributed mutex (C1).
//!
//! Two operations keyed by auction id: `acquire` returns an opaque owner
//! token if the caller became the sole holder within `wait_budget`;
//! `release` drops the lock only if the presented token still matches the
//! current holder, so a caller whose TTL already fired can never release a
//! lock someone else now legitimately holds.

mod in_process;
#[cfg(feature = "redis-backend")]
mod redis_lock;

pub use in_process::InProcessLock;
#[cfg(feature = "redis-backend")]
pub use redis_lock::RedisLock;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// An opaque handle proving ownership of a given auction's lock. Only the
/// holder that received this token can successfully release it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockToken(pub Uuid);

impl LockToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Failures the lock backend itself can surface. Acquire timeouts are not
/// an error — they are represented as `Ok(None)` — this enum is reserved
/// for backend connectivity problems.
#[derive(Error, Debug)]
pub enum LockError {
    #[error("lock backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// The distributed mutex contract every backend implements identically, so
/// the coordinator is oblivious to whether it is talking to Redis or to an
/// in-process fallback.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Attempt to become the sole holder of `auction_id`'s lock within
    /// `wait_budget`, retrying roughly every 10ms. On success the lock
    /// auto-expires after `hold_ttl` even if `release` is never called.
    async fn acquire(
        &self,
        auction_id: &str,
        wait_budget: Duration,
        hold_ttl: Duration,
    ) -> Result<Option<LockToken>, LockError>;

    /// Release `auction_id`'s lock if `token` still matches the current
    /// holder. A stale or absent holder is a silent no-op.
    async fn release(&self, auction_id: &str, token: LockToken);
}

/// The interval between acquire retries while waiting for a contended lock.
pub const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The recommended `wait_budget` for bid submission.
pub const DEFAULT_WAIT_BUDGET: Duration = Duration::from_secs(5);
/// The recommended `hold_ttl` for bid submission.
pub const DEFAULT_HOLD_TTL: Duration = Duration::from_secs(10);
