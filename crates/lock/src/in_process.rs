//! Single-process fallback, selected when `LOCK_BACKEND_ENABLED=false`.
//! Exposes the exact same [`LockService`] contract as the Redis backend so
//! the coordinator never needs to know which one it is talking to; this
//! generalizes the `Arc<RwLock<HashMap<ChainId, _>>>` per-key state pattern
//! used elsewhere in this codebase's ancestry from "one entry per chain" to
//! "one entry per auction".

use crate::{LockError, LockService, LockToken, ACQUIRE_POLL_INTERVAL};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Holder {
    token: LockToken,
    expires_at: Instant,
}

/// An in-memory, per-process mutex keyed by auction id. Safe to share via
/// `Arc` across every handler task in this process; provides no
/// cross-process exclusion, which is fine for local development and tests.
#[derive(Default)]
pub struct InProcessLock {
    entries: DashMap<String, Holder>,
}

impl InProcessLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_acquire_once(&self, key: &str, hold_ttl: Duration, now: Instant) -> Option<LockToken> {
        match self.entries.entry(key.to_string()) {
            MapEntry::Vacant(slot) => {
                let token = LockToken::new();
                slot.insert(Holder {
                    token,
                    expires_at: now + hold_ttl,
                });
                Some(token)
            }
            MapEntry::Occupied(mut slot) => {
                if slot.get().expires_at <= now {
                    let token = LockToken::new();
                    slot.insert(Holder {
                        token,
                        expires_at: now + hold_ttl,
                    });
                    Some(token)
                } else {
                    None
                }
            }
        }
    }
}

#[async_trait]
impl LockService for InProcessLock {
    async fn acquire(
        &self,
        auction_id: &str,
        wait_budget: Duration,
        hold_ttl: Duration,
    ) -> Result<Option<LockToken>, LockError> {
        let deadline = Instant::now() + wait_budget;
        loop {
            if let Some(token) = self.try_acquire_once(auction_id, hold_ttl, Instant::now()) {
                return Ok(Some(token));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(ACQUIRE_POLL_INTERVAL).await;
        }
    }

    async fn release(&self, auction_id: &str, token: LockToken) {
        self.entries
            .remove_if(auction_id, |_, holder| holder.token == token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_blocks_until_release() {
        let lock = InProcessLock::new();
        let t1 = lock
            .acquire("a1", Duration::from_secs(1), Duration::from_secs(10))
            .await
            .unwrap()
            .unwrap();

        let lock_ref = &lock;
        let acquired_second = tokio::select! {
            r = lock_ref.acquire("a1", Duration::from_millis(50), Duration::from_secs(10)) => r.unwrap(),
        };
        assert!(acquired_second.is_none());

        lock.release("a1", t1).await;
        let t2 = lock
            .acquire("a1", Duration::from_secs(1), Duration::from_secs(10))
            .await
            .unwrap();
        assert!(t2.is_some());
    }

    #[tokio::test]
    async fn release_with_wrong_token_is_noop() {
        let lock = InProcessLock::new();
        let t1 = lock
            .acquire("a1", Duration::from_secs(1), Duration::from_secs(10))
            .await
            .unwrap()
            .unwrap();
        lock.release("a1", LockToken::new()).await;

        // Still held by t1; a third party cannot acquire it.
        let blocked = lock
            .acquire("a1", Duration::from_millis(20), Duration::from_secs(10))
            .await
            .unwrap();
        assert!(blocked.is_none());
        lock.release("a1", t1).await;
    }

    #[tokio::test]
    async fn expired_hold_ttl_allows_reacquire() {
        let lock = InProcessLock::new();
        lock.acquire("a1", Duration::from_secs(1), Duration::from_millis(20))
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let reacquired = lock
            .acquire("a1", Duration::from_secs(1), Duration::from_secs(10))
            .await
            .unwrap();
        assert!(reacquired.is_some());
    }
}
