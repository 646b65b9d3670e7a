//! `Drop`-releasing guard around an acquired per-auction lock token.

use auction_lock::{LockService, LockToken};
use std::sync::Arc;

/// Guarantees `lock.release` runs on every exit path, including early `?`
/// returns and an unwinding panic. Callers on the happy path should prefer
/// [`LockGuard::release`] over letting the guard drop, since dropping can't
/// `.await` and instead fires the release from a detached task.
pub struct LockGuard {
    lock: Arc<dyn LockService>,
    auction_id: String,
    token: Option<LockToken>,
}

impl LockGuard {
    pub fn new(lock: Arc<dyn LockService>, auction_id: String, token: LockToken) -> Self {
        Self {
            lock,
            auction_id,
            token: Some(token),
        }
    }

    /// Release deterministically before the critical section's surrounding
    /// future returns.
    pub async fn release(mut self) {
        if let Some(token) = self.token.take() {
            self.lock.release(&self.auction_id, token).await;
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            let lock = self.lock.clone();
            let auction_id = std::mem::take(&mut self.auction_id);
            tokio::spawn(async move {
                lock.release(&auction_id, token).await;
            });
        }
    }
}
