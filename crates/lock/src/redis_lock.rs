//! Redis-backed lock: `SET key token NX PX hold_ttl` to acquire, and a
//! Lua script that only deletes the key if it still holds our token to
//! release. The Lua script makes the compare-and-delete atomic, which a
//! bare `GET` + `DEL` pair would not be.

use crate::{LockError, LockService, LockToken, ACQUIRE_POLL_INTERVAL};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, Script};
use std::time::{Duration, Instant};
use uuid::Uuid;

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Distributed mutex over a shared Redis instance, safe across every
/// horizontally scaled API replica.
pub struct RedisLock {
    conn: ConnectionManager,
    release_script: Script,
}

impl RedisLock {
    /// Connect to `redis_url` eagerly so configuration errors surface at
    /// startup rather than on the first bid.
    pub async fn connect(redis_url: &str) -> Result<Self, LockError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| LockError::BackendUnavailable(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| LockError::BackendUnavailable(e.to_string()))?;
        Ok(Self {
            conn,
            release_script: Script::new(RELEASE_SCRIPT),
        })
    }

    fn key(auction_id: &str) -> String {
        format!("auction-lock:{auction_id}")
    }
}

#[async_trait]
impl LockService for RedisLock {
    async fn acquire(
        &self,
        auction_id: &str,
        wait_budget: Duration,
        hold_ttl: Duration,
    ) -> Result<Option<LockToken>, LockError> {
        let key = Self::key(auction_id);
        let deadline = Instant::now() + wait_budget;
        let mut conn = self.conn.clone();

        loop {
            let token_value = Uuid::new_v4();
            let set: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(token_value.to_string())
                .arg("NX")
                .arg("PX")
                .arg(hold_ttl.as_millis() as u64)
                .query_async(&mut conn)
                .await
                .map_err(|e| LockError::BackendUnavailable(e.to_string()))?;

            if set.is_some() {
                return Ok(Some(LockToken(token_value)));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(ACQUIRE_POLL_INTERVAL).await;
        }
    }

    async fn release(&self, auction_id: &str, token: LockToken) {
        let key = Self::key(auction_id);
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<i64> = self
            .release_script
            .key(key)
            .arg(token.0.to_string())
            .invoke_async(&mut conn)
            .await;

        if let Err(err) = result {
            tracing::warn!(%auction_id, %err, "failed to release redis lock; it will expire via TTL");
        }
    }
}
