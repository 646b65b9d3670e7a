//! Small pieces shared by `coordinator` and `lifecycle` so neither
//! reimplements lock-acquire-or-transient-error and store-error mapping.

use crate::deps::CoordinatorDeps;
use auction_domain::CoreError;
use auction_lock::{LockToken, DEFAULT_HOLD_TTL, DEFAULT_WAIT_BUDGET};
use auction_store::StoreError;

pub async fn acquire_or_transient(deps: &CoordinatorDeps, key: &str) -> Result<LockToken, CoreError> {
    deps.lock
        .acquire(key, DEFAULT_WAIT_BUDGET, DEFAULT_HOLD_TTL)
        .await
        .map_err(|err| CoreError::Transient(err.to_string()))?
        .ok_or_else(|| CoreError::Transient("server busy, retry".to_string()))
}

pub fn map_store_err(err: StoreError) -> CoreError {
    match err {
        StoreError::Conflict => CoreError::Conflict,
        other => {
            tracing::warn!("store error mapped to CoreError::Internal: {other}");
            CoreError::Internal
        }
    }
}
