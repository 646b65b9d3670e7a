//! Error taxonomy shared by every layer above the transport.
//!
//! These are kinds, not transport-specific types: `auction-api` maps each
//! variant onto an HTTP status code, `auction-coordinator` maps store and
//! lock failures onto the same enum so callers never have to match on two
//! different error hierarchies.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias used throughout the domain and coordinator layers.
pub type CoreResult<T> = Result<T, CoreError>;

/// Taxonomy of failures a bid or lifecycle operation can produce.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Malformed input or a field that failed a structural rule.
    #[error("validation error: {0}")]
    Validation(String),

    /// An ordering, amount, or state rule was violated.
    #[error("{0}")]
    BusinessRule(String),

    /// The auction is not in `Active` status.
    #[error("auction is not active")]
    NotActive,

    /// `now >= auction.end_at`.
    #[error("auction has ended")]
    Ended,

    /// The bidder is the auction's seller.
    #[error("sellers may not bid on their own auction")]
    SelfBid,

    /// `amount` fell short of `min_required`.
    #[error("bid of {offered} is below the minimum required bid of {min_required}")]
    Insufficient {
        /// The amount the caller offered.
        offered: Decimal,
        /// The smallest amount that would have been accepted.
        min_required: Decimal,
    },

    /// Missing or invalid credentials.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The store detected a concurrent mutation of the target row.
    #[error("conflict: the auction changed while processing this request, please retry")]
    Conflict,

    /// The caller is submitting faster than the rate limit allows.
    #[error("rate limited: try again shortly")]
    RateLimited,

    /// A dependency (lock service, store) could not complete in time.
    #[error("server busy, please retry: {0}")]
    Transient(String),

    /// An unanticipated failure; never leaks internals to the caller.
    #[error("internal error")]
    Internal,
}

impl CoreError {
    /// Shorthand for a `NotFound` referring to a named entity and id.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id}"))
    }

    /// True when a client resubmitting the identical request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict | Self::Transient(_))
    }
}
