//! Identity & Tokens (C6): registration, login, bearer access tokens, and
//! single-use rotating refresh tokens with family-based reuse detection.
//!
//! This crate owns its own persistence path (`AuthRepository`) rather than
//! depending on `auction-store`'s `BidStore`, even though the production
//! implementation shares the same Postgres pool and the `users` /
//! `refresh_tokens` tables migrated there.

mod error;
mod jwt;
mod memory;
mod password;
mod postgres;
mod repository;
mod service;

pub use error::{AuthError, AuthResult};
pub use jwt::{Claims, ACCESS_TOKEN_TTL, MIN_SIGNING_KEY_LEN};
pub use memory::InMemoryAuthRepository;
pub use postgres::PgAuthRepository;
pub use repository::{AuthRepository, RefreshToken, User};
pub use service::{AuthService, TokenPair, REFRESH_TOKEN_TTL};
