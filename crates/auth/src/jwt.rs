//! HS256 access tokens.

use crate::error::{AuthError, AuthResult};
use auction_domain::UserId;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Lower bound on `AUTH_SIGNING_KEY`; shorter keys are rejected at startup.
pub const MIN_SIGNING_KEY_LEN: usize = 32;
/// Recommended access token lifetime.
pub const ACCESS_TOKEN_TTL: Duration = Duration::minutes(15);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> AuthResult<UserId> {
        self.sub
            .parse()
            .map_err(|_| AuthError::Token("malformed subject claim".into()))
    }
}

pub fn encode_access_token(
    user_id: UserId,
    email: &str,
    now: DateTime<Utc>,
    signing_key: &str,
    issuer: &str,
    audience: &str,
) -> AuthResult<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iss: issuer.to_string(),
        aud: audience.to_string(),
        iat: now.timestamp(),
        exp: (now + ACCESS_TOKEN_TTL).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key.as_bytes()),
    )
    .map_err(|err| AuthError::Token(err.to_string()))
}

pub fn decode_access_token(
    token: &str,
    signing_key: &str,
    issuer: &str,
    audience: &str,
) -> AuthResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    decode::<Claims>(token, &DecodingKey::from_secret(signing_key.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|err| AuthError::Token(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "a-signing-key-at-least-32-bytes!";

    #[test]
    fn encode_then_decode_round_trips() {
        let user_id = UserId::new();
        let now = Utc::now();
        let token = encode_access_token(user_id, "a@example.com", now, KEY, "bidup", "bidup-clients").unwrap();
        let claims = decode_access_token(&token, KEY, "bidup", "bidup-clients").unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "a@example.com");
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let user_id = UserId::new();
        let token = encode_access_token(user_id, "a@example.com", Utc::now(), KEY, "bidup", "bidup-clients").unwrap();
        assert!(decode_access_token(&token, KEY, "bidup", "someone-else").is_err());
    }
}
