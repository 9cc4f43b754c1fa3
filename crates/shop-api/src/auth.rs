//! # Bearer Authentication
//!
//! HS256 JWTs carrying `{sub, admin, exp}`. Tokens are issued by the
//! accounts service; this layer only validates them.

use crate::handlers::{ApiError, ErrorResponse};
use crate::state::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shop_core::Actor;
use tracing::debug;

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    #[serde(default)]
    pub admin: bool,
    /// Expiry (seconds since the epoch)
    pub exp: usize,
}

/// The authenticated caller, extracted from `Authorization: Bearer <jwt>`
#[derive(Debug, Clone)]
pub struct AuthUser(pub Actor);

impl AuthUser {
    pub fn actor(&self) -> &Actor {
        &self.0
    }
}

/// Sign claims with `secret`
pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate a token and return its claims
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

fn unauthorized(message: &str) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(message, "unauthorized", 401)),
    )
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| unauthorized("Missing bearer token"))?;

        let claims = decode_token(token, &state.config.jwt_secret).map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => unauthorized("Token expired"),
                _ => unauthorized("Invalid token"),
            }
        })?;

        Ok(AuthUser(Actor {
            user_id: claims.sub,
            is_admin: claims.admin,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp: usize) -> Claims {
        Claims {
            sub: "u1".to_string(),
            admin: true,
            exp,
        }
    }

    fn future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_token_roundtrip() {
        let token = encode_token(&claims(future()), "secret").unwrap();
        let decoded = decode_token(&token, "secret").unwrap();
        assert_eq!(decoded.sub, "u1");
        assert!(decoded.admin);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = encode_token(&claims(future()), "secret").unwrap();
        assert!(decode_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let past = (chrono::Utc::now().timestamp() - 3600) as usize;
        let token = encode_token(&claims(past), "secret").unwrap();
        let err = decode_token(&token, "secret").unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }
}
