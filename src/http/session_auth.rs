// Bearer session verification. The auth backend signs HS256 JWTs whose `sub`
// is the user id; handlers take `AuthUser` to require one.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::api_error::ApiError;
use super::app_state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

pub fn verify_session_token(token: &str, secret: &str) -> Result<SessionClaims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Session tokens carry the auth provider's audience; we only care who signed them.
    validation.validate_aud = false;

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| match err.kind() {
        ErrorKind::ExpiredSignature => {
            ApiError::new(StatusCode::UNAUTHORIZED, "SESSION_EXPIRED", "Session expired")
        }
        _ => unauthorized(format!("Invalid session token: {}", err)),
    })?;

    if data.claims.sub.trim().is_empty() {
        return Err(unauthorized("Session token has no subject"));
    }
    Ok(data.claims)
}

fn unauthorized(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| unauthorized("Missing bearer token"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Missing bearer token"))?;

        let claims = verify_session_token(token.trim(), &state.jwt_secret)?;
        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

/// Signs a session token the way the auth backend does. Test-only.
#[cfg(test)]
pub fn sign_session_token(user_id: &str, secret: &str, ttl_seconds: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let exp = chrono::Utc::now().timestamp() + ttl_seconds;
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp: exp.max(0) as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
