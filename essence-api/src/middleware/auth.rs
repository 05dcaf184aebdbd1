use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

impl AdminClaims {
    pub fn is_admin(&self) -> bool {
        self.role == "ADMIN" || self.role == "SUPER_ADMIN"
    }
}

/// Decodes and validates a bearer token. The role is not checked here.
pub fn decode_claims(secret: &str, token: &str) -> Result<AdminClaims, AppError> {
    decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))
}

/// The bearer token of the `Authorization` header, if it carries one.
/// Other schemes and non-ASCII values yield `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// True when `token` is a valid token carrying an admin role.
pub fn is_admin_token(secret: &str, token: &str) -> bool {
    decode_claims(secret, token).is_ok_and(|claims| claims.is_admin())
}

// ============================================================================
// Admin Authentication Middleware
// ============================================================================

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract token
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    // 2. Decode JWT
    let claims = decode_claims(&state.auth.secret, token)?;

    // 3. Check role is ADMIN or SUPER_ADMIN
    if !claims.is_admin() {
        return Err(AppError::AuthorizationError("Admin role required".to_string()));
    }

    // 4. Inject claims
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(role: &str, secret: &str) -> String {
        let claims = AdminClaims {
            sub: "admin-1".to_string(),
            email: None,
            role: role.to_string(),
            exp: 4_102_444_800,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_admin_roles() {
        assert!(is_admin_token("s3cret", &token("ADMIN", "s3cret")));
        assert!(is_admin_token("s3cret", &token("SUPER_ADMIN", "s3cret")));
        assert!(!is_admin_token("s3cret", &token("CUSTOMER", "s3cret")));
    }

    #[test]
    fn test_bearer_token_ignores_other_schemes() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        assert!(matches!(
            decode_claims("s3cret", &token("ADMIN", "other")),
            Err(AppError::AuthenticationError(_))
        ));
        assert!(!is_admin_token("s3cret", "not-a-jwt"));
    }
}
