use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::error::AppError;
use crate::models::auth::{AuthenticatedUser, Claims};

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header format".into()))?;

        let secret = parts
            .extensions
            .get::<JwtSecret>()
            .ok_or_else(|| AppError::Internal("JWT secret not configured".into()))?;

        decode_access_token(token, &secret.0)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))
    }
}

/// Extension type to carry the JWT secret through request extensions.
#[derive(Clone)]
pub struct JwtSecret(pub String);

pub fn decode_access_token(token: &str, secret: &str) -> Result<AuthenticatedUser, anyhow::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation)?;
    let claims = data.claims;

    Ok(AuthenticatedUser {
        user_id: claims.sub,
        role: claims.role,
        club_id: claims.club_id,
        ptso: claims.ptso.filter(|p| !p.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(role: &str, exp_offset: i64, secret: &str) -> String {
        let now = Utc::now().timestamp();
        let claims = serde_json::json!({
            "sub": "42",
            "role": role,
            "club_id": 7,
            "ptso": "BC",
            "iat": now,
            "exp": now + exp_offset,
        });
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn decodes_scoping_claims() {
        let user = decode_access_token(&token("club_admin", 600, SECRET), SECRET).unwrap();
        assert_eq!(user.user_id, "42");
        assert_eq!(user.role, Role::ClubAdmin);
        assert_eq!(user.club_id, Some(7));
        assert_eq!(user.ptso.as_deref(), Some("BC"));
    }

    #[test]
    fn accepts_legacy_guardian_role() {
        let user = decode_access_token(&token("guardian", 600, SECRET), SECRET).unwrap();
        assert_eq!(user.role, Role::Parent);
    }

    #[test]
    fn rejects_expired_and_foreign_tokens() {
        assert!(decode_access_token(&token("aca", -3600, SECRET), SECRET).is_err());
        assert!(decode_access_token(&token("aca", 600, "other"), SECRET).is_err());
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(decode_access_token(&token("super_admin", 600, SECRET), SECRET).is_err());
    }
}
