// src/auth/jwt.rs
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Claims carried by the bearer token. Token issuance happens in the auth
/// service; this backend only verifies and extracts the tenant context.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub org_id: Uuid,
    pub role: String,
    #[serde(default)]
    pub is_primary: bool,
    pub exp: usize,
    pub iat: usize,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|d| d.claims)
    .map_err(|e| AppError::unauthorized(format!("Invalid or expired token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims_expiring_in(hours: i64) -> Claims {
        let now = Utc::now();
        Claims {
            sub: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            role: "staff".to_string(),
            is_primary: false,
            exp: (now + Duration::hours(hours)).timestamp() as usize,
            iat: now.timestamp() as usize,
        }
    }

    #[test]
    fn verify_roundtrip_preserves_org_context() {
        let claims = claims_expiring_in(1);
        let token = sign(&claims, "secret");
        let decoded = verify_token(&token, "secret").unwrap();
        assert_eq!(decoded.org_id, claims.org_id);
        assert_eq!(decoded.role, "staff");
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = sign(&claims_expiring_in(1), "secret");
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let token = sign(&claims_expiring_in(-1), "secret");
        assert!(verify_token(&token, "secret").is_err());
    }
}
