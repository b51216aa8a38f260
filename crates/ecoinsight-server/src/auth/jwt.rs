use anyhow::{anyhow, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed 1-hour token lifetime.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Token payload: user id and role, verified with the server-held secret.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn encode_jwt(secret: &str, user_id: Uuid, role: &str) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!("encode_jwt: {}", e))
}

/// Decode and validate a token (signature + expiry).
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| anyhow!("decode_jwt: {}", e))?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trips() {
        let id = Uuid::new_v4();
        let token = encode_jwt(SECRET, id, "user").unwrap();
        let claims = decode_jwt(&token, SECRET).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.role, "user");
        assert!(claims.exp - claims.iat == TOKEN_TTL_SECS);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = encode_jwt(SECRET, Uuid::new_v4(), "user").unwrap();
        assert!(decode_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Forge a token whose exp is well past the default leeway.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: "user".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(decode_jwt(&token, SECRET).is_err());
    }
}
