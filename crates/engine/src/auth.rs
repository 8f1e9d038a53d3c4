//! Password hashing and JSON Web Tokens.
//!
//! Passwords are stored as `sha256$<salt>$<digest>` where the digest is the
//! base64url SHA-256 of `salt || password`.
//!
//! Tokens are HS256 JWTs (via `jsonwebtoken`) carrying `{ "iss": <user id>, "exp": <unix seconds> }`:
//!
//! - access tokens are signed with the user's stored password hash, so changing
//!   the password revokes them;
//! - refresh tokens are signed with the server secret.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, User};

const HASH_SCHEME: &str = "sha256";

/// Token signing settings.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub secret_key: String,
    pub access_ttl: TimeDelta,
    pub refresh_ttl: TimeDelta,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            access_ttl: TimeDelta::minutes(5),
            refresh_ttl: TimeDelta::hours(1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the user the token was issued to.
    pub iss: i64,
    /// Expiration as unix seconds.
    pub exp: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn unauthorized(reason: &str) -> EngineError {
    EngineError::Unauthorized(reason.to_string())
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = password_digest(&salt, password);
    format!("{HASH_SCHEME}${salt}${digest}")
}

/// Check `password` against a value produced by [`hash_password`].
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let computed = password_digest(salt, password);
    computed.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn token_error(err: jsonwebtoken::errors::Error) -> EngineError {
    match err.kind() {
        ErrorKind::ExpiredSignature => unauthorized("token expired"),
        ErrorKind::InvalidSignature => unauthorized("invalid token signature"),
        ErrorKind::InvalidAlgorithm => unauthorized("unsupported token algorithm"),
        _ => unauthorized("malformed token"),
    }
}

/// Sign `claims` into a compact HS256 token.
pub fn sign(claims: &Claims, key: &[u8]) -> ResultEngine<String> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(key),
    )
    .map_err(|_| unauthorized("invalid token claims"))
}

/// Read the claims without checking the signature.
///
/// Only used to find which key the token must be verified with.
pub fn decode_unverified(token: &str) -> ResultEngine<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(token_error)
}

/// Verify signature and expiration, returning the claims.
pub fn verify(token: &str, key: &[u8], now: DateTime<Utc>) -> ResultEngine<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let claims = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(key), &validation)
        .map(|data| data.claims)
        .map_err(token_error)?;
    if claims.exp <= now.timestamp() {
        return Err(unauthorized("token expired"));
    }
    Ok(claims)
}

/// Issue a fresh access/refresh pair for `user`.
pub fn issue_tokens(user: &User, config: &AuthConfig, now: DateTime<Utc>) -> ResultEngine<TokenPair> {
    let access = Claims {
        iss: user.id,
        exp: (now + config.access_ttl).timestamp(),
    };
    let refresh = Claims {
        iss: user.id,
        exp: (now + config.refresh_ttl).timestamp(),
    };

    Ok(TokenPair {
        access_token: sign(&access, user.password.as_bytes())?,
        refresh_token: sign(&refresh, config.secret_key.as_bytes())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(password: &str) -> User {
        User {
            id: 7,
            username: "shop".to_string(),
            password: hash_password(password),
            first_name: None,
            last_name: None,
            email: None,
            phone_number: None,
            check_symbols: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let stored = hash_password("s3cret");
        assert!(stored.starts_with("sha256$"));
        assert!(verify_password("s3cret", &stored));
        assert!(!verify_password("S3cret", &stored));
        assert!(!verify_password("s3cret", "plain-text"));
    }

    #[test]
    fn same_password_gets_different_salts() {
        assert_ne!(hash_password("x"), hash_password("x"));
    }

    #[test]
    fn signed_token_verifies_with_same_key() {
        let now = Utc::now();
        let claims = Claims {
            iss: 1,
            exp: now.timestamp() + 60,
        };
        let token = sign(&claims, b"key").unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(verify(&token, b"key", now).unwrap(), claims);
        assert_eq!(decode_unverified(&token).unwrap(), claims);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let now = Utc::now();
        let token = sign(
            &Claims {
                iss: 1,
                exp: now.timestamp() + 60,
            },
            b"key",
        )
        .unwrap();
        assert_eq!(
            verify(&token, b"other", now),
            Err(EngineError::Unauthorized(
                "invalid token signature".to_string()
            ))
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let token = sign(
            &Claims {
                iss: 1,
                exp: now.timestamp() - 1,
            },
            b"key",
        )
        .unwrap();
        assert_eq!(
            verify(&token, b"key", now),
            Err(EngineError::Unauthorized("token expired".to_string()))
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let now = Utc::now();
        let token = sign(
            &Claims {
                iss: 1,
                exp: now.timestamp() + 60,
            },
            b"key",
        )
        .unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"iss":2,"exp":{}}}"#,
            now.timestamp() + 60
        ));
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged_payload;
        assert!(verify(&parts.join("."), b"key", now).is_err());
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let now = Utc::now();
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &Claims {
                iss: 1,
                exp: now.timestamp() + 60,
            },
            &EncodingKey::from_secret(b"key"),
        )
        .unwrap();
        assert_eq!(
            verify(&token, b"key", now),
            Err(EngineError::Unauthorized(
                "unsupported token algorithm".to_string()
            ))
        );
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let now = Utc::now();
        assert!(verify("not-a-token", b"key", now).is_err());
        assert!(verify("a.b.c.d", b"key", now).is_err());
        assert!(decode_unverified("a.b.c").is_err());
    }

    #[test]
    fn issued_access_token_is_bound_to_password_hash() {
        let now = Utc::now();
        let user = user("pw");
        let config = AuthConfig {
            secret_key: "secret".to_string(),
            ..AuthConfig::default()
        };
        let pair = issue_tokens(&user, &config, now).unwrap();

        assert_eq!(
            verify(&pair.access_token, user.password.as_bytes(), now)
                .unwrap()
                .iss,
            7
        );
        assert!(verify(&pair.access_token, b"secret", now).is_err());
        assert!(verify(&pair.refresh_token, b"secret", now).is_ok());

        let later = now + TimeDelta::minutes(6);
        assert!(verify(&pair.access_token, user.password.as_bytes(), later).is_err());
        assert!(verify(&pair.refresh_token, b"secret", later).is_ok());
    }
}
