//! JWT Token Handler
//! Mission: Issue and verify signed, time-limited identity tokens

use crate::auth::models::Claims;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use tracing::debug;

/// Fixed token lifetime.
pub const TOKEN_LIFETIME_HOURS: i64 = 12;

/// Returned for every verification failure: bad signature, malformed token, expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidToken;

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid or expired token")
    }
}

impl std::error::Error for InvalidToken {}

/// JWT Handler for token operations
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl JwtHandler {
    /// Create a new JWT handler with secret key. Blank secrets are rejected.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.trim().is_empty() {
            anyhow::bail!("Token signing secret is empty");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against the caller-supplied instant in `verify_at`.
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime: Duration::hours(TOKEN_LIFETIME_HOURS),
        })
    }

    /// Lifetime of issued tokens in seconds.
    pub fn expires_in(&self) -> i64 {
        self.lifetime.num_seconds()
    }

    /// Issue a token for `email`, valid for twelve hours from now.
    pub fn issue(&self, email: &str) -> Result<String> {
        self.issue_at(email, Utc::now())
    }

    pub fn issue_at(&self, email: &str, now: DateTime<Utc>) -> Result<String> {
        let expiration = now
            .checked_add_signed(self.lifetime)
            .context("Invalid timestamp")?;

        let claims = Claims {
            email: email.to_string(),
            iat: unix_seconds(now),
            exp: unix_seconds(expiration),
        };

        debug!(email = %claims.email, exp = claims.exp, "Issuing identity token");

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to generate JWT")
    }

    /// Verify signature, structure and expiry against the wall clock.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, InvalidToken> {
        let decoded =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                debug!(error = %e, "Rejected token");
                InvalidToken
            })?;

        if unix_seconds(now) >= decoded.claims.exp {
            debug!(email = %decoded.claims.email, "Rejected expired token");
            return Err(InvalidToken);
        }

        Ok(decoded.claims)
    }
}

fn unix_seconds(at: DateTime<Utc>) -> usize {
    at.timestamp().max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_blank_secret_rejected() {
        assert!(JwtHandler::new("").is_err());
        assert!(JwtHandler::new("   ").is_err());
    }

    #[test]
    fn test_jwt_issue_and_verify() {
        let handler = JwtHandler::new("test-secret-key-12345").unwrap();

        let token = handler.issue("a@b.com").unwrap();
        assert!(!token.is_empty());

        let claims = handler.verify(&token).unwrap();
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.exp - claims.iat, 12 * 3600);
        assert_eq!(handler.expires_in(), 12 * 3600);
    }

    #[test]
    fn test_token_valid_just_before_expiry() {
        let handler = JwtHandler::new("test-secret-key-12345").unwrap();
        let t = issued_at();
        let token = handler.issue_at("a@b.com", t).unwrap();

        let claims = handler
            .verify_at(&token, t + Duration::hours(11) + Duration::minutes(59))
            .unwrap();
        assert_eq!(claims.email, "a@b.com");
    }

    #[test]
    fn test_token_rejected_after_expiry() {
        let handler = JwtHandler::new("test-secret-key-12345").unwrap();
        let t = issued_at();
        let token = handler.issue_at("a@b.com", t).unwrap();

        let result = handler.verify_at(&token, t + Duration::hours(12) + Duration::minutes(1));
        assert_eq!(result, Err(InvalidToken));

        // Expiry instant itself is already past the lifetime.
        let result = handler.verify_at(&token, t + Duration::hours(12));
        assert_eq!(result, Err(InvalidToken));
    }

    #[test]
    fn test_invalid_token_rejected() {
        let handler = JwtHandler::new("test-secret-key-12345").unwrap();

        assert_eq!(handler.verify("invalid.token.here"), Err(InvalidToken));
        assert_eq!(handler.verify(""), Err(InvalidToken));
    }

    #[test]
    fn test_different_secrets_reject() {
        let handler1 = JwtHandler::new("secret1").unwrap();
        let handler2 = JwtHandler::new("secret2").unwrap();

        let token = handler1.issue("a@b.com").unwrap();

        assert_eq!(handler2.verify(&token), Err(InvalidToken));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let handler = JwtHandler::new("test-secret-key-12345").unwrap();
        let token = handler.issue("a@b.com").unwrap();
        let other = handler.issue("root@b.com").unwrap();

        // Splice the payload of one token onto the signature of another.
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(handler.verify(&forged), Err(InvalidToken));
    }
}
