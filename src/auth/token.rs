//! Access token issuance and validation.
//!
//! Tokens are standard HS256 JWTs carrying `{sub, brand, iat, exp}`. The
//! service is stateless: there is no revocation list, a token's lifetime is
//! bounded by its `exp` claim alone.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Internal validation failure taxonomy. Callers collapse every variant to a
/// single external "invalid or expired token" response (see `errors.rs`).
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,

    #[error("signature verification failed")]
    BadSignature,

    #[error("missing claim '{0}'")]
    MissingClaim(&'static str),
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    sub: &'a str,
    brand: &'a str,
    iat: i64,
    exp: i64,
}

/// Wire-side claim set. `sub` and `brand` are decoded as optionals so their
/// absence is detected explicitly rather than surfacing as a parse error —
/// a signed token lacking either is rejected, never defaulted.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    brand: Option<String>,
    exp: Option<i64>,
}

/// Identity attached to a request once its bearer token has been validated.
#[derive(Debug, Clone, Serialize)]
pub struct AuthClaims {
    pub email: String,
    pub brand: String,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Issue a signed token for `email` scoped to `brand`.
    ///
    /// The brand claim is canonicalized to lower case at issuance and is
    /// immutable for the life of the token.
    pub fn issue(&self, email: &str, brand: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let brand = brand.to_lowercase();
        let claims = Claims {
            sub: email,
            brand: &brand,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Malformed)
    }

    /// Validate a bearer token and return its claims.
    ///
    /// Signature and expiry are always both checked; a token is valid
    /// strictly before its expiry instant and invalid from that instant on.
    pub fn validate(&self, token: &str) -> Result<AuthClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;

        let data = decode::<RawClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::MissingRequiredClaim(_) => TokenError::MissingClaim("exp"),
                _ => TokenError::Malformed,
            }
        })?;

        // `exp` is decoded as an optional so its absence is reported as a
        // missing claim rather than a deserialization failure.
        let exp = data.claims.exp.ok_or(TokenError::MissingClaim("exp"))?;

        // The library treats exp == now as still valid; the contract here is
        // strict — invalid from the expiry instant onward.
        if exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        let email = data.claims.sub.ok_or(TokenError::MissingClaim("sub"))?;
        let brand = data.claims.brand.ok_or(TokenError::MissingClaim("brand"))?;

        Ok(AuthClaims { email, brand })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 60)
    }

    #[test]
    fn issue_then_validate_roundtrip() {
        let svc = service();
        let token = svc.issue("user1@example.com", "audi").unwrap();
        let claims = svc.validate(&token).unwrap();
        assert_eq!(claims.email, "user1@example.com");
        assert_eq!(claims.brand, "audi");
    }

    #[test]
    fn brand_claim_is_canonicalized_at_issuance() {
        let svc = service();
        let token = svc.issue("user1@example.com", "AUDI").unwrap();
        assert_eq!(svc.validate(&token).unwrap().brand, "audi");
    }

    #[test]
    fn expired_token_is_rejected() {
        // Negative TTL puts exp in the past.
        let svc = TokenService::new("test-secret", -5);
        let token = svc.issue("user1@example.com", "audi").unwrap();
        assert!(matches!(svc.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = TokenService::new("other-secret", 60);
        let token = other.issue("user1@example.com", "audi").unwrap();
        assert!(matches!(
            service().validate(&token),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn garbage_token_is_malformed() {
        assert!(matches!(
            service().validate("not-a-jwt"),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn missing_brand_claim_is_rejected_even_with_valid_signature() {
        let exp = (Utc::now() + Duration::minutes(60)).timestamp();
        let payload = serde_json::json!({ "sub": "user1@example.com", "exp": exp });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            service().validate(&token),
            Err(TokenError::MissingClaim("brand"))
        ));
    }

    #[test]
    fn missing_sub_claim_is_rejected_even_with_valid_signature() {
        let exp = (Utc::now() + Duration::minutes(60)).timestamp();
        let payload = serde_json::json!({ "brand": "audi", "exp": exp });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            service().validate(&token),
            Err(TokenError::MissingClaim("sub"))
        ));
    }

    #[test]
    fn missing_exp_claim_is_rejected() {
        let payload = serde_json::json!({ "sub": "user1@example.com", "brand": "audi" });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            service().validate(&token),
            Err(TokenError::MissingClaim("exp"))
        ));
    }
}
