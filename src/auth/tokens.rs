// Signed, expiring tokens for email verification and sessions

use crate::core::errors::IdentityError;
use crate::core::models::{IssuedEmailToken, SessionToken};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ISSUER: &str = "volunchain-identity";

/// Validity horizon of an email verification token
pub const EMAIL_TOKEN_TTL_HOURS: i64 = 24;

/// Validity horizon of a session token
pub const SESSION_TOKEN_TTL_HOURS: i64 = 1;

/// Claims carried by an email verification token
///
/// `jti` makes every reissue distinct even within the same second.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailClaims {
    iss: String,
    email: String,
    jti: String,
    iat: i64,
    exp: i64,
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionClaims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &Secret<String>) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }
}

/// Issues and validates HS256 tokens
///
/// Email and session tokens are signed with separate secrets, so one kind
/// can never be replayed as the other.
pub struct TokenService {
    email_keys: SigningKeys,
    session_keys: SigningKeys,
    email_ttl: Duration,
    session_ttl: Duration,
    validation: Validation,
}

impl TokenService {
    pub fn new(email_secret: &Secret<String>, session_secret: &Secret<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Self {
            email_keys: SigningKeys::from_secret(email_secret),
            session_keys: SigningKeys::from_secret(session_secret),
            email_ttl: Duration::hours(EMAIL_TOKEN_TTL_HOURS),
            session_ttl: Duration::hours(SESSION_TOKEN_TTL_HOURS),
            validation,
        }
    }

    /// Override the validity horizons (tests and tooling)
    pub fn with_lifetimes(mut self, email_ttl: Duration, session_ttl: Duration) -> Self {
        self.email_ttl = email_ttl;
        self.session_ttl = session_ttl;
        self
    }

    /// Sign a verification claim for `email`
    ///
    /// The returned `expires_at` equals the token's own `exp` claim and is
    /// meant to be persisted next to the token.
    pub fn issue_email_token(&self, email: &str) -> Result<IssuedEmailToken, IdentityError> {
        let now = Utc::now();
        let expires_at = now + self.email_ttl;
        let claims = EmailClaims {
            iss: ISSUER.to_string(),
            email: email.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.email_keys.encoding)
            .map_err(|e| IdentityError::Internal(format!("Failed to sign email token: {}", e)))?;

        Ok(IssuedEmailToken {
            token,
            expires_at: truncate_to_seconds(expires_at),
        })
    }

    /// Validate a verification token and return the email it was issued for
    pub fn verify_email_token(&self, token: &str) -> Result<String, IdentityError> {
        let data = decode::<EmailClaims>(token, &self.email_keys.decoding, &self.validation)
            .map_err(map_jwt_error)?;
        Ok(data.claims.email)
    }

    /// Sign a session claim bound to `account_id`
    pub fn issue_session_token(&self, account_id: Uuid) -> Result<SessionToken, IdentityError> {
        let now = Utc::now();
        let expires_at = now + self.session_ttl;
        let claims = SessionClaims {
            iss: ISSUER.to_string(),
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.session_keys.encoding)
            .map_err(|e| IdentityError::Internal(format!("Failed to sign session token: {}", e)))?;

        Ok(SessionToken {
            token,
            expires_at: truncate_to_seconds(expires_at),
        })
    }

    /// Validate a session token and return its subject
    pub fn verify_session_token(&self, token: &str) -> Result<Uuid, IdentityError> {
        let data = decode::<SessionClaims>(token, &self.session_keys.decoding, &self.validation)
            .map_err(map_jwt_error)?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| IdentityError::InvalidToken)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> IdentityError {
    match err.kind() {
        ErrorKind::ExpiredSignature => IdentityError::Expired,
        _ => IdentityError::InvalidToken,
    }
}

// Claims carry whole seconds; keep the persisted horizon identical to `exp`.
fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}
