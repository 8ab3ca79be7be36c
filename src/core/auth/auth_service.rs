// Credential verifier - the single admin identity and its session tokens.
//
// Tokens are stateless HS256 JWTs carrying the admin email as subject.
// There is no revocation: a token is valid until it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    Unauthorized,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

// ============================================================================
// MODELS
// ============================================================================

/// The verified caller, attached to admin requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct AuthService {
    admin_email: String,
    admin_password: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl AuthService {
    pub fn new(admin_email: String, admin_password: String, secret: &str, ttl: Duration) -> Self {
        Self {
            admin_email,
            admin_password,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Exchange admin credentials for a session token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<String, AuthError> {
        // Both compared in full so timing reveals neither field
        let email_ok = email.as_bytes().ct_eq(self.admin_email.as_bytes());
        let password_ok = password.as_bytes().ct_eq(self.admin_password.as_bytes());
        if !bool::from(email_ok & password_ok) {
            tracing::warn!("Admin login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_at(Utc::now())?;
        tracing::info!("Admin logged in");
        Ok(token)
    }

    /// Check a presented token and return the identity it proves.
    pub fn verify(&self, token: &str) -> Result<AdminIdentity, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Unauthorized);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            AuthError::Unauthorized
        })?;

        if data.claims.sub != self.admin_email {
            tracing::warn!("Token subject does not match the admin identity");
            return Err(AuthError::Unauthorized);
        }

        Ok(AdminIdentity {
            email: data.claims.sub,
        })
    }

    fn issue_at(&self, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Signing("token lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: self.admin_email.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
