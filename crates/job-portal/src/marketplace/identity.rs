//! Password credentials and signed identity assertions.
//!
//! Hashing is delegated to bcrypt and assertions are HS256 JWTs carrying the account id and
//! role. Assertions are stateless: there is no revocation list, only natural expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::domain::{AccountId, Role};
use crate::config::AuthConfig;

/// Verified identity of the party making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub account_id: AccountId,
    pub role: Role,
}

impl Caller {
    pub const fn new(account_id: AccountId, role: Role) -> Self {
        Self { account_id, role }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AssertionClaims {
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
}

/// A freshly signed assertion and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedAssertion {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Error raised by the hashing or signing primitives themselves.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("assertion signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("assertion lifetime runs past the representable time range")]
    ExpiryOutOfRange,
}

/// Reason a presented assertion was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssertionRejection {
    #[error("assertion expired")]
    Expired,
    #[error("assertion invalid: {0}")]
    Invalid(String),
}

/// bcrypt wrapper holding the configured work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        Ok(bcrypt::verify(password, hash)?)
    }
}

/// Issues and verifies time-bounded assertions of `(account id, role)`.
pub struct AssertionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl AssertionIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        // Out-of-range lifetimes saturate here and are rejected when an assertion is issued.
        let ttl = Duration::try_hours(config.token_ttl_hours).unwrap_or(Duration::MAX);
        Self::new(&config.jwt_secret, ttl)
    }

    pub fn issue(&self, caller: Caller) -> Result<IssuedAssertion, CredentialError> {
        self.issue_at(caller, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        caller: Caller,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedAssertion, CredentialError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or(CredentialError::ExpiryOutOfRange)?;
        let claims = AssertionClaims {
            sub: caller.account_id.0.to_string(),
            role: caller.role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(CredentialError::Signing)?;

        Ok(IssuedAssertion { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Caller, AssertionRejection> {
        let data = decode::<AssertionClaims>(token, &self.decoding, &self.validation).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => AssertionRejection::Expired,
                other => AssertionRejection::Invalid(format!("{other:?}")),
            },
        )?;

        let account_id = data
            .claims
            .sub
            .parse::<u64>()
            .map(AccountId)
            .map_err(|_| AssertionRejection::Invalid("subject is not an account id".to_string()))?;

        Ok(Caller::new(account_id, data.claims.role))
    }
}
