use crate::{
    model::{
        Id,
        user::{UserCredentials, UserMarker, Username},
    },
    util::PositiveDuration,
};
use argon2::{
    Argon2,
    password_hash::{self, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Clone, Debug, Error)]
#[error("Hashing password failed: {0}")]
pub struct PasswordHashError(#[from] password_hash::Error);

/// An argon2 hash in PHC string format.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn generate(password: &str) -> Result<Self, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;

        Ok(Self(hash.to_string()))
    }

    /// Wraps a hash read back from storage.
    #[must_use]
    pub fn from_phc_string(phc: String) -> Self {
        Self(phc)
    }

    #[must_use]
    pub fn as_phc_str(&self) -> &str {
        &self.0
    }

    /// A malformed stored hash never verifies.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        password_hash::PasswordHash::new(&self.0).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

impl Debug for PasswordHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PasswordHash").field(&"[redacted]").finish()
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session token could not be signed: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("Session token was rejected: {0}")]
    Verify(#[source] jsonwebtoken::errors::Error),
}

/// Payload of a session token.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: Id<UserMarker>,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys for session tokens, derived from one secret.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: PositiveDuration,
}

impl SessionKeys {
    #[must_use]
    pub fn new(secret: &[u8], lifetime: PositiveDuration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            lifetime,
        }
    }

    #[must_use]
    pub fn lifetime(&self) -> PositiveDuration {
        self.lifetime
    }

    pub fn issue(
        &self,
        user_id: Id<UserMarker>,
        username: &Username,
    ) -> Result<String, SessionError> {
        self.issue_at(user_id, username, UtcDateTime::now())
    }

    pub fn issue_at(
        &self,
        user_id: Id<UserMarker>,
        username: &Username,
        issued_at: UtcDateTime,
    ) -> Result<String, SessionError> {
        let claims = SessionClaims {
            id: user_id,
            username: username.get().to_owned(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + self.lifetime.get()).unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(SessionError::Sign)
    }

    /// Checks signature and expiry and returns the decoded claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(SessionError::Verify)
    }
}

impl Debug for SessionKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("secret", &"[redacted]")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Debug for LoginRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: Username,
    pub name: Option<String>,
}

impl LoginResponse {
    #[must_use]
    pub fn new(token: String, credentials: UserCredentials) -> Self {
        Self {
            token,
            username: credentials.username,
            name: credentials.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            Id,
            auth::{PasswordHash, SessionError, SessionKeys},
            user::Username,
        },
        util::PositiveDuration,
    };
    use time::{Duration, UtcDateTime};

    fn keys(secret: &str) -> SessionKeys {
        SessionKeys::new(secret.as_bytes(), PositiveDuration::from_seconds(3600).unwrap())
    }

    fn username() -> Username {
        Username::new("mluukkai".to_owned()).unwrap()
    }

    #[test]
    fn password_round_trip() {
        let hash = PasswordHash::generate("salainen").unwrap();

        assert!(hash.as_phc_str().starts_with("$argon2"));
        assert!(hash.verify("salainen"));
        assert!(!hash.verify("salainen2"));
        assert!(!PasswordHash::from_phc_string("garbage".to_owned()).verify("salainen"));
    }

    #[test]
    fn password_hash_debug_is_redacted() {
        let hash = PasswordHash::generate("salainen").unwrap();
        assert!(!format!("{hash:?}").contains(hash.as_phc_str()));
    }

    #[test]
    fn issued_token_verifies() {
        let keys = keys("secret");
        let token = keys.issue(Id::from(42_u64), &username()).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.id, Id::from(42_u64));
        assert_eq!(claims.username, "mluukkai");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = keys("secret").issue(Id::from(42_u64), &username()).unwrap();

        assert!(matches!(
            keys("another secret").verify(&token),
            Err(SessionError::Verify(_))
        ));
        assert!(keys("secret").verify("not.a.token").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys("secret");
        let issued_at = UtcDateTime::now() - Duration::hours(2);
        let token = keys.issue_at(Id::from(42_u64), &username(), issued_at).unwrap();

        assert!(matches!(keys.verify(&token), Err(SessionError::Verify(_))));
    }
}
