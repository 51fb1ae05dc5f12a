use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use bloglist_common::model::{auth::SessionKeys, user::User};
use bloglist_db::BlogStore;
use std::{convert::Infallible, sync::Arc};
use tracing::debug;

const BEARER_PREFIX: &str = "bearer ";

/// The raw token from an `Authorization: Bearer <token>` header, if there is one.
///
/// Extraction never fails. A missing header or another scheme yields `None`.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(strip_bearer)
            .map(str::to_owned);

        Self(token)
    }
}

/// Scheme matching is case-insensitive.
fn strip_bearer(value: &str) -> Option<&str> {
    let scheme = value.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }

    let token = value[BEARER_PREFIX.len()..].trim();
    (!token.is_empty()).then_some(token)
}

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// The user a valid session token was issued to.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<dyn BlogStore>: FromRef<S>,
    Arc<SessionKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(BearerToken(token)) = BearerToken::from_request_parts(parts, state).await;
        let token = token.ok_or(ServerError::TokenMissing)?;

        let claims = Arc::<SessionKeys>::from_ref(state)
            .verify(&token)
            .map_err(ServerError::InvalidSession)?;

        let user = Arc::<dyn BlogStore>::from_ref(state)
            .fetch_user(claims.id)
            .await?
            .ok_or(ServerError::UnknownSessionUser(claims.id))?;

        debug!(user_id = %user.id, "Authenticated request");
        Ok(Self { user })
    }
}

#[cfg(test)]
mod tests {
    use crate::server::auth::{BearerToken, strip_bearer};
    use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(strip_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(strip_bearer("bearer abc.def"), Some("abc.def"));
        assert_eq!(strip_bearer("BEARER abc.def"), Some("abc.def"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        assert_eq!(strip_bearer("Basic dXNlcjpwdw=="), None);
        assert_eq!(strip_bearer("Bearer"), None);
        assert_eq!(strip_bearer("Bearer   "), None);
        assert_eq!(strip_bearer(""), None);
        assert_eq!(strip_bearer("Bearér x"), None);
    }

    #[test]
    fn token_is_read_from_authorization_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(BearerToken::from_headers(&headers), BearerToken(None));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer token"));
        assert_eq!(
            BearerToken::from_headers(&headers),
            BearerToken(Some("token".to_owned()))
        );
    }
}
