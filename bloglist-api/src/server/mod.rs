use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bloglist_common::model::{
    Id,
    auth::{PasswordHashError, SessionError, SessionKeys},
    post::{InvalidPostError, PostMarker},
    user::{InvalidRegistrationError, UserMarker},
};
use bloglist_db::{BlogStore, DbError};
use json::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error};

mod auth;
mod json;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db: Arc<dyn BlogStore>,
    pub session_keys: Arc<SessionKeys>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

/// The complete service: routes, state and the HTTP layers around them.
pub fn app(state: ServerState) -> Router {
    routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidPost(#[from] InvalidPostError),
    #[error(transparent)]
    InvalidRegistration(#[from] InvalidRegistrationError),
    #[error("Username {0:?} is already taken")]
    UsernameTaken(String),
    #[error("Request carried no bearer token")]
    TokenMissing,
    #[error("Bearer token was rejected: {0}")]
    InvalidSession(#[source] SessionError),
    #[error("Bearer token names unknown user {0}")]
    UnknownSessionUser(Id<UserMarker>),
    #[error("Session token could not be issued: {0}")]
    SessionIssue(#[source] SessionError),
    #[error("Login with invalid username or password")]
    InvalidCredentials,
    #[error("User {user} does not own post {post}")]
    NotPostOwner {
        post: Id<PostMarker>,
        user: Id<UserMarker>,
    },
    #[error(transparent)]
    PasswordHash(#[from] PasswordHashError),
    #[error(transparent)]
    Database(DbError),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("User with id {0} was not found.")]
    UserByIdNotFound(Id<UserMarker>),
}

impl From<DbError> for ServerError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::UsernameTaken(username) => ServerError::UsernameTaken(username),
            DbError::LikesOutOfRange(_) => {
                ServerError::InvalidPost(InvalidPostError::TooManyLikes)
            }
            other => ServerError::Database(other),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::UserByIdNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::TokenMissing
            | ServerError::InvalidSession(_)
            | ServerError::UnknownSessionUser(_)
            | ServerError::InvalidCredentials
            | ServerError::NotPostOwner { .. } => StatusCode::UNAUTHORIZED,
            ServerError::PathRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::InvalidPost(_)
            | ServerError::InvalidRegistration(_)
            | ServerError::UsernameTaken(_) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse(_)
            | ServerError::SessionIssue(_)
            | ServerError::PasswordHash(_)
            | ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the client, which never includes internal details.
    pub fn client_message(&self) -> String {
        match self {
            ServerError::UnknownRoute(_) => "unknown endpoint".to_owned(),
            ServerError::PathRejection(_) => "malformatted id".to_owned(),
            ServerError::JsonRejection(rejection) => rejection.body_text(),
            ServerError::InvalidPost(err) => err.to_string(),
            ServerError::InvalidRegistration(err) => err.to_string(),
            ServerError::UsernameTaken(_) => "username must be unique".to_owned(),
            ServerError::TokenMissing => "token missing".to_owned(),
            ServerError::InvalidSession(_) | ServerError::UnknownSessionUser(_) => {
                "invalid token".to_owned()
            }
            ServerError::InvalidCredentials => "invalid username or password".to_owned(),
            ServerError::NotPostOwner { .. } => {
                "only the creator of a post can delete it".to_owned()
            }
            ServerError::PostByIdNotFound(_) => "post not found".to_owned(),
            ServerError::UserByIdNotFound(_) => "user not found".to_owned(),
            ServerError::JsonResponse(_)
            | ServerError::SessionIssue(_)
            | ServerError::PasswordHash(_)
            | ServerError::Database(_) => "internal server error".to_owned(),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, %status, "Replying with error");
        } else {
            debug!(error = %self, %status, "Replying with error");
        }

        let error_response = ErrorResponse {
            error: self.client_message(),
        };
        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use crate::server::ServerError;
    use axum::http::StatusCode;
    use bloglist_common::{
        model::{Id, auth::SessionKeys, post::InvalidPostError},
        util::PositiveDuration,
    };
    use bloglist_db::DbError;

    #[test]
    fn duplicate_username_from_store_is_a_client_error() {
        let error = ServerError::from(DbError::UsernameTaken("root".to_owned()));

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.client_message(), "username must be unique");
    }

    #[test]
    fn oversized_likes_from_store_are_a_client_error() {
        let error = ServerError::from(DbError::LikesOutOfRange(u64::MAX));

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error.client_message(),
            "post validation failed: likes must be at most 9223372036854775807"
        );
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let error = ServerError::from(DbError::UnknownUser(Id::from(5_u64)));

        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.client_message(), "internal server error");
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        let keys = SessionKeys::new(b"secret", PositiveDuration::from_seconds(60).unwrap());
        let rejected = keys.verify("garbage").unwrap_err();
        let errors = [
            ServerError::TokenMissing,
            ServerError::InvalidSession(rejected),
            ServerError::UnknownSessionUser(Id::from(1_u64)),
            ServerError::InvalidCredentials,
        ];

        for error in errors {
            assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn validation_messages_pass_through() {
        let error = ServerError::from(InvalidPostError::MissingUrl);

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error.client_message(),
            "post validation failed: url is required"
        );
    }
}
