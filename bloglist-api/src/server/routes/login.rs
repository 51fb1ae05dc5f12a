use crate::server::{Result, ServerError, ServerRouter, json::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use bloglist_common::model::auth::{LoginRequest, LoginResponse, SessionKeys};
use bloglist_db::BlogStore;
use std::sync::Arc;
use tracing::debug;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_post(login)
}

#[derive(TypedPath)]
#[typed_path("/api/login")]
struct LoginPath;

async fn login(
    _: LoginPath,
    State(db): State<Arc<dyn BlogStore>>,
    State(session_keys): State<Arc<SessionKeys>>,
    Json(LoginRequest { username, password }): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ServerError::InvalidCredentials);
    };

    let credentials = db
        .fetch_credentials(&username)
        .await?
        .filter(|credentials| credentials.password_hash.verify(&password))
        .ok_or(ServerError::InvalidCredentials)?;

    let token = session_keys
        .issue(credentials.id, &credentials.username)
        .map_err(ServerError::SessionIssue)?;

    debug!(
        user_id = %credentials.id,
        lifetime_seconds = session_keys.lifetime().get().whole_seconds(),
        "Issued session token"
    );
    Ok(Json(LoginResponse::new(token, credentials)))
}
