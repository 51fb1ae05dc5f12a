use crate::server::{Result, ServerError, ServerRouter, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use bloglist_common::model::{
    Id,
    auth::PasswordHash,
    user::{CreateUser, User, UserDraft, UserMarker},
};
use bloglist_db::BlogStore;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_users)
        .typed_post(create_user)
        .typed_get(get_user)
}

#[derive(TypedPath)]
#[typed_path("/api/users")]
struct UsersPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/users/{id}", rejection(ServerError))]
struct UserPath {
    id: Id<UserMarker>,
}

async fn list_users(_: UsersPath, State(db): State<Arc<dyn BlogStore>>) -> Result<Json<Vec<User>>> {
    let users = db.fetch_users().await?;

    Ok(Json(users))
}

async fn get_user(
    UserPath { id }: UserPath,
    State(db): State<Arc<dyn BlogStore>>,
) -> Result<Json<User>> {
    let user = db
        .fetch_user(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    Ok(Json(user))
}

async fn create_user(
    _: UsersPath,
    State(db): State<Arc<dyn BlogStore>>,
    Json(user): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>)> {
    let registration = user.validate()?;

    // Checked before hashing. The store still enforces uniqueness on insert.
    if db.fetch_user_by_username(&registration.username).await?.is_some() {
        return Err(ServerError::UsernameTaken(registration.username.into_inner()));
    }

    let password_hash = PasswordHash::generate(&registration.password)?;
    let user = db
        .create_user(&UserDraft {
            username: registration.username,
            name: registration.name,
            password_hash,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
