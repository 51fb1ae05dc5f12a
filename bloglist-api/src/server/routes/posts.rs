use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use bloglist_common::{
    model::{
        Id,
        post::{CreatePost, Post, PostMarker, UpdateLikes},
    },
    stats::{self, PostStatistics},
};
use bloglist_db::BlogStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_post(create_post)
        .typed_get(post_stats)
        .typed_get(get_post)
        .typed_put(update_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath)]
#[typed_path("/api/posts")]
struct PostsPath;

#[derive(TypedPath)]
#[typed_path("/api/posts/stats")]
struct PostStatsPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

async fn list_posts(_: PostsPath, State(db): State<Arc<dyn BlogStore>>) -> Result<Json<Vec<Post>>> {
    let posts = db.fetch_posts().await?;

    Ok(Json(posts))
}

async fn post_stats(
    _: PostStatsPath,
    State(db): State<Arc<dyn BlogStore>>,
) -> Result<Json<PostStatistics>> {
    let posts = db.fetch_posts().await?;

    Ok(Json(stats::summarize(&posts)))
}

async fn get_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<dyn BlogStore>>,
) -> Result<Json<Post>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

async fn create_post(
    _: PostsPath,
    State(db): State<Arc<dyn BlogStore>>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Json(post): Json<CreatePost>,
) -> Result<(StatusCode, Json<Post>)> {
    let draft = post.validate()?;
    let post = db.create_post(&draft, user.id).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<dyn BlogStore>>,
    Json(update): Json<UpdateLikes>,
) -> Result<Json<Post>> {
    let likes = update.validate()?;
    let post = db
        .update_post_likes(id, likes)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    debug!(post_id = %id, likes, "Updated likes");
    Ok(Json(post))
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<dyn BlogStore>>,
    AuthenticatedUser { user }: AuthenticatedUser,
) -> Result<StatusCode> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    if post.user.id != user.id {
        return Err(ServerError::NotPostOwner {
            post: id,
            user: user.id,
        });
    }

    db.delete_post(id).await?;

    debug!(post_id = %id, user_id = %user.id, "Deleted post");
    Ok(StatusCode::NO_CONTENT)
}
