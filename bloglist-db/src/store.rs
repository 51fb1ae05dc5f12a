use async_trait::async_trait;
use bloglist_common::{
    model::{
        Id, ModelValidationError,
        post::{Post, PostDraft, PostMarker},
        user::{User, UserCredentials, UserDraft, UserMarker, Username},
    },
    snowflake::SnowflakeTimestampError,
};
use std::fmt::Debug;
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Could not generate an id: {0}")]
    Snowflake(#[from] SnowflakeTimestampError),
    #[error("Username {0:?} is already taken")]
    UsernameTaken(String),
    #[error("Like count {0} does not fit in storage")]
    LikesOutOfRange(u64),
    #[error("User with id {0} does not exist")]
    UnknownUser(Id<UserMarker>),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Migrating the database failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Persistence for posts and users.
///
/// Ids are assigned by the store on insert. A user's post list is derived
/// from the owner of each post, so inserting or deleting a post updates it
/// in the same step.
#[async_trait]
pub trait BlogStore: Debug + Send + Sync {
    /// All posts in insertion order, each with its owner.
    async fn fetch_posts(&self) -> Result<Vec<Post>>;

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>>;

    async fn create_post(&self, post: &PostDraft, owner: Id<UserMarker>) -> Result<Post>;

    /// Replaces the like count. Returns `None` if the post does not exist.
    async fn update_post_likes(&self, post_id: Id<PostMarker>, likes: u64)
    -> Result<Option<Post>>;

    /// Returns whether a post was removed.
    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool>;

    async fn fetch_users(&self) -> Result<Vec<User>>;

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>>;

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>>;

    async fn fetch_credentials(&self, username: &str) -> Result<Option<UserCredentials>>;

    /// Fails with [`DbError::UsernameTaken`] if the username exists.
    async fn create_user(&self, user: &UserDraft) -> Result<User>;
}
