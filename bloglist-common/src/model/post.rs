use crate::model::{
    Id,
    user::{UserMarker, Username},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Like-counts are stored as signed 64-bit integers.
pub const MAX_LIKES: u64 = i64::MAX.cast_unsigned();

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub title: String,
    pub author: Option<String>,
    pub url: String,
    pub likes: u64,
    pub user: PostOwner,
}

/// Public fields of the user who created a post.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct PostOwner {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub name: Option<String>,
}

/// Request body for creating a post. Every field may be absent so that
/// missing ones can be reported as validation failures.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CreatePost {
    pub title: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub likes: Option<u64>,
}

/// A post that passed validation and is ready to be stored.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct PostDraft {
    pub title: String,
    pub author: Option<String>,
    pub url: String,
    pub likes: u64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct UpdateLikes {
    pub likes: u64,
}

impl UpdateLikes {
    pub fn validate(self) -> Result<u64, InvalidPostError> {
        checked_likes(self.likes)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum InvalidPostError {
    #[error("post validation failed: title is required")]
    MissingTitle,
    #[error("post validation failed: url is required")]
    MissingUrl,
    #[error("post validation failed: likes must be at most {MAX_LIKES}")]
    TooManyLikes,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn checked_likes(likes: u64) -> Result<u64, InvalidPostError> {
    if likes > MAX_LIKES {
        return Err(InvalidPostError::TooManyLikes);
    }
    Ok(likes)
}

impl CreatePost {
    pub fn validate(self) -> Result<PostDraft, InvalidPostError> {
        let title = non_empty(self.title).ok_or(InvalidPostError::MissingTitle)?;
        let url = non_empty(self.url).ok_or(InvalidPostError::MissingUrl)?;

        Ok(PostDraft {
            title,
            author: self.author,
            url,
            likes: checked_likes(self.likes.unwrap_or_default())?,
        })
    }
}
