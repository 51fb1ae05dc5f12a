use bloglist_common::model::{
    Id, ModelValidationError,
    auth::PasswordHash,
    post::{Post, PostOwner},
    user::{User, UserCredentials, Username},
};
use sqlx::FromRow;

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_snowflake: i64,
    pub username: String,
    pub name: Option<String>,
    pub post_snowflakes: Vec<i64>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct FullPostRecord {
    pub post_snowflake: i64,
    pub title: String,
    pub author: Option<String>,
    pub url: String,
    pub likes: i64,
    pub user_snowflake: i64,
    pub username: String,
    pub name: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CredentialsRecord {
    pub user_snowflake: i64,
    pub username: String,
    pub name: Option<String>,
    pub password_hash: String,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_snowflake.cast_unsigned().into(),
            username: Username::new(value.username)?,
            name: value.name,
            posts: value
                .post_snowflakes
                .into_iter()
                .map(|snowflake| Id::from(snowflake.cast_unsigned()))
                .collect(),
        })
    }
}

impl TryFrom<FullPostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: FullPostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_snowflake.cast_unsigned().into(),
            title: value.title,
            author: value.author,
            url: value.url,
            likes: u64::try_from(value.likes)
                .map_err(|_| ModelValidationError::NegativeLikes(value.likes))?,
            user: PostOwner {
                id: value.user_snowflake.cast_unsigned().into(),
                username: Username::new(value.username)?,
                name: value.name,
            },
        })
    }
}

impl TryFrom<CredentialsRecord> for UserCredentials {
    type Error = ModelValidationError;

    fn try_from(value: CredentialsRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_snowflake.cast_unsigned().into(),
            username: Username::new(value.username)?,
            name: value.name,
            password_hash: PasswordHash::from_phc_string(value.password_hash),
        })
    }
}
