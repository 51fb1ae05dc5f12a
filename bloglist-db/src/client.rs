use crate::{
    record::{CredentialsRecord, FullPostRecord, UserRecord},
    store::{BlogStore, DbError, Result},
};
use async_trait::async_trait;
use bloglist_common::{
    model::{
        BloglistSnowflakeGenerator, Id,
        post::{Post, PostDraft, PostMarker},
        user::{User, UserCredentials, UserDraft, UserMarker, Username},
    },
    snowflake::{ProcessId, WorkerId},
};
use parking_lot::Mutex;
use sqlx::{PgPool, query, query_as};
use std::fmt::{Debug, Formatter};
use tracing::debug;

const POST_COLUMNS: &str = "
    posts.post_snowflake,
    posts.title,
    posts.author,
    posts.url,
    posts.likes,
    users.user_snowflake,
    users.username,
    users.name
";

fn select_posts(filter: &str) -> String {
    format!(
        "
        SELECT {POST_COLUMNS}
        FROM
            posts.posts JOIN users.users ON users.user_snowflake = posts.user_snowflake
        {filter}
        ORDER BY posts.post_snowflake
        "
    )
}

fn select_users(filter: &str) -> String {
    format!(
        "
        SELECT
            users.user_snowflake,
            users.username,
            users.name,
            COALESCE(
                array_agg(posts.post_snowflake ORDER BY posts.post_snowflake)
                    FILTER (WHERE posts.post_snowflake IS NOT NULL),
                '{{}}'::BIGINT[]
            ) AS post_snowflakes
        FROM
            users.users LEFT JOIN posts.posts ON posts.user_snowflake = users.user_snowflake
        {filter}
        GROUP BY users.user_snowflake
        ORDER BY users.user_snowflake
        "
    )
}

fn likes_column(likes: u64) -> Result<i64> {
    i64::try_from(likes).map_err(|_| DbError::LikesOutOfRange(likes))
}

/// [`BlogStore`] backed by PostgreSQL.
pub struct DbClient {
    pool: PgPool,
    snowflake_generator: Mutex<BloglistSnowflakeGenerator>,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool, worker_id: WorkerId, process_id: ProcessId) -> Self {
        let snowflake_generator = Mutex::new(BloglistSnowflakeGenerator::new(worker_id, process_id));

        Self {
            pool,
            snowflake_generator,
        }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn next_snowflake(&self) -> Result<i64> {
        let snowflake = self.snowflake_generator.lock().generate()?;
        Ok(snowflake.get().cast_signed())
    }
}

impl Debug for DbClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbClient")
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BlogStore for DbClient {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let records = query_as::<_, FullPostRecord>(&select_posts(""))
            .fetch_all(&self.pool)
            .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record =
            query_as::<_, FullPostRecord>(&select_posts("WHERE posts.post_snowflake = $1"))
                .bind(post_id.snowflake().get().cast_signed())
                .fetch_optional(&self.pool)
                .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn create_post(&self, post: &PostDraft, owner: Id<UserMarker>) -> Result<Post> {
        let likes = likes_column(post.likes)?;
        let post_snowflake = self.next_snowflake()?;

        let record = query_as::<_, FullPostRecord>(&format!(
            "
            WITH posts AS (
                INSERT INTO posts.posts (post_snowflake, title, author, url, likes, user_snowflake)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM posts JOIN users.users ON users.user_snowflake = posts.user_snowflake
            "
        ))
        .bind(post_snowflake)
        .bind(&post.title)
        .bind(&post.author)
        .bind(&post.url)
        .bind(likes)
        .bind(owner.snowflake().get().cast_signed())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                DbError::UnknownUser(owner)
            }
            err => DbError::Sqlx(err),
        })?;

        debug!(post_snowflake, user_id = %owner, "Inserted post");
        Ok(Post::try_from(record)?)
    }

    async fn update_post_likes(
        &self,
        post_id: Id<PostMarker>,
        likes: u64,
    ) -> Result<Option<Post>> {
        let likes = likes_column(likes)?;

        let record = query_as::<_, FullPostRecord>(&format!(
            "
            WITH posts AS (
                UPDATE posts.posts
                SET likes = $2
                WHERE post_snowflake = $1
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM posts JOIN users.users ON users.user_snowflake = posts.user_snowflake
            "
        ))
        .bind(post_id.snowflake().get().cast_signed())
        .bind(likes)
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = query("DELETE FROM posts.posts WHERE post_snowflake = $1")
            .bind(post_id.snowflake().get().cast_signed())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn fetch_users(&self) -> Result<Vec<User>> {
        let records = query_as::<_, UserRecord>(&select_users(""))
            .fetch_all(&self.pool)
            .await?;

        let users = records
            .into_iter()
            .map(User::try_from)
            .collect::<Result<_, _>>()?;
        Ok(users)
    }

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(&select_users("WHERE users.user_snowflake = $1"))
            .bind(user_id.snowflake().get().cast_signed())
            .fetch_optional(&self.pool)
            .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(&select_users("WHERE users.username = $1"))
            .bind(username.get())
            .fetch_optional(&self.pool)
            .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn fetch_credentials(&self, username: &str) -> Result<Option<UserCredentials>> {
        let record = query_as::<_, CredentialsRecord>(
            "
            SELECT
                users.user_snowflake,
                users.username,
                users.name,
                users.password_hash
            FROM
                users.users
            WHERE
                users.username = $1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let credentials = record.map(UserCredentials::try_from).transpose()?;
        Ok(credentials)
    }

    async fn create_user(&self, user: &UserDraft) -> Result<User> {
        let user_snowflake = self.next_snowflake()?;

        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users.users (user_snowflake, username, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING
                users.user_snowflake,
                users.username,
                users.name,
                '{}'::BIGINT[] AS post_snowflakes
            ",
        )
        .bind(user_snowflake)
        .bind(user.username.get())
        .bind(&user.name)
        .bind(user.password_hash.as_phc_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::UsernameTaken(user.username.get().to_owned())
            }
            err => DbError::Sqlx(err),
        })?;

        debug!(user_snowflake, username = user.username.get(), "Inserted user");
        Ok(User::try_from(record)?)
    }
}
