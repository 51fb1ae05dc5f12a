use crate::store::{BlogStore, DbError, Result};
use async_trait::async_trait;
use bloglist_common::{
    model::{
        BloglistSnowflakeGenerator, Id,
        post::{MAX_LIKES, Post, PostDraft, PostMarker, PostOwner},
        user::{User, UserCredentials, UserDraft, UserMarker, Username},
    },
    snowflake::{ProcessId, WorkerId},
};
use parking_lot::Mutex;
use tracing::debug;

#[derive(Clone, Debug)]
struct StoredPost {
    id: Id<PostMarker>,
    draft: PostDraft,
    owner: Id<UserMarker>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserCredentials>,
    posts: Vec<StoredPost>,
}

impl Tables {
    fn owner(&self, user_id: Id<UserMarker>) -> Option<PostOwner> {
        self.users
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| PostOwner {
                id: user.id,
                username: user.username.clone(),
                name: user.name.clone(),
            })
    }

    fn post(&self, stored: &StoredPost) -> Option<Post> {
        let owner = self.owner(stored.owner)?;

        Some(Post {
            id: stored.id,
            title: stored.draft.title.clone(),
            author: stored.draft.author.clone(),
            url: stored.draft.url.clone(),
            likes: stored.draft.likes,
            user: owner,
        })
    }

    fn user(&self, credentials: &UserCredentials) -> User {
        User {
            id: credentials.id,
            username: credentials.username.clone(),
            name: credentials.name.clone(),
            posts: self
                .posts
                .iter()
                .filter(|post| post.owner == credentials.id)
                .map(|post| post.id)
                .collect(),
        }
    }
}

/// [`BlogStore`] kept in process memory. Nothing survives a restart.
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    snowflake_generator: Mutex<BloglistSnowflakeGenerator>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(worker_id: WorkerId, process_id: ProcessId) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            snowflake_generator: Mutex::new(BloglistSnowflakeGenerator::new(
                worker_id, process_id,
            )),
        }
    }
}

/// Holds the same bound as the `BIGINT` column of the PostgreSQL store.
fn check_likes(likes: u64) -> Result<()> {
    if likes > MAX_LIKES {
        return Err(DbError::LikesOutOfRange(likes));
    }
    Ok(())
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(WorkerId::default(), ProcessId::default())
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let tables = self.tables.lock();
        Ok(tables
            .posts
            .iter()
            .filter_map(|stored| tables.post(stored))
            .collect())
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let tables = self.tables.lock();
        Ok(tables
            .posts
            .iter()
            .find(|stored| stored.id == post_id)
            .and_then(|stored| tables.post(stored)))
    }

    async fn create_post(&self, post: &PostDraft, owner: Id<UserMarker>) -> Result<Post> {
        check_likes(post.likes)?;
        let id = Id::new(self.snowflake_generator.lock().generate()?);
        let stored = StoredPost {
            id,
            draft: post.clone(),
            owner,
        };

        let mut tables = self.tables.lock();
        let created = tables.post(&stored).ok_or(DbError::UnknownUser(owner))?;
        tables.posts.push(stored);

        debug!(post_id = %id, user_id = %owner, "Inserted post");
        Ok(created)
    }

    async fn update_post_likes(
        &self,
        post_id: Id<PostMarker>,
        likes: u64,
    ) -> Result<Option<Post>> {
        check_likes(likes)?;
        let mut tables = self.tables.lock();
        let Some(stored) = tables.posts.iter_mut().find(|stored| stored.id == post_id) else {
            return Ok(None);
        };
        stored.draft.likes = likes;
        let stored = stored.clone();

        Ok(tables.post(&stored))
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let mut tables = self.tables.lock();
        let before = tables.posts.len();
        tables.posts.retain(|stored| stored.id != post_id);

        Ok(tables.posts.len() < before)
    }

    async fn fetch_users(&self) -> Result<Vec<User>> {
        let tables = self.tables.lock();
        Ok(tables.users.iter().map(|user| tables.user(user)).collect())
    }

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let tables = self.tables.lock();
        Ok(tables
            .users
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| tables.user(user)))
    }

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let tables = self.tables.lock();
        Ok(tables
            .users
            .iter()
            .find(|user| &user.username == username)
            .map(|user| tables.user(user)))
    }

    async fn fetch_credentials(&self, username: &str) -> Result<Option<UserCredentials>> {
        let tables = self.tables.lock();
        Ok(tables
            .users
            .iter()
            .find(|user| user.username.get() == username)
            .cloned())
    }

    async fn create_user(&self, user: &UserDraft) -> Result<User> {
        let id = Id::new(self.snowflake_generator.lock().generate()?);

        let mut tables = self.tables.lock();
        if tables.users.iter().any(|stored| stored.username == user.username) {
            return Err(DbError::UsernameTaken(user.username.get().to_owned()));
        }

        let credentials = UserCredentials {
            id,
            username: user.username.clone(),
            name: user.name.clone(),
            password_hash: user.password_hash.clone(),
        };
        let created = tables.user(&credentials);
        tables.users.push(credentials);

        debug!(user_id = %id, username = user.username.get(), "Inserted user");
        Ok(created)
    }
}
