//! Aggregations over a list of posts.
//!
//! Ties always go to the entry seen first. Like sums saturate at `u64::MAX`.

use crate::model::post::Post;
use serde::{Deserialize, Serialize};

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct AuthorPosts {
    pub author: Option<String>,
    pub posts: usize,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct AuthorLikes {
    pub author: Option<String>,
    pub likes: u64,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct PostStatistics {
    pub total_likes: u64,
    pub favorite: Option<Post>,
    pub most_posts: Option<AuthorPosts>,
    pub most_likes: Option<AuthorLikes>,
}

#[must_use]
pub fn total_likes(posts: &[Post]) -> u64 {
    posts
        .iter()
        .fold(0, |total: u64, post| total.saturating_add(post.likes))
}

#[must_use]
pub fn favorite_post(posts: &[Post]) -> Option<&Post> {
    let max_likes = posts.iter().map(|post| post.likes).max()?;
    posts.iter().find(|post| post.likes == max_likes)
}

/// Folds posts into one value per author, keeping first-seen order.
fn per_author<T: Default>(
    posts: &[Post],
    mut add: impl FnMut(&mut T, &Post),
) -> Vec<(Option<&str>, T)> {
    let mut totals: Vec<(Option<&str>, T)> = Vec::new();

    for post in posts {
        let author = post.author.as_deref();
        let index = match totals.iter().position(|(seen, _)| *seen == author) {
            Some(index) => index,
            None => {
                totals.push((author, T::default()));
                totals.len() - 1
            }
        };
        add(&mut totals[index].1, post);
    }

    totals
}

/// Like `Iterator::max_by_key`, but keeps the first maximum instead of the last.
fn first_max<T, K: Ord>(items: Vec<T>, key: impl Fn(&T) -> K) -> Option<T> {
    items.into_iter().fold(None, |best, item| match best {
        Some(best) if key(&best) >= key(&item) => Some(best),
        _ => Some(item),
    })
}

#[must_use]
pub fn author_with_most_posts(posts: &[Post]) -> Option<AuthorPosts> {
    let counts = per_author(posts, |count: &mut usize, _| *count += 1);

    first_max(counts, |(_, count)| *count).map(|(author, posts)| AuthorPosts {
        author: author.map(str::to_owned),
        posts,
    })
}

#[must_use]
pub fn author_with_most_likes(posts: &[Post]) -> Option<AuthorLikes> {
    let sums = per_author(posts, |likes: &mut u64, post| {
        *likes = likes.saturating_add(post.likes);
    });

    first_max(sums, |(_, likes)| *likes).map(|(author, likes)| AuthorLikes {
        author: author.map(str::to_owned),
        likes,
    })
}

#[must_use]
pub fn summarize(posts: &[Post]) -> PostStatistics {
    PostStatistics {
        total_likes: total_likes(posts),
        favorite: favorite_post(posts).cloned(),
        most_posts: author_with_most_posts(posts),
        most_likes: author_with_most_likes(posts),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            Id,
            post::{MAX_LIKES, Post, PostOwner},
            user::Username,
        },
        stats::{
            AuthorLikes, AuthorPosts, author_with_most_likes, author_with_most_posts,
            favorite_post, summarize, total_likes,
        },
    };

    fn post(id: u64, title: &str, author: &str, likes: u64) -> Post {
        Post {
            id: Id::from(id),
            title: title.to_owned(),
            author: Some(author.to_owned()),
            url: format!("https://example.com/{id}"),
            likes,
            user: PostOwner {
                id: Id::from(1_u64),
                username: Username::new("root".to_owned()).unwrap(),
                name: None,
            },
        }
    }

    fn posts() -> Vec<Post> {
        vec![
            post(1, "React patterns", "Michael Chan", 7),
            post(2, "Go To Statement Considered Harmful", "Edsger W. Dijkstra", 5),
            post(3, "Canonical string reduction", "Edsger W. Dijkstra", 12),
            post(4, "First class tests", "Robert C. Martin", 10),
            post(5, "TDD harms architecture", "Robert C. Martin", 0),
            post(6, "Type wars", "Robert C. Martin", 2),
        ]
    }

    #[test]
    fn total_likes_of_empty_list_is_zero() {
        assert_eq!(total_likes(&[]), 0);
    }

    #[test]
    fn total_likes_of_single_post_is_its_likes() {
        assert_eq!(total_likes(&posts()[..1]), 7);
    }

    #[test]
    fn total_likes_sums_all_posts() {
        assert_eq!(total_likes(&posts()), 36);
    }

    #[test]
    fn favorite_post_of_empty_list_is_none() {
        assert_eq!(favorite_post(&[]), None);
    }

    #[test]
    fn favorite_post_of_single_post_is_that_post() {
        let single = vec![post(9, "Only one", "Someone", 3)];
        assert_eq!(favorite_post(&single), Some(&single[0]));
    }

    #[test]
    fn favorite_post_has_most_likes() {
        let posts = posts();
        let favorite = favorite_post(&posts).unwrap();
        assert_eq!(favorite.title, "Canonical string reduction");
        assert_eq!(favorite.likes, 12);
    }

    #[test]
    fn favorite_post_tie_goes_to_first() {
        let posts = vec![post(1, "a", "x", 4), post(2, "b", "y", 4)];
        assert_eq!(favorite_post(&posts).map(|post| post.id), Some(Id::from(1_u64)));
    }

    #[test]
    fn most_posts() {
        assert_eq!(author_with_most_posts(&[]), None);
        assert_eq!(
            author_with_most_posts(&posts()),
            Some(AuthorPosts {
                author: Some("Robert C. Martin".to_owned()),
                posts: 3,
            })
        );
    }

    #[test]
    fn most_posts_tie_goes_to_first_author() {
        let posts = vec![
            post(1, "a", "Second", 1),
            post(2, "b", "First", 1),
            post(3, "c", "First", 1),
            post(4, "d", "Second", 1),
        ];
        assert_eq!(
            author_with_most_posts(&posts).and_then(|most| most.author),
            Some("Second".to_owned())
        );
    }

    #[test]
    fn most_likes() {
        assert_eq!(author_with_most_likes(&[]), None);
        assert_eq!(
            author_with_most_likes(&posts()),
            Some(AuthorLikes {
                author: Some("Edsger W. Dijkstra".to_owned()),
                likes: 17,
            })
        );
    }

    #[test]
    fn missing_author_is_its_own_group() {
        let mut anonymous = post(7, "anon", "", 100);
        anonymous.author = None;
        let mut posts = posts();
        posts.push(anonymous);

        assert_eq!(
            author_with_most_likes(&posts),
            Some(AuthorLikes {
                author: None,
                likes: 100,
            })
        );
    }

    #[test]
    fn summary_combines_everything() {
        let summary = summarize(&posts());
        assert_eq!(summary.total_likes, 36);
        assert_eq!(summary.favorite.map(|post| post.likes), Some(12));
        assert_eq!(summary.most_posts.map(|most| most.posts), Some(3));
        assert_eq!(summary.most_likes.map(|most| most.likes), Some(17));
    }

    #[test]
    fn like_sums_saturate() {
        let posts = vec![
            post(1, "a", "Edsger W. Dijkstra", MAX_LIKES),
            post(2, "b", "Edsger W. Dijkstra", MAX_LIKES),
            post(3, "c", "Edsger W. Dijkstra", MAX_LIKES),
            post(4, "d", "Michael Chan", 1),
        ];

        assert_eq!(total_likes(&posts), u64::MAX);
        assert_eq!(
            author_with_most_likes(&posts),
            Some(AuthorLikes {
                author: Some("Edsger W. Dijkstra".to_owned()),
                likes: u64::MAX,
            })
        );
    }
}
