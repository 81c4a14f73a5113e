use std::collections::HashMap;

use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use thiserror::Error;
use tokio_postgres::types::ToSql;

use crate::dtos::post_dtos::CreatePostDTO;
use crate::models::post::{Post, Tag};

const INSERT_POST_QUERY: &str =
    "INSERT INTO post (title, body, created_at) VALUES ($1, $2, $3) RETURNING id;";
const LIST_POSTS_QUERY: &str =
    "SELECT id, title, body, created_at FROM post ORDER BY created_at DESC OFFSET $1 LIMIT $2;";
const LIST_POSTS_TAGS_QUERY: &str = "SELECT name, post_id FROM tag WHERE post_id = ANY($1);";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("error while get connection from pool: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("error while {context}: {source}")]
    Db {
        context: &'static str,
        source: tokio_postgres::Error,
    },
}

fn db_err(context: &'static str) -> impl FnOnce(tokio_postgres::Error) -> RepoError {
    move |source| RepoError::Db { context, source }
}

pub struct PostRepository;

impl PostRepository {
    /// Inserts a post and its tags atomically. The transaction handle rolls
    /// back on drop, so any `?` exit before `commit` leaves no partial state.
    pub async fn add_post(
        pool: &Pool,
        post: CreatePostDTO,
        created_at: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        let mut client = pool.get().await?;
        let tx = client
            .transaction()
            .await
            .map_err(db_err("begin transaction"))?;

        let row = tx
            .query_one(INSERT_POST_QUERY, &[&post.title, &post.body, &created_at])
            .await
            .map_err(db_err("insert post into db"))?;
        let post_id: i32 = row.get(0);

        if !post.tags.is_empty() {
            let (stmt, params) = build_insert_tags_query(&post.tags, &post_id);
            tx.execute(stmt.as_str(), &params)
                .await
                .map_err(db_err("insert post tags into db"))?;
        }

        tx.commit().await.map_err(db_err("commit transaction"))?;
        Ok(())
    }

    /// Returns posts ordered by creation time descending, with their tags.
    ///
    /// Tags are fetched in a second batched query and re-associated in memory
    /// instead of a join, to keep both queries trivial and avoid replicating
    /// post columns across tag rows.
    pub async fn list_posts(pool: &Pool, offset: i64, limit: i64) -> Result<Vec<Post>, RepoError> {
        let client = pool.get().await?;

        let rows = client
            .query(LIST_POSTS_QUERY, &[&offset, &limit])
            .await
            .map_err(db_err("fetch list of posts from db"))?;
        let mut posts: Vec<Post> = rows.iter().map(Post::from_row).collect();

        if posts.is_empty() {
            return Ok(posts);
        }

        let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
        let tag_rows = client
            .query(LIST_POSTS_TAGS_QUERY, &[&post_ids])
            .await
            .map_err(db_err("fetch list of posts tags from db"))?;
        let tags: Vec<Tag> = tag_rows.iter().map(Tag::from_row).collect();

        associate_tags(&mut posts, tags);
        Ok(posts)
    }
}

/// Builds one multi-row `INSERT INTO tag` statement covering every tag, so the
/// write path issues a single statement regardless of tag count.
fn build_insert_tags_query<'a>(
    names: &'a [String],
    post_id: &'a i32,
) -> (String, Vec<&'a (dyn ToSql + Sync)>) {
    let mut stmt = String::from("INSERT INTO tag (name, post_id) VALUES ");
    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(names.len() * 2);
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            stmt.push_str(", ");
        }
        stmt.push_str(&format!("(${}, ${})", i * 2 + 1, i * 2 + 2));
        params.push(name);
        params.push(post_id);
    }
    stmt.push(';');
    (stmt, params)
}

/// Populates each post's tag list from the fetched tag rows. Every post id is
/// seeded with an empty list first, so a post without tags ends up with `[]`
/// rather than a missing entry.
fn associate_tags(posts: &mut [Post], tags: Vec<Tag>) {
    let mut posts_tags: HashMap<i32, Vec<String>> =
        posts.iter().map(|post| (post.id, Vec::new())).collect();
    for tag in tags {
        if let Some(names) = posts_tags.get_mut(&tag.post_id) {
            names.push(tag.name);
        }
    }
    for post in posts {
        if let Some(names) = posts_tags.remove(&post.id) {
            post.tags = names;
        }
    }
}
