use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_postgres::Row;

#[derive(Debug, Serialize)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl Post {
    /// Maps a `SELECT id, title, body, created_at` row. Tags come from a
    /// separate query and start out empty.
    pub fn from_row(row: &Row) -> Self {
        Post {
            id: row.get("id"),
            title: row.get("title"),
            body: row.get("body"),
            created_at: row.get("created_at"),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Tag {
    pub name: String,
    pub post_id: i32,
}

impl Tag {
    pub fn from_row(row: &Row) -> Self {
        Tag {
            name: row.get("name"),
            post_id: row.get("post_id"),
        }
    }
}
