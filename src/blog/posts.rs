use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::Post;

/// Validated post fields, as produced by the post form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: NaiveDateTime,
    pub is_published: bool,
    pub category_id: Option<String>,
    pub location_id: Option<String>,
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get("id")?,
        title: row.get("title")?,
        text: row.get("text")?,
        image: row.get("image")?,
        pub_date: row.get("pub_date")?,
        is_published: row.get("is_published")?,
        created_at: row.get("created_at")?,
        author_id: row.get("author_id")?,
        category_id: row.get("category_id")?,
        location_id: row.get("location_id")?,
    })
}

pub fn insert(
    conn: &Connection,
    author_id: &str,
    draft: &PostDraft,
    image: Option<&str>,
) -> rusqlite::Result<Post> {
    let post = Post {
        id: uuid::Uuid::now_v7().to_string(),
        title: draft.title.clone(),
        text: draft.text.clone(),
        image: image.map(str::to_string),
        pub_date: draft.pub_date,
        is_published: draft.is_published,
        created_at: Utc::now().naive_utc(),
        author_id: author_id.to_string(),
        category_id: draft.category_id.clone(),
        location_id: draft.location_id.clone(),
    };
    conn.execute(
        "INSERT INTO posts
            (id, title, text, image, pub_date, is_published, created_at,
             author_id, category_id, location_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            post.id,
            post.title,
            post.text,
            post.image,
            post.pub_date,
            post.is_published,
            post.created_at,
            post.author_id,
            post.category_id,
            post.location_id
        ],
    )?;
    Ok(post)
}

/// Overwrite the editable fields. `image` is the image the post ends up with.
pub fn update(
    conn: &Connection,
    id: &str,
    draft: &PostDraft,
    image: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE posts
         SET title = ?1, text = ?2, image = ?3, pub_date = ?4, is_published = ?5,
             category_id = ?6, location_id = ?7
         WHERE id = ?8",
        params![
            draft.title,
            draft.text,
            image,
            draft.pub_date,
            draft.is_published,
            draft.category_id,
            draft.location_id,
            id
        ],
    )?;
    Ok(())
}

/// Hard delete; comments go with it.
pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

pub fn find(conn: &Connection, id: &str) -> rusqlite::Result<Option<Post>> {
    conn.query_row("SELECT * FROM posts WHERE id = ?1", params![id], post_from_row)
        .optional()
}

/// Whether the author already has another post with this exact title and text.
pub fn duplicate_exists(
    conn: &Connection,
    author_id: &str,
    title: &str,
    text: &str,
    except_id: Option<&str>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts
         WHERE author_id = ?1 AND title = ?2 AND text = ?3 AND id != COALESCE(?4, '')",
        params![author_id, title, text, except_id],
        |row| row.get(0),
    )
}
