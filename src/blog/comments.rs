use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::{Comment, CommentListing};

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        text: row.get("text")?,
        post_id: row.get("post_id")?,
        author_id: row.get("author_id")?,
        created_at: row.get("created_at")?,
    })
}

pub fn insert(
    conn: &Connection,
    post_id: &str,
    author_id: &str,
    text: &str,
) -> rusqlite::Result<Comment> {
    let comment = Comment {
        id: uuid::Uuid::now_v7().to_string(),
        text: text.to_string(),
        post_id: post_id.to_string(),
        author_id: author_id.to_string(),
        created_at: Utc::now().naive_utc(),
    };
    conn.execute(
        "INSERT INTO comments (id, text, post_id, author_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            comment.id,
            comment.text,
            comment.post_id,
            comment.author_id,
            comment.created_at
        ],
    )?;
    Ok(comment)
}

pub fn find(conn: &Connection, id: &str) -> rusqlite::Result<Option<Comment>> {
    conn.query_row(
        "SELECT * FROM comments WHERE id = ?1",
        params![id],
        comment_from_row,
    )
    .optional()
}

pub fn update_text(conn: &Connection, id: &str, text: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE comments SET text = ?1 WHERE id = ?2",
        params![text, id],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

/// Comments on a post, oldest first.
pub fn for_post(conn: &Connection, post_id: &str) -> rusqlite::Result<Vec<CommentListing>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.text, c.post_id, c.author_id, c.created_at, u.username
         FROM comments c
         JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.created_at ASC, c.id ASC",
    )?;
    let rows = stmt.query_map(params![post_id], |row| {
        Ok(CommentListing {
            comment: comment_from_row(row)?,
            author_username: row.get("username")?,
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::fixtures::*;
    use crate::blog::posts;
    use crate::db::test_pool;

    #[test]
    fn comments_come_back_oldest_first() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let alice = user(&conn, "alice");
        let bob = user(&conn, "bob");
        let target = post(&conn, &alice.id, "Post", None, at("2025-01-01 10:00:00"), true);

        let late = insert(&conn, &target.id, &bob.id, "late").unwrap();
        let early = insert(&conn, &target.id, &alice.id, "early").unwrap();
        // Force the second insert to be older than the first.
        conn.execute(
            "UPDATE comments SET created_at = '2020-01-01 00:00:00' WHERE id = ?1",
            params![early.id],
        )
        .unwrap();

        let listed = for_post(&conn, &target.id).unwrap();
        let texts: Vec<&str> = listed.iter().map(|c| c.comment.text.as_str()).collect();
        assert_eq!(texts, vec!["early", "late"]);
        assert_eq!(listed[0].author_username, "alice");
        assert_eq!(listed[1].comment.id, late.id);
    }

    #[test]
    fn deleting_a_post_removes_its_comments() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let alice = user(&conn, "alice");
        let target = post(&conn, &alice.id, "Post", None, at("2025-01-01 10:00:00"), true);
        let comment = insert(&conn, &target.id, &alice.id, "hi").unwrap();

        posts::delete(&conn, &target.id).unwrap();

        assert!(find(&conn, &comment.id).unwrap().is_none());
        assert!(for_post(&conn, &target.id).unwrap().is_empty());
    }

    #[test]
    fn update_and_delete_comment() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let alice = user(&conn, "alice");
        let target = post(&conn, &alice.id, "Post", None, at("2025-01-01 10:00:00"), true);
        let comment = insert(&conn, &target.id, &alice.id, "typo").unwrap();

        update_text(&conn, &comment.id, "fixed").unwrap();
        assert_eq!(find(&conn, &comment.id).unwrap().unwrap().text, "fixed");

        assert!(delete(&conn, &comment.id).unwrap());
        assert!(find(&conn, &comment.id).unwrap().is_none());
    }
}
