use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::User;

/// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
    })
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
) -> rusqlite::Result<User> {
    let user = User {
        id: uuid::Uuid::now_v7().to_string(),
        username: username.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        password_hash: password_hash.to_string(),
        created_at: Utc::now().naive_utc(),
    };
    conn.execute(
        "INSERT INTO users (id, username, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user.id, user.username, user.password_hash, user.created_at],
    )?;
    Ok(user)
}

pub fn find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT * FROM users WHERE id = ?1",
        params![id],
        user_from_row,
    )
    .optional()
}

pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT * FROM users WHERE username = ?1",
        params![username],
        user_from_row,
    )
    .optional()
}

/// True if another user (not `except_id`) already has this username.
pub fn username_taken(
    conn: &Connection,
    username: &str,
    except_id: Option<&str>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1 AND id != COALESCE(?2, '')",
        params![username, except_id],
        |row| row.get(0),
    )
}

pub fn update_profile(
    conn: &Connection,
    id: &str,
    changes: &ProfileChanges,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE users SET username = ?1, first_name = ?2, last_name = ?3, email = ?4
         WHERE id = ?5",
        params![
            changes.username,
            changes.first_name,
            changes.last_name,
            changes.email,
            id
        ],
    )?;
    Ok(())
}
