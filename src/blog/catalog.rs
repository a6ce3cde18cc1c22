//! Categories and locations. These are managed from the command line; the
//! web side only reads them.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::{Category, Location};

pub struct NewCategory<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub slug: &'a str,
    pub is_published: bool,
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        slug: row.get("slug")?,
        is_published: row.get("is_published")?,
        created_at: row.get("created_at")?,
    })
}

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get("id")?,
        name: row.get("name")?,
        is_published: row.get("is_published")?,
        created_at: row.get("created_at")?,
    })
}

pub fn create_category(conn: &Connection, new: &NewCategory<'_>) -> rusqlite::Result<Category> {
    let category = Category {
        id: uuid::Uuid::now_v7().to_string(),
        title: new.title.to_string(),
        description: new.description.to_string(),
        slug: new.slug.to_string(),
        is_published: new.is_published,
        created_at: Utc::now().naive_utc(),
    };
    conn.execute(
        "INSERT INTO categories (id, title, description, slug, is_published, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            category.id,
            category.title,
            category.description,
            category.slug,
            category.is_published,
            category.created_at
        ],
    )?;
    Ok(category)
}

/// Category for the public category page; unpublished ones are hidden.
pub fn find_published_category(conn: &Connection, slug: &str) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        "SELECT * FROM categories WHERE slug = ?1 AND is_published = 1",
        params![slug],
        category_from_row,
    )
    .optional()
}

pub fn list_categories(conn: &Connection) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT * FROM categories ORDER BY title")?;
    let rows = stmt.query_map([], category_from_row)?;
    rows.collect()
}

/// Publish or hide a category by slug. Hiding it hides its posts too.
pub fn set_category_published(
    conn: &Connection,
    slug: &str,
    is_published: bool,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE categories SET is_published = ?1 WHERE slug = ?2",
        params![is_published, slug],
    )?;
    Ok(rows > 0)
}

/// Delete a category by slug. Posts keep existing with no category.
pub fn delete_category(conn: &Connection, slug: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM categories WHERE slug = ?1", params![slug])?;
    Ok(rows > 0)
}

pub fn create_location(
    conn: &Connection,
    name: &str,
    is_published: bool,
) -> rusqlite::Result<Location> {
    let location = Location {
        id: uuid::Uuid::now_v7().to_string(),
        name: name.to_string(),
        is_published,
        created_at: Utc::now().naive_utc(),
    };
    conn.execute(
        "INSERT INTO locations (id, name, is_published, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            location.id,
            location.name,
            location.is_published,
            location.created_at
        ],
    )?;
    Ok(location)
}

pub fn list_locations(conn: &Connection) -> rusqlite::Result<Vec<Location>> {
    let mut stmt = conn.prepare("SELECT * FROM locations ORDER BY name")?;
    let rows = stmt.query_map([], location_from_row)?;
    rows.collect()
}

pub fn set_location_published(
    conn: &Connection,
    id: &str,
    is_published: bool,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE locations SET is_published = ?1 WHERE id = ?2",
        params![is_published, id],
    )?;
    Ok(rows > 0)
}

/// Delete a location by id. Posts keep existing with no location.
pub fn delete_location(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM locations WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}
