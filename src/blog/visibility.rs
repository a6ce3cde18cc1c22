//! Which posts a reader may see.
//!
//! The public predicate is `is_published AND category.is_published AND
//! pub_date <= now`. A post without a category fails it. Authors bypass the
//! predicate for their own posts: on their profile and on the detail page.

use chrono::NaiveDateTime;
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};

use crate::blog::pagination::{Page, PageWindow, PAGE_SIZE};
use crate::db::models::{Post, PostListing};

const LISTING_SELECT: &str = "
    SELECT p.id, p.title, p.text, p.image, p.pub_date, p.is_published, p.created_at,
           p.author_id, p.category_id, p.location_id,
           u.username AS author_username,
           c.title AS category_title,
           c.slug AS category_slug,
           c.is_published AS category_is_published,
           l.name AS location_name,
           l.is_published AS location_is_published,
           (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id";

const SCOPE_FILTER: &str = "
    WHERE (:public = 0
           OR (p.is_published = 1 AND c.is_published = 1 AND p.pub_date <= :now))
      AND (:author_id IS NULL OR p.author_id = :author_id)
      AND (:category_slug IS NULL OR c.slug = :category_slug)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only posts passing the public predicate at the given instant.
    Public(NaiveDateTime),
    /// No filtering; used for an author's own profile.
    All,
}

/// A post listing query: visibility plus optional author and category scopes.
#[derive(Debug, Clone, Copy)]
pub struct PostQuery<'a> {
    pub visibility: Visibility,
    pub author_id: Option<&'a str>,
    pub category_slug: Option<&'a str>,
}

impl<'a> PostQuery<'a> {
    pub fn public(now: NaiveDateTime) -> Self {
        Self {
            visibility: Visibility::Public(now),
            author_id: None,
            category_slug: None,
        }
    }

    pub fn all() -> Self {
        Self {
            visibility: Visibility::All,
            author_id: None,
            category_slug: None,
        }
    }

    pub fn by_author(mut self, author_id: &'a str) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn in_category(mut self, slug: &'a str) -> Self {
        self.category_slug = Some(slug);
        self
    }

    fn public_flag(&self) -> (bool, Option<NaiveDateTime>) {
        match self.visibility {
            Visibility::Public(now) => (true, Some(now)),
            Visibility::All => (false, None),
        }
    }

    pub fn count(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let (public, now) = self.public_flag();
        let sql = format!(
            "SELECT COUNT(*) FROM posts p
             LEFT JOIN categories c ON c.id = p.category_id {}",
            SCOPE_FILTER
        );
        let count: i64 = conn.query_row(
            &sql,
            named_params! {
                ":public": public,
                ":now": now,
                ":author_id": self.author_id,
                ":category_slug": self.category_slug,
            },
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    /// Newest publication date first.
    pub fn fetch(
        &self,
        conn: &Connection,
        limit: usize,
        offset: usize,
    ) -> rusqlite::Result<Vec<PostListing>> {
        let (public, now) = self.public_flag();
        let sql = format!(
            "{} {}
             ORDER BY p.pub_date DESC, p.created_at DESC, p.id DESC
             LIMIT :limit OFFSET :offset",
            LISTING_SELECT, SCOPE_FILTER
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            named_params! {
                ":public": public,
                ":now": now,
                ":author_id": self.author_id,
                ":category_slug": self.category_slug,
                ":limit": limit as i64,
                ":offset": offset as i64,
            },
            listing_from_row,
        )?;
        rows.collect()
    }

    /// One page of results for a raw `?page=` value.
    pub fn page(
        &self,
        conn: &Connection,
        requested: Option<&str>,
    ) -> rusqlite::Result<Page<PostListing>> {
        let window = PageWindow::resolve(requested, self.count(conn)?, PAGE_SIZE);
        let items = self.fetch(conn, window.limit(), window.offset())?;
        Ok(Page::new(items, window))
    }
}

impl PostListing {
    pub fn is_public_at(&self, now: NaiveDateTime) -> bool {
        self.post.is_published
            && self.category_is_published == Some(true)
            && self.post.pub_date <= now
    }

    /// Location name, while the location itself is published.
    pub fn visible_location(&self) -> Option<&str> {
        match self.location_is_published {
            Some(true) => self.location_name.as_deref(),
            _ => None,
        }
    }
}

pub fn find_listing(conn: &Connection, post_id: &str) -> rusqlite::Result<Option<PostListing>> {
    let sql = format!("{} WHERE p.id = ?1", LISTING_SELECT);
    conn.query_row(&sql, params![post_id], listing_from_row)
        .optional()
}

/// The detail-page rule: authors always see their post, everyone else only
/// while it is public. Hidden and missing posts are indistinguishable.
pub fn find_readable(
    conn: &Connection,
    post_id: &str,
    viewer_id: Option<&str>,
    now: NaiveDateTime,
) -> rusqlite::Result<Option<PostListing>> {
    let Some(listing) = find_listing(conn, post_id)? else {
        return Ok(None);
    };
    if viewer_id == Some(listing.post.author_id.as_str()) || listing.is_public_at(now) {
        Ok(Some(listing))
    } else {
        Ok(None)
    }
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<PostListing> {
    Ok(PostListing {
        post: Post {
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
        },
        author_username: row.get("author_username")?,
        category_title: row.get("category_title")?,
        category_slug: row.get("category_slug")?,
        category_is_published: row.get("category_is_published")?,
        location_name: row.get("location_name")?,
        location_is_published: row.get("location_is_published")?,
        comment_count: row.get("comment_count")?,
    })
}
