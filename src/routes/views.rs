//! Flat view structs handed to templates, plus URL builders.

use axum::response::{IntoResponse, Redirect, Response};
use chrono::NaiveDateTime;

use crate::db::models::{CommentListing, PostListing};
use crate::extractors::CurrentUser;
use crate::format::{format_pub_date, format_relative_time, truncate_words};

const EXCERPT_WORDS: usize = 30;

pub fn post_url(id: &str) -> String {
    format!("/posts/{}/", id)
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub fn category_url(slug: &str) -> String {
    format!("/category/{}/", slug)
}

pub fn media_url(path: &str) -> String {
    format!("/media/{}", path)
}

/// 303 to the post detail page.
pub fn to_post(id: &str) -> Response {
    Redirect::to(&post_url(id)).into_response()
}

/// Whether `user` wrote the thing owned by `author_id`.
pub fn owns(user: &Option<CurrentUser>, author_id: &str) -> bool {
    user.as_ref().is_some_and(|u| u.id == author_id)
}

/// Header state shown on every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub signed_in: bool,
    pub username: String,
    pub profile_url: String,
}

impl Nav {
    pub fn for_user(user: &Option<CurrentUser>) -> Self {
        match user {
            Some(u) => Self {
                signed_in: true,
                username: u.username.clone(),
                profile_url: profile_url(&u.username),
            },
            None => Self::default(),
        }
    }

    pub fn for_current(user: &CurrentUser) -> Self {
        Self::for_user(&Some(user.clone()))
    }
}

pub struct PostCard {
    pub id: String,
    pub url: String,
    pub title: String,
    pub text: String,
    pub excerpt: String,
    pub author: String,
    pub author_url: String,
    pub pub_date: String,
    pub has_category: bool,
    pub category_title: String,
    pub category_url: String,
    pub has_location: bool,
    pub location: String,
    pub has_image: bool,
    pub image_url: String,
    pub comment_count: i64,
    /// Why the public cannot see this post; empty when they can.
    pub status: String,
}

impl PostCard {
    pub fn new(listing: PostListing, now: NaiveDateTime) -> Self {
        let status = hidden_reason(&listing, now).unwrap_or_default().to_string();
        let location = listing.visible_location().map(str::to_string);
        let category = match (
            listing.category_is_published,
            listing.category_title,
            listing.category_slug,
        ) {
            (Some(true), Some(title), Some(slug)) => Some((title, category_url(&slug))),
            _ => None,
        };
        let post = listing.post;
        let (category_title, category_url) = category.clone().unwrap_or_default();

        Self {
            url: post_url(&post.id),
            excerpt: truncate_words(&post.text, EXCERPT_WORDS),
            author_url: profile_url(&listing.author_username),
            author: listing.author_username,
            pub_date: format_pub_date(&post.pub_date),
            has_category: category.is_some(),
            category_title,
            category_url,
            has_location: location.is_some(),
            location: location.unwrap_or_default(),
            has_image: post.image.is_some(),
            image_url: post.image.as_deref().map(media_url).unwrap_or_default(),
            comment_count: listing.comment_count,
            status,
            id: post.id,
            title: post.title,
            text: post.text,
        }
    }
}

fn hidden_reason(listing: &PostListing, now: NaiveDateTime) -> Option<&'static str> {
    if !listing.post.is_published {
        Some("Not published")
    } else if listing.category_is_published.is_none() {
        Some("No category")
    } else if listing.category_is_published == Some(false) {
        Some("Category hidden")
    } else if listing.post.pub_date > now {
        Some("Scheduled")
    } else {
        None
    }
}

pub struct CommentView {
    pub id: String,
    pub author: String,
    pub author_url: String,
    pub text: String,
    pub created: String,
    pub can_manage: bool,
    pub edit_url: String,
    pub delete_url: String,
}

impl CommentView {
    pub fn new(listing: CommentListing, viewer: &Option<CurrentUser>) -> Self {
        let comment = listing.comment;
        let base = format!("/posts/{}/comment/{}", comment.post_id, comment.id);
        Self {
            can_manage: owns(viewer, &comment.author_id),
            author_url: profile_url(&listing.author_username),
            author: listing.author_username,
            created: format_relative_time(&comment.created_at),
            edit_url: format!("{}/edit/", base),
            delete_url: format!("{}/delete/", base),
            text: comment.text,
            id: comment.id,
        }
    }
}
