use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use chrono::Utc;

use crate::blog::comments;
use crate::blog::forms::{CommentForm, FormErrors};
use crate::blog::visibility;
use crate::db::models::Comment;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::home::Html;
use crate::routes::views::{self, Nav};
use crate::state::AppState;

// --- Templates ---

#[derive(Template)]
#[template(path = "pages/comment.html")]
pub struct CommentFormTemplate {
    pub nav: Nav,
    pub editing: bool,
    pub action: String,
    pub post_url: String,
    pub post_title: String,
    pub text: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "pages/comment_delete.html")]
pub struct CommentDeleteTemplate {
    pub nav: Nav,
    pub action: String,
    pub post_url: String,
    pub text: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}/comment/", get(add_page).post(add_comment))
        .route(
            "/posts/{id}/comment/{comment_id}/edit/",
            get(edit_page).post(edit_comment),
        )
        .route(
            "/posts/{id}/comment/{comment_id}/delete/",
            get(delete_page).post(delete_comment),
        )
}

// --- Handlers ---

async fn add_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<Html<CommentFormTemplate>> {
    let post_title = readable_title(&state, &post_id, &user)?;
    Ok(Html(CommentFormTemplate {
        nav: Nav::for_current(&user),
        editing: false,
        action: format!("/posts/{}/comment/", post_id),
        post_url: views::post_url(&post_id),
        post_title,
        text: String::new(),
        errors: FormErrors::default(),
    }))
}

async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let post_title = readable_title(&state, &post_id, &user)?;
    let text = match form.clean() {
        Ok(text) => text,
        Err(errors) => {
            return Ok(Html(CommentFormTemplate {
                nav: Nav::for_current(&user),
                editing: false,
                action: format!("/posts/{}/comment/", post_id),
                post_url: views::post_url(&post_id),
                post_title,
                text: form.text,
                errors,
            })
            .into_response());
        }
    };

    let comment = {
        let conn = state.db.get()?;
        comments::insert(&conn, &post_id, &user.id, &text)?
    };
    tracing::info!("{} commented on post {} ({})", user.username, post_id, comment.id);

    Ok(views::to_post(&post_id))
}

async fn edit_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let comment = load_comment(&state, &post_id, &comment_id)?;
    let Some(user) = user.filter(|u| u.id == comment.author_id) else {
        return Ok(views::to_post(&post_id));
    };

    Ok(Html(CommentFormTemplate {
        nav: Nav::for_current(&user),
        editing: true,
        action: edit_action(&post_id, &comment_id),
        post_url: views::post_url(&post_id),
        post_title: String::new(),
        text: comment.text,
        errors: FormErrors::default(),
    })
    .into_response())
}

async fn edit_comment(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((post_id, comment_id)): Path<(String, String)>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let comment = load_comment(&state, &post_id, &comment_id)?;
    let Some(user) = user.filter(|u| u.id == comment.author_id) else {
        tracing::debug!("Refused edit of comment {} by a non-author", comment_id);
        return Ok(views::to_post(&post_id));
    };

    match form.clean() {
        Ok(text) => {
            let conn = state.db.get()?;
            comments::update_text(&conn, &comment.id, &text)?;
            Ok(views::to_post(&post_id))
        }
        Err(errors) => Ok(Html(CommentFormTemplate {
            nav: Nav::for_current(&user),
            editing: true,
            action: edit_action(&post_id, &comment_id),
            post_url: views::post_url(&post_id),
            post_title: String::new(),
            text: form.text,
            errors,
        })
        .into_response()),
    }
}

async fn delete_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let comment = load_comment(&state, &post_id, &comment_id)?;
    if !views::owns(&user, &comment.author_id) {
        return Ok(views::to_post(&post_id));
    }

    Ok(Html(CommentDeleteTemplate {
        nav: Nav::for_user(&user),
        action: format!("/posts/{}/comment/{}/delete/", post_id, comment_id),
        post_url: views::post_url(&post_id),
        text: comment.text,
    })
    .into_response())
}

async fn delete_comment(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let comment = load_comment(&state, &post_id, &comment_id)?;
    if !views::owns(&user, &comment.author_id) {
        tracing::debug!("Refused delete of comment {} by a non-author", comment_id);
        return Ok(views::to_post(&post_id));
    }

    let conn = state.db.get()?;
    comments::delete(&conn, &comment.id)?;
    Ok(views::to_post(&post_id))
}

// --- Helpers ---

/// Title of a post the user may comment on; hidden posts are not found.
fn readable_title(state: &AppState, post_id: &str, user: &CurrentUser) -> AppResult<String> {
    let conn = state.db.get()?;
    let listing =
        visibility::find_readable(&conn, post_id, Some(&user.id), Utc::now().naive_utc())?
            .ok_or(AppError::NotFound)?;
    Ok(listing.post.title)
}

/// A comment addressed through the post it belongs to.
fn load_comment(state: &AppState, post_id: &str, comment_id: &str) -> AppResult<Comment> {
    let conn = state.db.get()?;
    comments::find(&conn, comment_id)?
        .filter(|c| c.post_id == post_id)
        .ok_or(AppError::NotFound)
}

fn edit_action(post_id: &str, comment_id: &str) -> String {
    format!("/posts/{}/comment/{}/edit/", post_id, comment_id)
}
