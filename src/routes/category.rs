use askama::Template;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Router;
use chrono::Utc;

use crate::blog::catalog;
use crate::blog::pagination::Page;
use crate::blog::visibility::PostQuery;
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::routes::home::{Html, PageParams};
use crate::routes::views::{Nav, PostCard};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/category.html")]
pub struct CategoryTemplate {
    pub nav: Nav,
    pub title: String,
    pub description: String,
    pub page: Page<PostCard>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/category/{slug}/", get(category_posts))
}

/// Public posts of a published category; hidden and unknown slugs are 404.
async fn category_posts(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<Html<CategoryTemplate>> {
    let now = Utc::now().naive_utc();
    let conn = state.db.get()?;
    let category = catalog::find_published_category(&conn, &slug)?.ok_or(AppError::NotFound)?;
    let page = PostQuery::public(now)
        .in_category(&category.slug)
        .page(&conn, params.page.as_deref())?;

    Ok(Html(CategoryTemplate {
        nav: Nav::for_user(&user),
        title: category.title,
        description: category.description,
        page: page.map(|listing| PostCard::new(listing, now)),
    }))
}
