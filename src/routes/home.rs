use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;

use crate::blog::pagination::Page;
use crate::blog::visibility::PostQuery;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::routes::views::{Nav, PostCard};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub page: Page<PostCard>,
}

/// `?page=` as sent; parsing and clamping happen in pagination.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<PageParams>,
) -> AppResult<Html<IndexTemplate>> {
    let now = Utc::now().naive_utc();
    let page = {
        let conn = state.db.get()?;
        PostQuery::public(now).page(&conn, params.page.as_deref())?
    };

    Ok(Html(IndexTemplate {
        nav: Nav::for_user(&user),
        page: page.map(|listing| PostCard::new(listing, now)),
    }))
}
