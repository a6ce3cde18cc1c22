use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use chrono::Utc;

use crate::auth::users;
use crate::blog::forms::{FormErrors, ProfileForm};
use crate::blog::pagination::Page;
use crate::blog::visibility::PostQuery;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::home::{Html, PageParams};
use crate::routes::views::{self, Nav, PostCard};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub username: String,
    pub full_name: String,
    pub joined: String,
    pub is_self: bool,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "pages/user.html")]
pub struct ProfileEditTemplate {
    pub nav: Nav,
    pub form: ProfileForm,
    pub errors: FormErrors,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/edit/", get(edit_page).post(edit_profile))
        .route("/profile/{username}/", get(profile))
}

async fn profile(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<Html<ProfileTemplate>> {
    let now = Utc::now().naive_utc();
    let conn = state.db.get()?;
    let owner = users::find_by_username(&conn, &username)?.ok_or(AppError::NotFound)?;
    let is_self = views::owns(&viewer, &owner.id);

    let query = if is_self {
        PostQuery::all()
    } else {
        PostQuery::public(now)
    };
    let page = query
        .by_author(&owner.id)
        .page(&conn, params.page.as_deref())?;

    Ok(Html(ProfileTemplate {
        nav: Nav::for_user(&viewer),
        full_name: owner.display_name(),
        joined: owner.created_at.format("%-d %B %Y").to_string(),
        username: owner.username,
        is_self,
        page: page.map(|listing| PostCard::new(listing, now)),
    }))
}

async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<ProfileEditTemplate>> {
    let conn = state.db.get()?;
    let account = users::find_by_id(&conn, &user.id)?.ok_or(AppError::NotFound)?;
    Ok(Html(ProfileEditTemplate {
        nav: Nav::for_current(&user),
        form: ProfileForm::from_user(&account),
        errors: FormErrors::default(),
    }))
}

async fn edit_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    match form.clean(&conn, &user.id)? {
        Ok(changes) => {
            users::update_profile(&conn, &user.id, &changes)?;
            if changes.username != user.username {
                tracing::info!("{} is now known as {}", user.username, changes.username);
            }
            Ok(Redirect::to(&views::profile_url(&changes.username)).into_response())
        }
        Err(errors) => Ok(Html(ProfileEditTemplate {
            nav: Nav::for_current(&user),
            form,
            errors,
        })
        .into_response()),
    }
}
