use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{password, session, users};
use crate::blog::forms::{FormErrors, LoginForm, RegistrationForm};
use crate::error::AppResult;
use crate::extractors::{cookie_value, MaybeUser};
use crate::routes::home::Html;
use crate::routes::views::Nav;
use crate::state::AppState;

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub username: String,
    pub next: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "pages/registration.html")]
pub struct RegistrationTemplate {
    pub nav: Nav,
    pub username: String,
    pub errors: FormErrors,
}

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after login.
pub fn local_redirect_target(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        next
    } else {
        "/"
    }
}

// -- Login --

/// GET /auth/login/
pub async fn login_page(
    MaybeUser(user): MaybeUser,
    Query(params): Query<NextParam>,
) -> Html<LoginTemplate> {
    Html(LoginTemplate {
        nav: Nav::for_user(&user),
        username: String::new(),
        next: params.next.unwrap_or_default(),
        errors: FormErrors::default(),
    })
}

/// POST /auth/login/
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let username = form.username.trim();
    let found = {
        let conn = state.db.get()?;
        users::find_by_username(&conn, username)?
    };
    let verified = match &found {
        Some(u) => {
            password::verify_password_blocking(form.password.clone(), u.password_hash.clone())
                .await?
        }
        None => false,
    };
    let account = found.filter(|_| verified);

    let Some(account) = account else {
        tracing::info!("Failed login for {:?}", username);
        let mut errors = FormErrors::default();
        errors.add_non_field(BAD_CREDENTIALS);
        return Ok(Html(LoginTemplate {
            nav: Nav::default(),
            username: username.to_string(),
            next: form.next.clone(),
            errors,
        })
        .into_response());
    };

    let auth = &state.config.auth;
    let conn = state.db.get()?;
    let pruned = session::delete_expired(&conn)?;
    if pruned > 0 {
        tracing::debug!("Pruned {} expired sessions", pruned);
    }
    let token = session::create_session(&conn, &account.id, auth.session_hours)?;
    tracing::info!("{} signed in", account.username);

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, local_redirect_target(&form.next).to_string()),
            (
                header::SET_COOKIE,
                session::session_cookie(&auth.cookie_name, &token, auth.session_hours),
            ),
        ],
        "",
    )
        .into_response())
}

/// POST /auth/logout/
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = cookie_value(&headers, cookie_name) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, session::clear_session_cookie(cookie_name)),
        ],
        "",
    )
        .into_response())
}

// -- Registration --

/// GET /auth/registration/
pub async fn registration_page(MaybeUser(user): MaybeUser) -> Html<RegistrationTemplate> {
    Html(RegistrationTemplate {
        nav: Nav::for_user(&user),
        username: String::new(),
        errors: FormErrors::default(),
    })
}

/// POST /auth/registration/
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> AppResult<Response> {
    let cleaned = {
        let conn = state.db.get()?;
        form.clean(&conn)?
    };
    let account = match cleaned {
        Ok(account) => account,
        Err(errors) => {
            return Ok(Html(RegistrationTemplate {
                nav: Nav::default(),
                username: form.username,
                errors,
            })
            .into_response());
        }
    };

    let cost = state.config.auth.bcrypt_cost;
    let hash = password::hash_password_blocking(account.password, cost).await?;
    let conn = state.db.get()?;
    let user = users::create_user(&conn, &account.username, &hash)?;
    tracing::info!("Registered {}", user.username);

    Ok(Redirect::to("/auth/login/").into_response())
}
