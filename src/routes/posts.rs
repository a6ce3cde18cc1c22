use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;

use crate::blog::catalog;
use crate::blog::comments;
use crate::blog::forms::{Choice, FormErrors, PostForm, UploadedImage};
use crate::blog::posts;
use crate::blog::visibility;
use crate::db::models::Post;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::home::Html;
use crate::routes::media;
use crate::routes::views::{self, CommentView, Nav, PostCard};
use crate::state::AppState;

// --- Templates ---

#[derive(Template)]
#[template(path = "pages/detail.html")]
pub struct DetailTemplate {
    pub nav: Nav,
    pub post: PostCard,
    pub is_author: bool,
    pub comments: Vec<CommentView>,
    pub comment_action: String,
}

#[derive(Template)]
#[template(path = "pages/create.html")]
pub struct PostFormTemplate {
    pub nav: Nav,
    pub editing: bool,
    pub action: String,
    pub form: PostForm,
    pub errors: FormErrors,
    pub categories: Vec<Choice>,
    pub locations: Vec<Choice>,
    pub has_image: bool,
    pub image_url: String,
}

#[derive(Template)]
#[template(path = "pages/post_delete.html")]
pub struct PostDeleteTemplate {
    pub nav: Nav,
    pub post: PostCard,
    pub action: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/create/", get(create_page).post(create_post))
        .route("/posts/{id}/", get(detail))
        .route("/posts/{id}/edit/", get(edit_page).post(edit_post))
        .route("/posts/{id}/delete/", get(delete_page).post(delete_post))
}

// --- Handlers ---

async fn detail(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Html<DetailTemplate>> {
    let now = Utc::now().naive_utc();
    let viewer_id = user.as_ref().map(|u| u.id.as_str());
    let conn = state.db.get()?;

    let listing =
        visibility::find_readable(&conn, &id, viewer_id, now)?.ok_or(AppError::NotFound)?;
    let comments = comments::for_post(&conn, &id)?
        .into_iter()
        .map(|c| CommentView::new(c, &user))
        .collect();

    Ok(Html(DetailTemplate {
        nav: Nav::for_user(&user),
        is_author: views::owns(&user, &listing.post.author_id),
        post: PostCard::new(listing, now),
        comments,
        comment_action: format!("/posts/{}/comment/", id),
    }))
}

async fn create_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<PostFormTemplate>> {
    let form = PostForm::initial(Utc::now().naive_utc());
    render_form(&state, &user, None, form, FormErrors::default())
}

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = read_post_form(multipart).await?;
    let draft = {
        let conn = state.db.get()?;
        let categories = catalog::list_categories(&conn)?;
        let locations = catalog::list_locations(&conn)?;
        form.clean(&conn, &categories, &locations, &user.id, None)?
    };
    let draft = match draft {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(render_form(&state, &user, None, form, errors)?.into_response());
        }
    };

    let image = match &form.image {
        Some(upload) => Some(media::save_image(state.config.media_path(), upload).await?),
        None => None,
    };
    let inserted = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| Ok(posts::insert(&conn, &user.id, &draft, image.as_deref())?));
    let post = match inserted {
        Ok(post) => post,
        Err(e) => {
            if let Some(saved) = &image {
                media::remove_image(state.config.media_path(), saved).await;
            }
            return Err(e);
        }
    };
    tracing::info!("{} created post {}", user.username, post.id);

    Ok(Redirect::to(&views::profile_url(&user.username)).into_response())
}

async fn edit_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let post = load_post(&state, &id)?;
    let Some(user) = user.filter(|u| u.id == post.author_id) else {
        return Ok(views::to_post(&id));
    };

    let form = PostForm::from_post(&post);
    Ok(render_form(&state, &user, Some(&post), form, FormErrors::default())?.into_response())
}

async fn edit_post(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let post = load_post(&state, &id)?;
    let Some(user) = user.filter(|u| u.id == post.author_id) else {
        tracing::debug!("Refused edit of post {} by a non-author", id);
        return Ok(views::to_post(&id));
    };

    let form = read_post_form(multipart).await?;
    let draft = {
        let conn = state.db.get()?;
        let categories = catalog::list_categories(&conn)?;
        let locations = catalog::list_locations(&conn)?;
        form.clean(&conn, &categories, &locations, &user.id, Some(&id))?
    };
    let draft = match draft {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(render_form(&state, &user, Some(&post), form, errors)?.into_response());
        }
    };

    let media_root = state.config.media_path();
    let uploaded = match &form.image {
        Some(upload) => Some(media::save_image(media_root, upload).await?),
        None => None,
    };
    let image = match (&uploaded, form.clear_image) {
        (Some(saved), _) => Some(saved.clone()),
        (None, true) => None,
        (None, false) => post.image.clone(),
    };
    let updated = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| Ok(posts::update(&conn, &id, &draft, image.as_deref())?));
    if let Err(e) = updated {
        if let Some(saved) = &uploaded {
            media::remove_image(media_root, saved).await;
        }
        return Err(e);
    }
    if let Some(old) = post.image.as_deref().filter(|old| image.as_deref() != Some(*old)) {
        media::remove_image(media_root, old).await;
    }

    Ok(views::to_post(&id))
}

async fn delete_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let post = load_post(&state, &id)?;
    if !views::owns(&user, &post.author_id) {
        return Ok(views::to_post(&id));
    }

    let listing = {
        let conn = state.db.get()?;
        visibility::find_listing(&conn, &id)?.ok_or(AppError::NotFound)?
    };
    Ok(Html(PostDeleteTemplate {
        nav: Nav::for_user(&user),
        post: PostCard::new(listing, Utc::now().naive_utc()),
        action: format!("/posts/{}/delete/", id),
    })
    .into_response())
}

async fn delete_post(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let post = load_post(&state, &id)?;
    let Some(user) = user.filter(|u| u.id == post.author_id) else {
        tracing::debug!("Refused delete of post {} by a non-author", id);
        return Ok(views::to_post(&id));
    };

    {
        let conn = state.db.get()?;
        posts::delete(&conn, &id)?;
    }
    if let Some(image) = &post.image {
        media::remove_image(state.config.media_path(), image).await;
    }
    tracing::info!("{} deleted post {}", user.username, id);

    Ok(Redirect::to(&views::profile_url(&user.username)).into_response())
}

// --- Helpers ---

fn load_post(state: &AppState, id: &str) -> AppResult<Post> {
    let conn = state.db.get()?;
    posts::find(&conn, id)?.ok_or(AppError::NotFound)
}

fn render_form(
    state: &AppState,
    user: &CurrentUser,
    existing: Option<&Post>,
    form: PostForm,
    errors: FormErrors,
) -> AppResult<Html<PostFormTemplate>> {
    let conn = state.db.get()?;
    let categories = form.category_choices(&catalog::list_categories(&conn)?);
    let locations = form.location_choices(&catalog::list_locations(&conn)?);
    let current_image = existing.and_then(|p| p.image.as_deref());

    Ok(Html(PostFormTemplate {
        nav: Nav::for_current(user),
        editing: existing.is_some(),
        action: match existing {
            Some(post) => format!("/posts/{}/edit/", post.id),
            None => "/posts/create/".to_string(),
        },
        has_image: current_image.is_some(),
        image_url: current_image.map(views::media_url).unwrap_or_default(),
        form,
        errors,
        categories,
        locations,
    }))
}

/// Collect the multipart post form. Unknown fields are drained and ignored;
/// an empty file input counts as no upload.
async fn read_post_form(mut multipart: Multipart) -> AppResult<PostForm> {
    let mut form = PostForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            if !file_name.is_empty() && !data.is_empty() {
                form.image = Some(UploadedImage {
                    file_name,
                    data: data.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "title" => form.title = value,
            "text" => form.text = value,
            "pub_date" => form.pub_date = value,
            "category" => form.category = value,
            "location" => form.location = value,
            "is_published" => form.is_published = true,
            "image-clear" => form.clear_image = true,
            _ => {}
        }
    }
    Ok(form)
}
