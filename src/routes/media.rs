use std::path::{Component, Path as FsPath, PathBuf};

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::blog::forms::UploadedImage;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const POST_IMAGES_DIR: &str = "posts_images";

/// Resolve a request path under the media root. Anything but plain
/// segments (`..`, absolute paths, prefixes) is refused.
fn resolve(root: &FsPath, relative: &str) -> Option<PathBuf> {
    let relative = FsPath::new(relative);
    let mut components = relative.components().peekable();
    components.peek()?;
    if components.all(|c| matches!(c, Component::Normal(_))) {
        Some(root.join(relative))
    } else {
        None
    }
}

pub async fn serve(State(state): State<AppState>, Path(path): Path<String>) -> AppResult<Response> {
    let full = resolve(state.config.media_path(), &path).ok_or(AppError::NotFound)?;
    let data = match tokio::fs::read(&full).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };
    let mime = mime_guess::from_path(&full).first_or_octet_stream();
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        data,
    )
        .into_response())
}

/// Store an upload under the media root; returns the path relative to it.
pub async fn save_image(root: &FsPath, image: &UploadedImage) -> AppResult<String> {
    let ext = image.extension().unwrap_or_else(|| "img".to_string());
    let relative = format!(
        "{}/{}.{}",
        POST_IMAGES_DIR,
        uuid::Uuid::now_v7(),
        ext
    );
    tokio::fs::create_dir_all(root.join(POST_IMAGES_DIR)).await?;
    tokio::fs::write(root.join(&relative), &image.data).await?;
    tracing::debug!("Stored image {} ({} bytes)", relative, image.data.len());
    Ok(relative)
}

/// Drop a stored image. Failures are logged, not surfaced: the row that
/// referenced it is already gone.
pub async fn remove_image(root: &FsPath, relative: &str) {
    let Some(full) = resolve(root, relative) else {
        return;
    };
    if let Err(e) = tokio::fs::remove_file(&full).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Could not remove image {}: {}", full.display(), e);
        }
    }
}
