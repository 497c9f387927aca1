//! Request handlers.
//!
//! `GET` on any path views it: directories render as an HTML listing,
//! files stream back with a guessed content type. `POST` on a directory
//! mutates it, dispatching on the form's `action` field: `upload`
//! (multipart), `delete` and `new_folder` (urlencoded). Successful
//! mutations redirect back to the listing they were posted from.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use axum_extra::extract::Form;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::files::{ops, permissions, BrowserError, EntryType, UploadSink};
use crate::http::{AppState, HttpError};
use crate::ui;

/// Fields of the urlencoded mutation forms. The delete form repeats
/// `file` once per selected entry.
#[derive(Debug, Deserialize)]
struct MutationForm {
    action: Option<String>,
    #[serde(default, rename = "file")]
    files: Vec<String>,
    name: Option<String>,
}

/// `GET /`
pub async fn view_root(State(state): State<Arc<AppState>>) -> Result<Response, HttpError> {
    view_path(&state, "").await
}

/// `GET /{path}`
pub async fn view(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, HttpError> {
    view_path(&state, &path).await
}

/// `POST /`
pub async fn mutate_root(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, HttpError> {
    mutate_path(&state, "", request).await
}

/// `POST /{path}`
pub async fn mutate(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, HttpError> {
    mutate_path(&state, &path, request).await
}

async fn view_path(state: &AppState, request_path: &str) -> Result<Response, HttpError> {
    if !state.access.allows_list() && !state.access.allows_read() {
        return Err(HttpError::Disabled("Viewing"));
    }

    let local = state.browser.resolve_existing(request_path)?;

    match permissions::path_type(&local) {
        EntryType::Directory => {
            if !state.access.allows_list() {
                return Err(HttpError::Disabled("Listing"));
            }
            if !permissions::is_readable(&local, EntryType::Directory) {
                return Err(HttpError::NotReadable);
            }
            let entries = state.browser.list_directory(&local)?;
            let web_path = state.browser.web_path(&local);
            let writable = permissions::is_writable(&local, EntryType::Directory);
            Ok(Html(ui::render_listing(&web_path, &entries, writable)).into_response())
        }
        EntryType::File => {
            if !state.access.allows_read() {
                return Err(HttpError::Disabled("Download"));
            }
            if !permissions::is_readable(&local, EntryType::File) {
                return Err(HttpError::NotReadable);
            }
            serve_file(&local).await
        }
        // Sockets, fifos and broken symlinks are neither listable nor
        // downloadable.
        EntryType::Unknown => Err(HttpError::NotReadable),
    }
}

/// Stream a file back to the client.
async fn serve_file(path: &FsPath) -> Result<Response, HttpError> {
    let file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => HttpError::NotFound,
        std::io::ErrorKind::PermissionDenied => HttpError::NotReadable,
        _ => HttpError::Internal(e),
    })?;
    let metadata = file.metadata().await?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.essence_str())
            .map_err(|e| HttpError::Internal(std::io::Error::other(e)))?,
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}

async fn mutate_path(
    state: &AppState,
    request_path: &str,
    request: Request,
) -> Result<Response, HttpError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| HttpError::BadRequest(e.to_string()))?;
        return upload(state, request_path, multipart).await;
    }

    let Form(form) = Form::<MutationForm>::from_request(request, &())
        .await
        .map_err(|e| HttpError::BadRequest(e.to_string()))?;

    match form.action.as_deref() {
        Some("delete") => delete(state, request_path, &form.files),
        Some("new_folder") => new_folder(state, request_path, form.name),
        _ => Err(HttpError::UnknownAction),
    }
}

/// Store every `file` part of the multipart body into the target
/// directory. The `action=upload` field must precede the file parts,
/// as the listing page sends it; file parts arriving before it, or a
/// body without it, are refused with nothing written. After the
/// action, all-or-nothing per file: files already stored stay when a
/// later one fails.
async fn upload(
    state: &AppState,
    request_path: &str,
    mut multipart: Multipart,
) -> Result<Response, HttpError> {
    if !state.access.allows_write() {
        return Err(HttpError::Disabled("Upload"));
    }

    let dir = match state.browser.resolve_existing(request_path) {
        Ok(dir) => dir,
        Err(BrowserError::NotFound(_)) => return Err(HttpError::NotADirectory),
        Err(e) => return Err(e.into()),
    };
    if permissions::path_type(&dir) != EntryType::Directory {
        return Err(HttpError::NotADirectory);
    }
    if !permissions::is_writable(&dir, EntryType::Directory) {
        return Err(HttpError::UploadForbidden);
    }

    let mut action_seen = false;
    let mut uploaded = 0usize;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("action") => {
                let action = field
                    .text()
                    .await
                    .map_err(|e| HttpError::BadRequest(e.to_string()))?;
                if action != "upload" {
                    return Err(HttpError::UnknownAction);
                }
                action_seen = true;
            }
            Some("file") => {
                if !action_seen {
                    return Err(HttpError::UnknownAction);
                }
                let raw_name = field.file_name().unwrap_or("").to_string();
                let Some(file_name) = ops::sanitize_file_name(&raw_name) else {
                    return Err(HttpError::InvalidFileName);
                };
                store_field(&dir, &file_name, field).await?;
                uploaded += 1;
            }
            _ => {}
        }
    }

    if !action_seen {
        return Err(HttpError::UnknownAction);
    }
    if uploaded == 0 {
        return Err(HttpError::MissingFile);
    }
    Ok(redirect_to_listing(request_path))
}

/// Stream one multipart field to disk through an [`UploadSink`].
async fn store_field(
    dir: &FsPath,
    file_name: &str,
    mut field: Field<'_>,
) -> Result<(), HttpError> {
    let mut sink = UploadSink::begin(dir, file_name).await?;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = sink.write(&chunk).await {
                    sink.abort().await;
                    return Err(e.into());
                }
            }
            Ok(None) => break,
            Err(e) => {
                sink.abort().await;
                return Err(HttpError::BadRequest(e.to_string()));
            }
        }
    }
    let stored = sink.finish().await?;
    info!(path = ?stored, "stored uploaded file");
    Ok(())
}

/// Delete the named entries of the posted directory.
///
/// Every name is validated before anything is removed, so a refused
/// request leaves the directory untouched. Removal itself is best
/// effort: the response is a redirect when every entry went away, or a
/// per-entry JSON result map otherwise.
fn delete(
    state: &AppState,
    request_path: &str,
    names: &[String],
) -> Result<Response, HttpError> {
    if !state.access.allows_delete() {
        return Err(HttpError::Disabled("Deletion"));
    }

    let mut targets = Vec::with_capacity(names.len());
    for name in names {
        if name.is_empty() {
            return Err(HttpError::InvalidEntry(name.clone()));
        }
        let joined = join_web_path(request_path, name);
        let target = state
            .browser
            .resolve(&joined)
            .map_err(|_| HttpError::InvalidEntry(name.clone()))?;
        if target.as_path() == state.browser.root() {
            return Err(HttpError::InvalidEntry(name.clone()));
        }

        // A target that exists (even as a dangling symlink) must sit in a
        // writable parent and be writable itself before removal is tried.
        if fs::symlink_metadata(&target).is_ok() {
            let parent = target
                .parent()
                .ok_or_else(|| HttpError::InvalidEntry(name.clone()))?;
            if !permissions::is_writable(parent, EntryType::Directory) {
                return Err(HttpError::ParentNotWritable(name.clone()));
            }
            let entry_type = permissions::path_type(&target);
            if entry_type != EntryType::Unknown && !permissions::is_writable(&target, entry_type) {
                return Err(HttpError::NotDeletable(name.clone()));
            }
        }
        targets.push((name.clone(), target));
    }

    let mut outcome = BTreeMap::new();
    for (name, target) in targets {
        let removed = ops::remove_entry(&target);
        if !removed {
            warn!(name = %name, "entry not deleted");
        }
        outcome.insert(name, removed);
    }

    if outcome.values().all(|removed| *removed) {
        Ok(redirect_to_listing(request_path))
    } else {
        Ok((StatusCode::OK, Json(outcome)).into_response())
    }
}

/// Create a folder beneath the posted directory. The name may contain
/// `/` separators; the whole chain is created.
fn new_folder(
    state: &AppState,
    request_path: &str,
    name: Option<String>,
) -> Result<Response, HttpError> {
    if !state.access.allows_create() {
        return Err(HttpError::Disabled("Folder creation"));
    }

    let name = name.filter(|n| !n.is_empty()).ok_or(HttpError::MissingName)?;
    let target = state.browser.resolve(&join_web_path(request_path, &name))?;
    ops::create_folder(&target)?;
    info!(path = ?target, "created folder");

    Ok(redirect_to_listing(request_path))
}

fn join_web_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

/// 302 back to the listing a mutation form was posted from.
fn redirect_to_listing(request_path: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, ui::encode_href(request_path))],
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_web_path() {
        assert_eq!(join_web_path("", "a.txt"), "a.txt");
        assert_eq!(join_web_path("docs", "a.txt"), "docs/a.txt");
        assert_eq!(join_web_path("docs/sub", "a b"), "docs/sub/a b");
    }

    #[test]
    fn test_redirect_is_302_with_encoded_location() {
        let response = redirect_to_listing("my dir/sub");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/my%20dir/sub"
        );
    }

    #[test]
    fn test_redirect_to_root() {
        let response = redirect_to_listing("");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }
}
