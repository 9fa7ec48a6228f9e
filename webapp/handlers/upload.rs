use std::path::PathBuf;

use ferrite_vision::error::{AppError, Result};
use ferrite_vision::thumbnail::make_thumbnail;
use ferrite_vision::upload::{store_upload, validate_upload};

use crate::render::{render_page, Page};
use crate::routes::{self, HttpRequest, HttpResponse, FLASH_COOKIE};
use crate::state::App;
use crate::util::form::url_decode;
use crate::util::multipart::{extract_boundary, file_field};

pub const FILE_FIELD: &str = "image";

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

pub fn handle_get(request: &HttpRequest) -> HttpResponse {
    let flash = request.cookie(FLASH_COOKIE).map(|raw| url_decode(&raw));
    let page = render_page(Page::Upload, flash.as_deref(), &upload_form());
    let response = routes::html_response(page);
    match flash {
        Some(_) => routes::clear_flash(response),
        None => response,
    }
}

fn upload_form() -> String {
    format!(
        r#"<div class="card">
<h1>Which Pokémon is this?</h1>
<form method="POST" action="/" enctype="multipart/form-data">
  <input type="file" name="{field}" accept="image/png,image/jpeg,image/bmp,image/gif">
  <p class="hint">PNG, JPEG, BMP or GIF. The image is center-cropped to a square before classification.</p>
  <button type="submit" class="btn btn-primary">Classify</button>
</form>
</div>"#,
        field = FILE_FIELD
    )
}

// ---------------------------------------------------------------------------
// POST /
// ---------------------------------------------------------------------------

pub fn handle_post(request: &HttpRequest, app: &App) -> HttpResponse {
    match accept(request, app) {
        Ok(name) => {
            log::info!("accepted upload as {}", name);
            routes::redirect(&format!("/predict/{}", name))
        }
        Err(e) => match flash_message(&e) {
            Some(message) => {
                log::warn!("rejected upload: {}", e);
                routes::redirect_with_flash("/", &message)
            }
            None => {
                log::error!("upload failed: {}", e);
                routes::server_error()
            }
        },
    }
}

/// Validate, store and normalize.  Returns the stored file name.
fn accept(request: &HttpRequest, app: &App) -> Result<String> {
    let config = &app.config;
    if request.oversized {
        return Err(AppError::UploadTooLarge { limit: config.max_upload_bytes });
    }

    let file = request
        .header("Content-Type")
        .and_then(extract_boundary)
        .and_then(|boundary| file_field(&request.body, &boundary, FILE_FIELD));

    let upload = validate_upload(file, &config.allowed_extensions, config.max_upload_bytes)?;
    let path = store_upload(&config.upload_dir, &upload)?;

    if let Err(e) = make_thumbnail(&path, config.thumbnail_size) {
        discard(path);
        return Err(e);
    }
    Ok(upload.stored_name)
}

fn discard(path: PathBuf) {
    if let Err(e) = std::fs::remove_file(&path) {
        log::warn!("could not remove rejected upload {}: {}", path.display(), e);
    }
}

/// Message for failures the user can fix by uploading something else.
/// `None` means the failure is ours and ends in the error page.
fn flash_message(err: &AppError) -> Option<String> {
    match err {
        AppError::DisallowedExtension(_) => Some("File extension not allowed.".into()),
        AppError::DecodeFailure { .. } => Some("The uploaded file is not a readable image.".into()),
        e if e.is_user_facing() => Some(e.to_string()),
        _ => None,
    }
}
