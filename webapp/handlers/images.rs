use ferrite_vision::upload::{extension_of, is_allowed_file, resolve_stored};
use image::ImageFormat;

use crate::routes::{self, HttpResponse};
use crate::state::App;
use crate::util::form::url_decode;

/// `GET /images/{filename}`
///
/// Serves a stored upload.  The extension is checked again here so the
/// route never hands out anything but images, whatever ended up on disk.
pub fn handle(raw_name: &str, app: &App) -> HttpResponse {
    let name = url_decode(raw_name);
    if !is_allowed_file(&name, &app.config.allowed_extensions) {
        log::warn!("refused to serve {:?}: extension not allowed", name);
        return routes::redirect_with_flash("/", "File extension not allowed.");
    }
    let path = match resolve_stored(&app.config.upload_dir, &name) {
        Some(p) => p,
        None => return routes::redirect_with_flash("/", "File not found."),
    };

    match std::fs::read(&path) {
        Ok(bytes) => {
            let content_type = content_type(&name, &bytes);
            routes::bytes_response(content_type, bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            routes::redirect_with_flash("/", &format!("File not found: {}", name))
        }
        Err(e) => {
            log::error!("reading {}: {}", path.display(), e);
            routes::server_error()
        }
    }
}

/// Sniffed from the bytes; the extension only decides when sniffing fails.
pub fn content_type(filename: &str, bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => return "image/png",
        Ok(ImageFormat::Jpeg) => return "image/jpeg",
        Ok(ImageFormat::Gif) => return "image/gif",
        Ok(ImageFormat::Bmp) => return "image/bmp",
        _ => {}
    }
    match extension_of(filename).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_trusts_bytes_over_extension() {
        let png_magic = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(content_type("ABC.gif", png_magic), "image/png");
        assert_eq!(content_type("ABC.jpg", b"GIF89a"), "image/gif");
        assert_eq!(content_type("ABC.JPEG", b"?"), "image/jpeg");
        assert_eq!(content_type("ABC.bin", b"?"), "application/octet-stream");
    }
}
