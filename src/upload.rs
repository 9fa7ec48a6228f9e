//! Upload gatekeeping: extension allow-list, randomized storage names, and
//! persisting accepted bytes to the transient upload directory.

use std::path::{Path, PathBuf};

use rand::Rng;

use crate::error::{AppError, Result};

/// Characters a generated stem is drawn from.
pub const NAME_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const RANDOM_NAME_LEN: usize = 3;

/// A file part pulled out of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// An upload that passed validation, with the name it will be stored under.
#[derive(Debug, Clone)]
pub struct AcceptedUpload {
    pub stored_name: String,
    pub bytes: Vec<u8>,
}

/// Text after the last '.', or `None` for dot-less names.
pub fn extension_of(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// True iff `filename` has an extension whose lowercase form is in `allowed`.
pub fn is_allowed_file(filename: &str, allowed: &[String]) -> bool {
    match extension_of(filename) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            allowed.iter().any(|a| *a == ext)
        }
        None => false,
    }
}

/// Keeps ASCII alphanumerics only, so the result is always a safe single
/// path segment.
pub fn sanitize_extension(ext: &str) -> String {
    ext.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// `{3 random chars}.{original extension}`.
pub fn generate_random_name(filename: &str) -> String {
    generate_random_name_with(filename, &mut rand::thread_rng())
}

pub fn generate_random_name_with<R: Rng + ?Sized>(filename: &str, rng: &mut R) -> String {
    // Dot-less names keep the whole name as "extension".
    let ext = sanitize_extension(extension_of(filename).unwrap_or(filename));
    let stem: String = (0..RANDOM_NAME_LEN)
        .map(|_| NAME_CHARSET[rng.gen_range(0..NAME_CHARSET.len())] as char)
        .collect();
    format!("{}.{}", stem, ext)
}

/// Pure validation step of the upload workflow.
pub fn validate_upload(
    file: Option<UploadedFile>,
    allowed: &[String],
    max_bytes: usize,
) -> Result<AcceptedUpload> {
    let file = file.ok_or(AppError::NoFileProvided)?;
    if file.filename.is_empty() {
        return Err(AppError::NoFileProvided);
    }
    if file.bytes.len() > max_bytes {
        return Err(AppError::UploadTooLarge { limit: max_bytes });
    }
    if !is_allowed_file(&file.filename, allowed) {
        let ext = extension_of(&file.filename).unwrap_or("").to_owned();
        return Err(AppError::DisallowedExtension(ext));
    }
    Ok(AcceptedUpload {
        stored_name: generate_random_name(&file.filename),
        bytes: file.bytes,
    })
}

/// Writes the accepted bytes under `dir`, creating it if needed.
///
/// Two uploads that draw the same random name overwrite each other; with
/// 36^3 names per extension this is accepted for a transient store.
pub fn store_upload(dir: &Path, upload: &AcceptedUpload) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&upload.stored_name);
    std::fs::write(&path, &upload.bytes)?;
    Ok(path)
}

/// Resolves a client-supplied name inside `dir`, refusing anything that is
/// not a plain file name.
pub fn resolve_stored(dir: &Path, filename: &str) -> Option<PathBuf> {
    let is_plain = !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains(['/', '\\'])
        && !filename.contains("..");
    is_plain.then(|| dir.join(filename))
}
