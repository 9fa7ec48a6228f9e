use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between an upload and a rendered chart.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No file was uploaded.")]
    NoFileProvided,

    #[error("File extension not allowed: {0:?}")]
    DisallowedExtension(String),

    #[error("Upload exceeds the {limit} byte limit.")]
    UploadTooLarge { limit: usize },

    #[error("Could not make a {target}x{target} thumbnail from a {width}x{height} image.")]
    ThumbnailFailure { width: u32, height: u32, target: u32 },

    #[error("Could not decode image {path}: {source}")]
    DecodeFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Expected a {expected}x{expected} image, got {width}x{height}.")]
    ShapeMismatch { expected: u32, width: u32, height: u32 },

    #[error("Classifier failed: {0}")]
    InferenceFailure(String),

    #[error("Could not render chart: {0}")]
    Render(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Could not load model {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Kinds a handler recovers from by redirecting back with a flash
    /// message.  Everything else ends in the generic error page.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::NoFileProvided
                | AppError::DisallowedExtension(_)
                | AppError::UploadTooLarge { .. }
                | AppError::ThumbnailFailure { .. }
                | AppError::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_kinds() {
        assert!(AppError::NoFileProvided.is_user_facing());
        assert!(AppError::DisallowedExtension("exe".into()).is_user_facing());
        assert!(AppError::ThumbnailFailure { width: 0, height: 0, target: 224 }.is_user_facing());
        assert!(!AppError::InferenceFailure("boom".into()).is_user_facing());
        assert!(!AppError::ShapeMismatch { expected: 224, width: 10, height: 10 }.is_user_facing());
    }

    #[test]
    fn messages_are_readable() {
        let e = AppError::ThumbnailFailure { width: 0, height: 5, target: 224 };
        assert_eq!(e.to_string(), "Could not make a 224x224 thumbnail from a 0x5 image.");
    }
}
