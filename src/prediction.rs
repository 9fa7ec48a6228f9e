use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};

use crate::classifier::{Classifier, ImageTensor};
use crate::error::{AppError, Result};

/// Decodes a stored thumbnail and runs it through the classifier.
///
/// Built once at startup and shared by every request.
#[derive(Clone)]
pub struct PredictionService {
    classifier: Arc<dyn Classifier>,
    side: u32,
    label_count: usize,
}

impl PredictionService {
    pub fn new(classifier: Arc<dyn Classifier>, side: u32, label_count: usize) -> PredictionService {
        PredictionService { classifier, side, label_count }
    }

    pub fn predict_file(&self, path: &Path) -> Result<Vec<f64>> {
        let reader = image::io::Reader::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(display_name(path)),
            _ => AppError::Io(e),
        })?;
        let img = reader
            .with_guessed_format()?
            .decode()
            .map_err(|source| AppError::DecodeFailure { path: path.to_path_buf(), source })?;
        self.predict_image(&img)
    }

    pub fn predict_image(&self, img: &DynamicImage) -> Result<Vec<f64>> {
        let tensor = image_to_tensor(img, self.side)?;
        let probabilities = self.classifier.predict(&tensor)?;

        if probabilities.len() != self.label_count {
            return Err(AppError::InferenceFailure(format!(
                "classifier returned {} values for {} labels",
                probabilities.len(),
                self.label_count
            )));
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(AppError::InferenceFailure("classifier returned a non-finite value".into()));
        }
        Ok(probabilities)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Turns a `side`×`side` image into a `(1, side, side, 3)` tensor in [0, 1].
///
/// Single-channel images (with or without alpha) are replicated into R, G
/// and B; images with alpha keep only their color channels.
pub fn image_to_tensor(img: &DynamicImage, side: u32) -> Result<ImageTensor> {
    let (width, height) = img.dimensions();
    if width != side || height != side {
        return Err(AppError::ShapeMismatch { expected: side, width, height });
    }

    let data: Vec<f64> = if img.color().channel_count() < 3 {
        img.to_luma8()
            .pixels()
            .flat_map(|p| {
                let v = p.0[0] as f64 / 255.0;
                [v, v, v]
            })
            .collect()
    } else {
        img.to_rgb8()
            .pixels()
            .flat_map(|p| p.0.map(|c| c as f64 / 255.0))
            .collect()
    };

    Ok(ImageTensor { side, data })
}
