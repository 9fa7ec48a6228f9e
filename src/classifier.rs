use std::path::Path;

use crate::error::{AppError, Result};
use crate::network::{InputType, Network};

/// A single-item image batch of shape `(1, side, side, 3)`, stored row-major
/// in HWC order with values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub side: u32,
    pub data: Vec<f64>,
}

impl ImageTensor {
    pub const CHANNELS: usize = 3;

    pub fn shape(&self) -> [usize; 4] {
        let side = self.side as usize;
        [1, side, side, Self::CHANNELS]
    }

    pub fn len_for(side: u32) -> usize {
        side as usize * side as usize * Self::CHANNELS
    }
}

/// The pre-trained model, seen from the outside: one tensor in, one
/// probability per label out.
///
/// Implementations are shared between request threads.  A runtime that is
/// not safe to call concurrently must serialize calls internally.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f64>>;
}

/// `Classifier` backed by a dense ferrite `Network`.
///
/// `Network::forward` borrows immutably and keeps no scratch state, so no
/// lock is needed around inference.
#[derive(Debug)]
pub struct NetworkClassifier {
    network: Network,
    side: u32,
}

impl NetworkClassifier {
    /// Loads a model file and checks it against the thumbnail size and label set.
    pub fn load(path: &Path, side: u32, labels: &[String]) -> Result<NetworkClassifier> {
        let path_str = path.to_string_lossy();
        let network = Network::load_json(&path_str).map_err(|e| AppError::ModelLoad {
            path: path_str.to_string(),
            reason: e.to_string(),
        })?;
        NetworkClassifier::from_network(network, side, labels).map_err(|e| match e {
            AppError::ModelLoad { reason, .. } => AppError::ModelLoad {
                path: path_str.to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_network(network: Network, side: u32, labels: &[String]) -> Result<NetworkClassifier> {
        let invalid = |reason: String| AppError::ModelLoad { path: "<memory>".into(), reason };

        network.validate().map_err(invalid)?;

        let expected_in = ImageTensor::len_for(side);
        let input_size = network.input_size().unwrap_or(0);
        if input_size != expected_in {
            return Err(invalid(format!(
                "model takes {} inputs, a {}x{} RGB thumbnail has {}",
                input_size, side, side, expected_in
            )));
        }
        let output_size = network.output_size().unwrap_or(0);
        if output_size != labels.len() {
            return Err(invalid(format!(
                "model has {} outputs but {} labels are configured",
                output_size,
                labels.len()
            )));
        }

        if let Some(meta) = &network.metadata {
            match &meta.input_type {
                None => {}
                Some(InputType::ImageRgb { width, height }) if *width == side && *height == side => {}
                Some(InputType::ImageRgb { width, height }) => {
                    return Err(invalid(format!(
                        "model expects {}x{} images, thumbnails are {}x{}",
                        width, height, side, side
                    )));
                }
                Some(other) => {
                    return Err(invalid(format!("model declares unsupported input {:?}", other)));
                }
            }
            if let Some(model_labels) = &meta.output_labels {
                if model_labels.as_slice() != labels {
                    return Err(invalid(format!(
                        "model labels {:?} differ from configured labels {:?}",
                        model_labels, labels
                    )));
                }
            }
        }

        Ok(NetworkClassifier { network, side })
    }
}

impl Classifier for NetworkClassifier {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f64>> {
        if input.side != self.side {
            return Err(AppError::ShapeMismatch {
                expected: self.side,
                width: input.side,
                height: input.side,
            });
        }
        self.network.forward(&input.data).ok_or_else(|| {
            AppError::InferenceFailure(format!(
                "input of length {} does not fit the model",
                input.data.len()
            ))
        })
    }
}
