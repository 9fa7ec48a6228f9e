use serde::{Deserialize, Serialize};

/// Describes how to interpret the input fed to a Network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputType {
    Numeric,
    /// Grayscale image of width×height, normalized to [0, 1].
    ImageGrayscale { width: u32, height: u32 },
    /// RGB image of width×height, normalized to [0, 1], flattened row-major as R,G,B,...
    ImageRgb { width: u32, height: u32 },
}

/// Optional annotations attached to a saved Network.
/// All fields are Option<> so models without metadata deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    pub input_type: Option<InputType>,
    /// Class names for the output layer, index-aligned with its neurons.
    pub output_labels: Option<Vec<String>>,
}
