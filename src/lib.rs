pub mod math;
pub mod activation;
pub mod layers;
pub mod network;

pub mod error;
pub mod config;
pub mod upload;
pub mod thumbnail;
pub mod classifier;
pub mod prediction;
pub mod chart;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{InputType, ModelMetadata, Network};
pub use error::AppError;
pub use config::AppConfig;
pub use classifier::{Classifier, ImageTensor, NetworkClassifier};
pub use prediction::PredictionService;
pub use chart::{ChartArtifact, ChartRenderer, SvgBarChart};
