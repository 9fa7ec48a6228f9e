use crate::{activation::activation::ActivationFunction, layers::dense::Layer};
use crate::network::metadata::ModelMetadata;
use serde::{Serialize, Deserialize};
use std::io;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    /// Builds a randomly initialised network from (size, input_size, activation) tuples.
    pub fn new(layer_specs: Vec<(usize, usize, ActivationFunction)>) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation))
            .collect();
        Network { layers, metadata: None }
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Network {
        self.metadata = Some(metadata);
        self
    }

    pub fn input_size(&self) -> Option<usize> {
        self.layers.first().map(Layer::input_size)
    }

    pub fn output_size(&self) -> Option<usize> {
        self.layers.last().map(|l| l.size)
    }

    /// Inference pass.  Takes `&self` and keeps no per-call state, so a
    /// `Network` can be shared across threads without locking.
    ///
    /// Returns `None` if `input` does not match the first layer's fan-in.
    pub fn forward(&self, input: &[f64]) -> Option<Vec<f64>> {
        let (first, rest) = self.layers.split_first()?;
        let mut current = first.feed_from(input)?;
        for layer in rest {
            current = layer.feed_from(&current)?;
        }
        Some(current)
    }

    /// Checks that every layer is internally consistent and that each
    /// layer's fan-in equals the previous layer's size.
    pub fn validate(&self) -> Result<(), String> {
        if self.layers.is_empty() {
            return Err("model has no layers".into());
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if !layer.is_consistent() {
                return Err(format!("layer {} has inconsistent weight/bias shapes", i));
            }
            if i > 0 && layer.input_size() != self.layers[i - 1].size {
                return Err(format!(
                    "layer {} expects {} inputs but layer {} produces {}",
                    i, layer.input_size(), i - 1, self.layers[i - 1].size
                ));
            }
        }
        Ok(())
    }

    /// Serializes the network to a JSON file.
    pub fn save_json(&self, path: &str) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = io::BufWriter::new(file);
        serde_json::to_writer(writer, self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> io::Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;

    #[test]
    fn forward_chains_layers() {
        let net = Network::new(vec![
            (3, 5, ActivationFunction::ReLU),
            (2, 3, ActivationFunction::Softmax),
        ]);
        assert!(net.validate().is_ok());
        let out = net.forward(&[0.1; 5]).unwrap();
        assert_eq!(out.len(), 2);
        assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(net.forward(&[0.1; 4]).is_none());
    }

    #[test]
    fn validate_catches_broken_chain() {
        let mut net = Network::new(vec![
            (3, 5, ActivationFunction::ReLU),
            (2, 3, ActivationFunction::Softmax),
        ]);
        net.layers[1].weights = Matrix::zeros(4, 2);
        assert!(net.validate().unwrap_err().contains("layer 1"));
    }

    #[test]
    fn json_roundtrip_keeps_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        let path = path.to_str().unwrap();
        let net = Network::new(vec![(2, 3, ActivationFunction::Softmax)])
            .with_metadata(ModelMetadata {
                output_labels: Some(vec!["a".into(), "b".into()]),
                ..Default::default()
            });
        net.save_json(path).unwrap();

        let loaded = Network::load_json(path).unwrap();
        assert_eq!(loaded.layers[0].weights, net.layers[0].weights);
        assert_eq!(
            loaded.metadata.and_then(|m| m.output_labels),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn models_without_metadata_still_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"{"layers":[{"size":1,"weights":{"rows":1,"cols":1,"data":[[2.0]]},
                "biases":{"rows":1,"cols":1,"data":[[0.5]]},"activator":"Identity"}]}"#,
        ).unwrap();
        let net = Network::load_json(path.to_str().unwrap()).unwrap();
        assert!(net.metadata.is_none());
        assert_eq!(net.forward(&[1.0]), Some(vec![2.5]));
    }
}
