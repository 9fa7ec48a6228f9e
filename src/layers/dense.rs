use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};
use serde::{Serialize, Deserialize};

/// Fully connected layer: `a = activation(x · W + b)`.
///
/// `weights` has shape `(input_size, size)` and `biases` has shape `(1, size)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction
}

impl Layer {
    /// Randomly initialised layer (Glorot uniform weights, zero biases).
    pub fn new(size: usize, input_size: usize, activation: ActivationFunction) -> Layer {
        Layer {
            size,
            weights: Matrix::glorot_uniform(input_size, size),
            biases: Matrix::zeros(1, size),
            activator: activation
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Forward pass for a single sample.  Returns `None` on a length mismatch.
    pub fn feed_from(&self, input: &[f64]) -> Option<Vec<f64>> {
        let mut z = self.weights.left_mul(input)?;
        let bias = self.biases.data.first()?;
        for (acc, b) in z.iter_mut().zip(bias) {
            *acc += b;
        }
        Some(self.activator.apply(z))
    }

    /// Checks that weights and biases agree with `size`.
    pub fn is_consistent(&self) -> bool {
        self.weights.is_well_formed()
            && self.biases.is_well_formed()
            && self.weights.cols == self.size
            && self.biases.rows == 1
            && self.biases.cols == self.size
    }
}
