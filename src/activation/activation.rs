use serde::{Serialize, Deserialize};
use std::f64::consts::{E, PI};

/// Activation functions understood by saved models.
///
/// The variant set mirrors what older model files may contain, so every
/// variant must keep deserializing even though only the forward direction is
/// implemented here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Vector-valued; see `apply`.
    Softmax,
    Tanh,
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Gelu,
    Swish,
}

impl ActivationFunction {
    /// Element-wise activation.  `Softmax` has no element-wise form and is
    /// treated as the identity here; use `apply` for whole layers.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity | ActivationFunction::Softmax => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { x } else { alpha * (E.powf(x) - 1.0) }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Swish => x / (1.0 + E.powf(-x)),
        }
    }

    /// Applies the activation to a full pre-activation vector.
    pub fn apply(&self, z: Vec<f64>) -> Vec<f64> {
        match self {
            ActivationFunction::Softmax => softmax(&z),
            _ => z.into_iter().map(|x| self.function(x)).collect(),
        }
    }
}

/// Numerically stable softmax (max-shifted).
pub fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / z.len().max(1) as f64; z.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one_and_preserves_order() {
        let p = ActivationFunction::Softmax.apply(vec![2.0, 1.0, 0.1]);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(p[0] > p[1] && p[1] > p[2]);
    }

    #[test]
    fn softmax_survives_huge_logits() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn elementwise_activations() {
        assert_eq!(ActivationFunction::ReLU.apply(vec![-1.0, 2.0]), vec![0.0, 2.0]);
        assert!((ActivationFunction::Sigmoid.function(0.0) - 0.5).abs() < 1e-12);
        assert_eq!(ActivationFunction::LeakyReLU { alpha: 0.1 }.function(-2.0), -0.2);
    }
}
