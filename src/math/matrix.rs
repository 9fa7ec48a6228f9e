use rand::prelude::*;
use serde::{Serialize, Deserialize};

/// Row-major dense matrix.  Weights are stored as `(input_size, size)` so a
/// forward pass is a row vector times the matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Uniform samples in [-1, 1).
    pub fn random(rows: usize, cols: usize) -> Matrix {
        let mut rng = rand::thread_rng();
        let data = (0..rows)
            .map(|_| (0..cols).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect())
            .collect();
        Matrix { rows, cols, data }
    }

    /// Uniform samples in [-limit, limit) with `limit = sqrt(6 / (rows + cols))`.
    ///
    /// Keeps the pre-softmax logits of very wide input layers (150k inputs
    /// for a 224x224 RGB thumbnail) in a range where softmax does not
    /// saturate on the first forward pass.
    pub fn glorot_uniform(rows: usize, cols: usize) -> Matrix {
        let limit = (6.0 / (rows + cols).max(1) as f64).sqrt();
        Matrix::random(rows, cols).map(|x| x * limit)
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map(|row| row.len()).unwrap_or(0),
            data
        }
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix::from_data(
            self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect()
        )
    }

    /// Row vector times matrix: `out[j] = sum_i input[i] * self[i][j]`.
    ///
    /// Returns `None` when `input.len() != self.rows`.
    pub fn left_mul(&self, input: &[f64]) -> Option<Vec<f64>> {
        if input.len() != self.rows {
            return None;
        }
        let mut out = vec![0.0; self.cols];
        for (x, row) in input.iter().zip(&self.data) {
            if *x == 0.0 {
                continue;
            }
            for (acc, w) in out.iter_mut().zip(row) {
                *acc += x * w;
            }
        }
        Some(out)
    }

    /// True when every row has exactly `cols` entries.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.rows && self.data.iter().all(|row| row.len() == self.cols)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_mul_matches_hand_computation() {
        let m = Matrix::from_data(vec![
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![5.0, 6.0],
        ]);
        assert_eq!(m.left_mul(&[1.0, 0.0, 2.0]), Some(vec![11.0, 14.0]));
    }

    #[test]
    fn left_mul_rejects_wrong_length() {
        let m = Matrix::zeros(3, 2);
        assert_eq!(m.left_mul(&[1.0, 2.0]), None);
    }

    #[test]
    fn glorot_uniform_stays_within_limit() {
        let m = Matrix::glorot_uniform(40, 10);
        let limit = (6.0f64 / 50.0).sqrt();
        assert!(m.is_well_formed());
        assert!(m.data.iter().flatten().all(|x| x.abs() <= limit));
    }
}
