use rand::Rng;
use serde::{Serialize, Deserialize};
use std::ops::{Sub, Mul};

use crate::error::{EngineError, Result};

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

    /// Samples every entry uniformly from `[-half_range, half_range)`.
    pub fn uniform<R: Rng + ?Sized>(rows: usize, cols: usize, half_range: f64, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = rng.gen::<f64>() * 2.0 * half_range - half_range;
            }
        }

        res
    }

    /// A 1×n row vector.
    pub fn row(values: &[f64]) -> Matrix {
        Matrix { rows: 1, cols: values.len(), data: vec![values.to_vec()] }
    }

    /// Builds a matrix from caller-supplied rows, rejecting empty or ragged input.
    pub fn try_from_rows(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let cols = data.first().map(|r| r.len()).ok_or(EngineError::RaggedMatrix)?;
        if cols == 0 || data.iter().any(|r| r.len() != cols) {
            return Err(EngineError::RaggedMatrix);
        }
        Ok(Matrix { rows: data.len(), cols, data })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Checks both the declared shape and the backing storage, so a matrix
    /// deserialized with lying `rows`/`cols` fields is caught too.
    pub fn expect_shape(&self, what: &'static str, expected: (usize, usize)) -> Result<()> {
        let storage_ok = self.data.len() == self.rows
            && self.data.iter().all(|r| r.len() == self.cols);
        if !storage_ok {
            return Err(EngineError::RaggedMatrix);
        }
        if self.shape() != expected {
            return Err(EngineError::ShapeMismatch { what, expected, found: self.shape() });
        }
        Ok(())
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().flatten().all(|x| x.is_finite())
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix::from_data(
            (self.data)
                .clone()
                .into_iter()
                .map(|row| row.into_iter().map(|x| functor(x)).collect())
                .collect()
        )
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.shape(), other.shape(), "Matrices are of incorrect sizes");
        let data = self.data.iter().zip(other.data.iter())
            .map(|(row_a, row_b)| {
                row_a.iter().zip(row_b.iter()).map(|(x, y)| x * y).collect()
            })
            .collect();
        Matrix::from_data(data)
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data[0].len(),
            data
        }
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] - rhs.data[i][j];
            }
        }

        res
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res =  Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;

                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }

                res.data[i][j] = sum;
            }
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn row_times_matrix_is_dot_product_per_column() {
        let x = Matrix::row(&[1.0, 2.0]);
        let w = Matrix::from_data(vec![vec![1.0, 0.5], vec![-1.0, 0.25]]);
        let z = x * w;
        assert_eq!(z.shape(), (1, 2));
        assert_eq!(z.data[0], vec![-1.0, 1.0]);
    }

    #[test]
    fn uniform_stays_inside_half_range() {
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let m = Matrix::uniform(30, 30, 0.2, &mut rng);
        assert!(m.data.iter().flatten().all(|x| (-0.2..0.2).contains(x)));
    }

    #[test]
    fn try_from_rows_rejects_ragged_and_empty() {
        assert!(matches!(
            Matrix::try_from_rows(vec![vec![1.0, 2.0], vec![3.0]]),
            Err(EngineError::RaggedMatrix)
        ));
        assert!(matches!(Matrix::try_from_rows(vec![]), Err(EngineError::RaggedMatrix)));
    }

    #[test]
    fn expect_shape_catches_lying_dimensions() {
        let mut m = Matrix::zeros(3, 4);
        assert!(m.expect_shape("w", (3, 4)).is_ok());
        assert!(matches!(
            m.expect_shape("w", (4, 1)),
            Err(EngineError::ShapeMismatch { expected: (4, 1), found: (3, 4), .. })
        ));
        m.data[1].pop();
        assert!(matches!(m.expect_shape("w", (3, 4)), Err(EngineError::RaggedMatrix)));
    }

    #[test]
    #[should_panic(expected = "incorrect sizes")]
    fn sub_panics_on_shape_mismatch() {
        let _ = Matrix::zeros(2, 2) - Matrix::zeros(3, 2);
    }
}
