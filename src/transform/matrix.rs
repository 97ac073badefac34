//! Small dense matrices
//!
//! Row-major matrices sized for the transform pipeline: Jacobians and
//! homogeneous affine matrices up to 4x4. Inversion is Gauss-Jordan with
//! partial pivoting; a singular matrix is a typed non-invertibility
//! failure, not a panic.

use crate::error::{Error, Result};

/// A dense row-major matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a zero matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create an identity matrix
    pub fn identity(size: usize) -> Self {
        let mut matrix = Self::zeros(size, size);
        for i in 0..size {
            matrix.set(i, i, 1.0);
        }
        matrix
    }

    /// Create from row-major element slices
    pub fn from_rows(rows: &[&[f64]]) -> Result<Self> {
        let row_count = rows.len();
        let col_count = rows.first().map(|r| r.len()).unwrap_or(0);
        if row_count == 0 || col_count == 0 {
            return Err(Error::Argument("matrix cannot be empty".to_string()));
        }
        let mut data = Vec::with_capacity(row_count * col_count);
        for row in rows {
            if row.len() != col_count {
                return Err(Error::Argument("matrix rows have differing lengths".to_string()));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: row_count,
            cols: col_count,
            data,
        })
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at (row, col)
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Set element at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Whether the matrix is square
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Whether the matrix is an identity within a tolerance
    pub fn is_identity(&self, tolerance: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        for row in 0..self.rows {
            for col in 0..self.cols {
                let expected = if row == col { 1.0 } else { 0.0 };
                if (self.get(row, col) - expected).abs() > tolerance {
                    return false;
                }
            }
        }
        true
    }

    /// Matrix product `self * other`
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(Error::Argument(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut product = Matrix::zeros(self.rows, other.cols);
        for row in 0..self.rows {
            for col in 0..other.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.get(row, k) * other.get(k, col);
                }
                product.set(row, col, sum);
            }
        }
        Ok(product)
    }

    /// Apply to a column vector
    pub fn multiply_vector(&self, vector: &[f64]) -> Result<Vec<f64>> {
        if vector.len() != self.cols {
            return Err(Error::Argument(format!(
                "vector length {} does not match {} columns",
                vector.len(),
                self.cols
            )));
        }
        let mut out = vec![0.0; self.rows];
        for (row, slot) in out.iter_mut().enumerate() {
            let mut sum = 0.0;
            for col in 0..self.cols {
                sum += self.get(row, col) * vector[col];
            }
            *slot = sum;
        }
        Ok(out)
    }

    /// Invert via Gauss-Jordan elimination with partial pivoting
    pub fn invert(&self) -> Result<Matrix> {
        if !self.is_square() {
            return Err(Error::Argument(format!(
                "cannot invert non-square {}x{} matrix",
                self.rows, self.cols
            )));
        }
        let n = self.rows;
        let mut work = self.clone();
        let mut inverse = Matrix::identity(n);

        for pivot in 0..n {
            // pick the largest magnitude pivot in the remaining rows
            let mut best_row = pivot;
            let mut best = work.get(pivot, pivot).abs();
            for row in pivot + 1..n {
                let candidate = work.get(row, pivot).abs();
                if candidate > best {
                    best = candidate;
                    best_row = row;
                }
            }
            if best < f64::EPSILON {
                return Err(Error::NoninvertibleTransform(
                    "matrix is singular".to_string(),
                ));
            }
            work.swap_rows(pivot, best_row);
            inverse.swap_rows(pivot, best_row);

            let scale = 1.0 / work.get(pivot, pivot);
            for col in 0..n {
                work.set(pivot, col, work.get(pivot, col) * scale);
                inverse.set(pivot, col, inverse.get(pivot, col) * scale);
            }

            for row in 0..n {
                if row == pivot {
                    continue;
                }
                let factor = work.get(row, pivot);
                if factor == 0.0 {
                    continue;
                }
                for col in 0..n {
                    work.set(row, col, work.get(row, col) - factor * work.get(pivot, col));
                    inverse.set(
                        row,
                        col,
                        inverse.get(row, col) - factor * inverse.get(pivot, col),
                    );
                }
            }
        }

        Ok(inverse)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for col in 0..self.cols {
            self.data.swap(a * self.cols + col, b * self.cols + col);
        }
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.rows {
            for col in 0..self.cols {
                if col > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{:?}", self.get(row, col))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
