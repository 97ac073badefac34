//! Linear transforms
//!
//! The identity transform, the one-dimensional linear transform, and the
//! general matrix-backed affine transform.

use crate::error::{Error, Result};

use super::matrix::Matrix;
use super::{check_dimension, MathTransform};

/// The identity transform over a fixed number of dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityTransform {
    dimensions: usize,
}

impl IdentityTransform {
    /// Create an identity over `dimensions` ordinates
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl MathTransform for IdentityTransform {
    fn source_dimensions(&self) -> usize {
        self.dimensions
    }

    fn target_dimensions(&self) -> usize {
        self.dimensions
    }

    fn transform_point(&self, src: &[f64], dst: &mut [f64]) -> Result<()> {
        check_dimension("source point", src.len(), self.dimensions)?;
        check_dimension("target point", dst.len(), self.dimensions)?;
        dst.copy_from_slice(src);
        Ok(())
    }

    fn derivative(&self, _point: &[f64]) -> Result<Matrix> {
        Ok(Matrix::identity(self.dimensions))
    }

    fn inverse(&self) -> Result<Box<dyn MathTransform>> {
        Ok(Box::new(*self))
    }

    fn is_identity(&self) -> bool {
        true
    }

    fn to_wkt(&self) -> String {
        format!(
            "PARAM_MT[\"Affine\", PARAMETER[\"num_row\", {}], PARAMETER[\"num_col\", {}]]",
            self.dimensions + 1,
            self.dimensions + 1
        )
    }
}

/// One-dimensional linear transform `y = scale * x + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransform1D {
    /// Multiplication factor
    pub scale: f64,
    /// Additive offset
    pub offset: f64,
}

impl LinearTransform1D {
    /// Create a transform with a scale and offset.
    ///
    /// A zero scale collapses every input to `offset`; the result is a
    /// constant transform with no inverse.
    pub fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }
}

impl MathTransform for LinearTransform1D {
    fn source_dimensions(&self) -> usize {
        1
    }

    fn target_dimensions(&self) -> usize {
        1
    }

    fn transform_point(&self, src: &[f64], dst: &mut [f64]) -> Result<()> {
        check_dimension("source point", src.len(), 1)?;
        check_dimension("target point", dst.len(), 1)?;
        dst[0] = self.scale * src[0] + self.offset;
        Ok(())
    }

    fn derivative(&self, _point: &[f64]) -> Result<Matrix> {
        Matrix::from_rows(&[&[self.scale]])
    }

    fn inverse(&self) -> Result<Box<dyn MathTransform>> {
        if self.scale == 0.0 {
            return Err(Error::NoninvertibleTransform(
                "constant transform (scale is zero)".to_string(),
            ));
        }
        Ok(Box::new(Self::new(1.0 / self.scale, -self.offset / self.scale)))
    }

    fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.offset == 0.0
    }

    fn to_wkt(&self) -> String {
        format!(
            "PARAM_MT[\"Affine\", PARAMETER[\"num_row\", 2], PARAMETER[\"num_col\", 2], PARAMETER[\"elt_0_0\", {:?}], PARAMETER[\"elt_0_1\", {:?}]]",
            self.scale, self.offset
        )
    }
}

/// Matrix-backed affine transform in homogeneous coordinates.
///
/// The matrix has `target_dimensions + 1` rows and
/// `source_dimensions + 1` columns; the last row is `0 ... 0 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix,
}

impl AffineTransform {
    /// Create from a homogeneous matrix.
    ///
    /// The last row must be `0 ... 0 1`.
    pub fn from_matrix(matrix: Matrix) -> Result<Self> {
        let last = matrix.rows() - 1;
        for col in 0..matrix.cols() {
            let expected = if col == matrix.cols() - 1 { 1.0 } else { 0.0 };
            if matrix.get(last, col) != expected {
                return Err(Error::Argument(
                    "affine matrix must have a 0...0 1 last row".to_string(),
                ));
            }
        }
        Ok(Self { matrix })
    }

    /// 2D translation
    pub fn translation(tx: f64, ty: f64) -> Self {
        let mut matrix = Matrix::identity(3);
        matrix.set(0, 2, tx);
        matrix.set(1, 2, ty);
        Self { matrix }
    }

    /// 2D scale about the origin
    pub fn scale(sx: f64, sy: f64) -> Self {
        let mut matrix = Matrix::identity(3);
        matrix.set(0, 0, sx);
        matrix.set(1, 1, sy);
        Self { matrix }
    }

    /// The homogeneous matrix
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }
}

impl MathTransform for AffineTransform {
    fn source_dimensions(&self) -> usize {
        self.matrix.cols() - 1
    }

    fn target_dimensions(&self) -> usize {
        self.matrix.rows() - 1
    }

    fn transform_point(&self, src: &[f64], dst: &mut [f64]) -> Result<()> {
        let sd = self.source_dimensions();
        let td = self.target_dimensions();
        check_dimension("source point", src.len(), sd)?;
        check_dimension("target point", dst.len(), td)?;
        for row in 0..td {
            let mut sum = self.matrix.get(row, sd);
            for col in 0..sd {
                sum += self.matrix.get(row, col) * src[col];
            }
            dst[row] = sum;
        }
        Ok(())
    }

    fn derivative(&self, _point: &[f64]) -> Result<Matrix> {
        let sd = self.source_dimensions();
        let td = self.target_dimensions();
        let mut jacobian = Matrix::zeros(td, sd);
        for row in 0..td {
            for col in 0..sd {
                jacobian.set(row, col, self.matrix.get(row, col));
            }
        }
        Ok(jacobian)
    }

    fn inverse(&self) -> Result<Box<dyn MathTransform>> {
        let inverted = self.matrix.invert()?;
        Ok(Box::new(Self { matrix: inverted }))
    }

    fn is_identity(&self) -> bool {
        self.matrix.is_identity(0.0)
    }

    fn to_wkt(&self) -> String {
        let mut wkt = format!(
            "PARAM_MT[\"Affine\", PARAMETER[\"num_row\", {}], PARAMETER[\"num_col\", {}]",
            self.matrix.rows(),
            self.matrix.cols()
        );
        for row in 0..self.matrix.rows() {
            for col in 0..self.matrix.cols() {
                let value = self.matrix.get(row, col);
                let default = if row == col { 1.0 } else { 0.0 };
                if value != default {
                    wkt.push_str(&format!(
                        ", PARAMETER[\"elt_{}_{}\", {:?}]",
                        row, col, value
                    ));
                }
            }
        }
        wkt.push(']');
        wkt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let id = IdentityTransform::new(2);
        assert!(id.is_identity());
        assert_eq!(id.apply(&[3.0, 4.0]).unwrap(), vec![3.0, 4.0]);
        assert!(id.derivative(&[0.0, 0.0]).unwrap().is_identity(0.0));
    }

    #[test]
    fn test_linear_round_trip() {
        let t = LinearTransform1D::new(2.5, -3.0);
        let inverse = t.inverse().unwrap();
        let x = 17.25;
        let y = t.apply(&[x]).unwrap();
        let back = inverse.apply(&y).unwrap();
        assert!((back[0] - x).abs() < 1e-12);
    }

    #[test]
    fn test_linear_zero_scale_not_invertible() {
        let constant = LinearTransform1D::new(0.0, 5.0);
        assert_eq!(constant.apply(&[123.0]).unwrap(), vec![5.0]);
        assert!(matches!(
            constant.inverse(),
            Err(Error::NoninvertibleTransform(_))
        ));
    }

    #[test]
    fn test_linear_derivative() {
        let t = LinearTransform1D::new(2.5, -3.0);
        let jacobian = t.derivative(&[0.0]).unwrap();
        assert_eq!(jacobian.get(0, 0), 2.5);
    }

    #[test]
    fn test_affine_translation() {
        let t = AffineTransform::translation(10.0, -5.0);
        assert_eq!(t.apply(&[1.0, 1.0]).unwrap(), vec![11.0, -4.0]);
    }

    #[test]
    fn test_affine_scale() {
        let t = AffineTransform::scale(2.0, 3.0);
        assert_eq!(t.apply(&[1.0, 1.0]).unwrap(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_affine_inverse() {
        let t = AffineTransform::translation(10.0, 20.0);
        let inverse = t.inverse().unwrap();
        assert_eq!(inverse.apply(&[10.0, 20.0]).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_affine_rejects_bad_last_row() {
        let mut matrix = Matrix::identity(3);
        matrix.set(2, 0, 1.0);
        assert!(AffineTransform::from_matrix(matrix).is_err());
    }

    #[test]
    fn test_affine_derivative_drops_translation() {
        let t = AffineTransform::translation(10.0, 20.0);
        let jacobian = t.derivative(&[0.0, 0.0]).unwrap();
        assert!(jacobian.is_identity(0.0));
    }

    #[test]
    fn test_wkt_keywords() {
        let t = AffineTransform::translation(10.0, 0.0);
        let wkt = t.to_wkt();
        assert!(wkt.starts_with("PARAM_MT[\"Affine\""));
        assert!(wkt.contains("elt_0_2"));
    }
}
