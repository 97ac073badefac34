//! Transform concatenation
//!
//! Composes two transforms: the first is applied, then the second, to
//! points and (by the chain rule) to derivatives. A 2D specialization
//! serves the common planar case and verifies its legs really are 2D
//! rather than silently producing wrong numbers.

use std::sync::Arc;

use crate::error::{Error, Result};

use super::matrix::Matrix;
use super::{check_dimension, MathTransform};

/// Compose two transforms into one, collapsing identities.
///
/// Fails when the first transform's target dimension does not feed the
/// second's source dimension.
pub fn concatenate(
    first: Arc<dyn MathTransform>,
    second: Arc<dyn MathTransform>,
) -> Result<Arc<dyn MathTransform>> {
    if first.target_dimensions() != second.source_dimensions() {
        return Err(Error::Argument(format!(
            "cannot concatenate: first transform targets {} dimensions, second expects {}",
            first.target_dimensions(),
            second.source_dimensions()
        )));
    }
    if first.is_identity() {
        return Ok(second);
    }
    if second.is_identity() {
        return Ok(first);
    }
    if first.source_dimensions() == 2
        && first.target_dimensions() == 2
        && second.source_dimensions() == 2
        && second.target_dimensions() == 2
    {
        return Ok(Arc::new(ConcatenatedTransform2D::new(first, second)));
    }
    Ok(Arc::new(ConcatenatedTransform::new(first, second)))
}

/// General N-dimensional concatenation: apply `first`, then `second`
#[derive(Debug, Clone)]
pub struct ConcatenatedTransform {
    first: Arc<dyn MathTransform>,
    second: Arc<dyn MathTransform>,
}

impl ConcatenatedTransform {
    /// Create without identity collapsing; prefer [`concatenate`]
    pub fn new(first: Arc<dyn MathTransform>, second: Arc<dyn MathTransform>) -> Self {
        Self { first, second }
    }

    /// The first (innermost) step
    pub fn first(&self) -> &Arc<dyn MathTransform> {
        &self.first
    }

    /// The second (outermost) step
    pub fn second(&self) -> &Arc<dyn MathTransform> {
        &self.second
    }
}

impl MathTransform for ConcatenatedTransform {
    fn source_dimensions(&self) -> usize {
        self.first.source_dimensions()
    }

    fn target_dimensions(&self) -> usize {
        self.second.target_dimensions()
    }

    fn transform_point(&self, src: &[f64], dst: &mut [f64]) -> Result<()> {
        let mid = self.first.apply(src)?;
        self.second.transform_point(&mid, dst)
    }

    /// Chain rule: J = J2(T1(p)) * J1(p)
    fn derivative(&self, point: &[f64]) -> Result<Matrix> {
        let j1 = self.first.derivative(point)?;
        let mid = self.first.apply(point)?;
        let j2 = self.second.derivative(&mid)?;
        j2.multiply(&j1)
    }

    fn inverse(&self) -> Result<Box<dyn MathTransform>> {
        let first_inv: Arc<dyn MathTransform> = Arc::from(self.second.inverse()?);
        let second_inv: Arc<dyn MathTransform> = Arc::from(self.first.inverse()?);
        Ok(Box::new(ConcatenatedTransform::new(first_inv, second_inv)))
    }

    fn to_wkt(&self) -> String {
        format!(
            "CONCAT_MT[{}, {}]",
            self.first.to_wkt(),
            self.second.to_wkt()
        )
    }
}

/// Two-dimensional concatenation specialization.
///
/// Exists for the planar fast path; [`ConcatenatedTransform2D::is_valid`]
/// confirms both legs are 2-in/2-out, and transforms fail loudly when the
/// check does not hold.
#[derive(Debug, Clone)]
pub struct ConcatenatedTransform2D {
    first: Arc<dyn MathTransform>,
    second: Arc<dyn MathTransform>,
}

impl ConcatenatedTransform2D {
    /// Create from two legs; dimension fitness is checked at use
    pub fn new(first: Arc<dyn MathTransform>, second: Arc<dyn MathTransform>) -> Self {
        Self { first, second }
    }

    /// Whether both legs are strictly two-dimensional
    pub fn is_valid(&self) -> bool {
        self.first.source_dimensions() == 2
            && self.first.target_dimensions() == 2
            && self.second.source_dimensions() == 2
            && self.second.target_dimensions() == 2
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::Argument(
                "2D concatenation built over non-2D transforms".to_string(),
            ))
        }
    }
}

impl MathTransform for ConcatenatedTransform2D {
    fn source_dimensions(&self) -> usize {
        2
    }

    fn target_dimensions(&self) -> usize {
        2
    }

    fn transform_point(&self, src: &[f64], dst: &mut [f64]) -> Result<()> {
        self.ensure_valid()?;
        check_dimension("source point", src.len(), 2)?;
        check_dimension("target point", dst.len(), 2)?;
        let mut mid = [0.0; 2];
        self.first.transform_point(src, &mut mid)?;
        self.second.transform_point(&mid, dst)
    }

    fn derivative(&self, point: &[f64]) -> Result<Matrix> {
        self.ensure_valid()?;
        let j1 = self.first.derivative(point)?;
        let mid = self.first.apply(point)?;
        let j2 = self.second.derivative(&mid)?;
        j2.multiply(&j1)
    }

    fn inverse(&self) -> Result<Box<dyn MathTransform>> {
        self.ensure_valid()?;
        let first_inv: Arc<dyn MathTransform> = Arc::from(self.second.inverse()?);
        let second_inv: Arc<dyn MathTransform> = Arc::from(self.first.inverse()?);
        Ok(Box::new(ConcatenatedTransform2D::new(first_inv, second_inv)))
    }

    fn to_wkt(&self) -> String {
        format!(
            "CONCAT_MT[{}, {}]",
            self.first.to_wkt(),
            self.second.to_wkt()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::linear::{AffineTransform, IdentityTransform, LinearTransform1D};

    #[test]
    fn test_translate_then_scale() {
        // translate by (10, 0), then scale by 2: (1, 1) -> (22, 2)
        let translate: Arc<dyn MathTransform> = Arc::new(AffineTransform::translation(10.0, 0.0));
        let scale: Arc<dyn MathTransform> = Arc::new(AffineTransform::scale(2.0, 2.0));
        let combined = concatenate(translate, scale).unwrap();

        assert_eq!(combined.apply(&[1.0, 1.0]).unwrap(), vec![22.0, 2.0]);
    }

    #[test]
    fn test_2d_specialization_is_selected() {
        let translate: Arc<dyn MathTransform> = Arc::new(AffineTransform::translation(10.0, 0.0));
        let scale: Arc<dyn MathTransform> = Arc::new(AffineTransform::scale(2.0, 2.0));
        let combined = concatenate(translate, scale).unwrap();
        assert_eq!(combined.source_dimensions(), 2);
        assert_eq!(combined.target_dimensions(), 2);
        assert!(combined.to_wkt().starts_with("CONCAT_MT["));
    }

    #[test]
    fn test_identity_collapsing() {
        let id: Arc<dyn MathTransform> = Arc::new(IdentityTransform::new(2));
        let scale: Arc<dyn MathTransform> = Arc::new(AffineTransform::scale(2.0, 2.0));
        let combined = concatenate(id, Arc::clone(&scale)).unwrap();
        // the identity leg disappears entirely
        assert_eq!(combined.apply(&[3.0, 4.0]).unwrap(), vec![6.0, 8.0]);
        assert!(!combined.to_wkt().starts_with("CONCAT_MT["));
    }

    #[test]
    fn test_dimension_mismatch_fails() {
        let one_d: Arc<dyn MathTransform> = Arc::new(LinearTransform1D::new(2.0, 0.0));
        let two_d: Arc<dyn MathTransform> = Arc::new(AffineTransform::scale(2.0, 2.0));
        assert!(matches!(
            concatenate(one_d, two_d),
            Err(Error::Argument(_))
        ));
    }

    #[test]
    fn test_chain_rule_derivative() {
        let translate: Arc<dyn MathTransform> = Arc::new(AffineTransform::translation(10.0, 0.0));
        let scale: Arc<dyn MathTransform> = Arc::new(AffineTransform::scale(2.0, 3.0));
        let combined = concatenate(translate, scale).unwrap();

        let jacobian = combined.derivative(&[1.0, 1.0]).unwrap();
        assert_eq!(jacobian.get(0, 0), 2.0);
        assert_eq!(jacobian.get(1, 1), 3.0);
        assert_eq!(jacobian.get(0, 1), 0.0);
    }

    #[test]
    fn test_inverse_round_trip() {
        let translate: Arc<dyn MathTransform> = Arc::new(AffineTransform::translation(10.0, -4.0));
        let scale: Arc<dyn MathTransform> = Arc::new(AffineTransform::scale(2.0, 5.0));
        let combined = concatenate(translate, scale).unwrap();
        let inverse = combined.inverse().unwrap();

        let point = [7.5, -2.25];
        let there = combined.apply(&point).unwrap();
        let back = inverse.apply(&there).unwrap();
        assert!((back[0] - point[0]).abs() < 1e-12);
        assert!((back[1] - point[1]).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_2d_concatenation_fails_loudly() {
        let three_d: Arc<dyn MathTransform> = Arc::new(IdentityTransform::new(3));
        let direct = ConcatenatedTransform2D::new(Arc::clone(&three_d), three_d);
        assert!(!direct.is_valid());
        let mut dst = [0.0; 2];
        assert!(direct.transform_point(&[1.0, 2.0], &mut dst).is_err());
    }

    #[test]
    fn test_1d_concatenation_uses_generic_path() {
        let a: Arc<dyn MathTransform> = Arc::new(LinearTransform1D::new(2.0, 1.0));
        let b: Arc<dyn MathTransform> = Arc::new(LinearTransform1D::new(3.0, 0.0));
        let combined = concatenate(a, b).unwrap();
        // (2x + 1) * 3
        assert_eq!(combined.apply(&[2.0]).unwrap(), vec![15.0]);
        let jacobian = combined.derivative(&[2.0]).unwrap();
        assert_eq!(jacobian.get(0, 0), 6.0);
    }
}
