//! Coordinate transforms
//!
//! The [`MathTransform`] contract: N-dimensional point transforms over
//! packed interleaved ordinate slices, Jacobian derivatives, and typed
//! inversion. Concrete strategies live in the submodules; compose them
//! with [`concatenated::concatenate`].

pub mod concatenated;
pub mod linear;
pub mod matrix;
pub mod molodensky;

use std::fmt::Debug;

use crate::error::{Error, Result};

pub use concatenated::{concatenate, ConcatenatedTransform, ConcatenatedTransform2D};
pub use linear::{AffineTransform, IdentityTransform, LinearTransform1D};
pub use matrix::Matrix;
pub use molodensky::{ensure_longitude_in_range, AbridgedMolodenskyTransform};

/// An N-dimensional coordinate transform
///
/// Bulk operations take packed interleaved ordinates (x0, y0, x1, y1, ...)
/// and transform whole point runs; the in-place variant handles
/// overlapping source and destination ranges by iterating in the safe
/// direction.
pub trait MathTransform: Debug + Send + Sync {
    /// Number of source ordinates per point
    fn source_dimensions(&self) -> usize;

    /// Number of target ordinates per point
    fn target_dimensions(&self) -> usize;

    /// Transform a single point; `src` and `dst` must match the source
    /// and target dimensions
    fn transform_point(&self, src: &[f64], dst: &mut [f64]) -> Result<()>;

    /// The Jacobian matrix at a point (target_dimensions rows by
    /// source_dimensions columns)
    fn derivative(&self, point: &[f64]) -> Result<Matrix>;

    /// A transform undoing this one, or a typed failure when no inverse
    /// exists
    fn inverse(&self) -> Result<Box<dyn MathTransform>>;

    /// Whether this transform maps every point to itself
    fn is_identity(&self) -> bool {
        false
    }

    /// Well-known-text rendering
    fn to_wkt(&self) -> String;

    /// Transform a packed run of points from `src` into `dst`
    fn transform(&self, src: &[f64], dst: &mut [f64]) -> Result<()> {
        let sd = self.source_dimensions();
        let td = self.target_dimensions();
        if src.len() % sd != 0 {
            return Err(Error::Argument(format!(
                "source length {} is not a multiple of {} ordinates",
                src.len(),
                sd
            )));
        }
        let count = src.len() / sd;
        if dst.len() != count * td {
            return Err(Error::Argument(format!(
                "destination length {} does not hold {} points of {} ordinates",
                dst.len(),
                count,
                td
            )));
        }
        for i in 0..count {
            self.transform_point(&src[i * sd..(i + 1) * sd], &mut dst[i * td..(i + 1) * td])?;
        }
        Ok(())
    }

    /// Transform `count` points within one buffer, reading at `src_off`
    /// and writing at `dst_off`.
    ///
    /// Ranges may overlap; iteration order is chosen so every source
    /// point is read before it is overwritten, mirroring the
    /// self-overlapping memmove discipline.
    fn transform_in_place(
        &self,
        data: &mut [f64],
        src_off: usize,
        dst_off: usize,
        count: usize,
    ) -> Result<()> {
        let sd = self.source_dimensions();
        let td = self.target_dimensions();
        if src_off + count * sd > data.len() || dst_off + count * td > data.len() {
            return Err(Error::Argument(
                "offset/count outside the ordinate buffer".to_string(),
            ));
        }

        let mut src_point = vec![0.0; sd];
        let mut dst_point = vec![0.0; td];

        let src_end = src_off + count * sd;
        let overlapping = sd == td && dst_off > src_off && dst_off < src_end;
        if sd == td && !overlapping {
            // forward pass; copying each point out first makes the exact
            // self-assignment case safe as well
            for i in 0..count {
                src_point.copy_from_slice(&data[src_off + i * sd..src_off + (i + 1) * sd]);
                self.transform_point(&src_point, &mut dst_point)?;
                data[dst_off + i * td..dst_off + (i + 1) * td].copy_from_slice(&dst_point);
            }
        } else if overlapping {
            // destination runs ahead of the source: walk backward so
            // unread source points are not clobbered
            for i in (0..count).rev() {
                src_point.copy_from_slice(&data[src_off + i * sd..src_off + (i + 1) * sd]);
                self.transform_point(&src_point, &mut dst_point)?;
                data[dst_off + i * td..dst_off + (i + 1) * td].copy_from_slice(&dst_point);
            }
        } else {
            // differing dimensions: stage the result and copy once
            let mut staged = vec![0.0; count * td];
            for i in 0..count {
                src_point.copy_from_slice(&data[src_off + i * sd..src_off + (i + 1) * sd]);
                self.transform_point(&src_point, &mut staged[i * td..(i + 1) * td])?;
            }
            data[dst_off..dst_off + count * td].copy_from_slice(&staged);
        }
        Ok(())
    }

    /// Transform a single point into a fresh vector
    fn apply(&self, point: &[f64]) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.target_dimensions()];
        self.transform_point(point, &mut out)?;
        Ok(out)
    }
}

/// Check that a point slice matches an expected dimension
pub(crate) fn check_dimension(what: &str, len: usize, expected: usize) -> Result<()> {
    if len != expected {
        return Err(Error::Argument(format!(
            "{} has {} ordinates, expected {}",
            what, len, expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_transform() {
        let scale = LinearTransform1D::new(2.0, 1.0);
        let src = [0.0, 1.0, 2.0];
        let mut dst = [0.0; 3];
        scale.transform(&src, &mut dst).unwrap();
        assert_eq!(dst, [1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_bulk_transform_length_checks() {
        let t = AffineTransform::translation(1.0, 0.0);
        let src = [0.0, 0.0, 1.0];
        let mut dst = [0.0; 4];
        assert!(t.transform(&src, &mut dst).is_err());

        let src = [0.0, 0.0];
        let mut dst = [0.0; 3];
        assert!(t.transform(&src, &mut dst).is_err());
    }

    #[test]
    fn test_in_place_identical_ranges() {
        let scale = LinearTransform1D::new(3.0, 0.0);
        let mut data = [1.0, 2.0, 3.0];
        scale.transform_in_place(&mut data, 0, 0, 3).unwrap();
        assert_eq!(data, [3.0, 6.0, 9.0]);
    }

    #[test]
    fn test_in_place_destination_ahead_of_source() {
        let scale = LinearTransform1D::new(2.0, 0.0);
        // dst range [1..4) overlaps src range [0..3)
        let mut data = [1.0, 2.0, 3.0, 0.0];
        scale.transform_in_place(&mut data, 0, 1, 3).unwrap();
        assert_eq!(&data[1..4], &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_in_place_destination_behind_source() {
        let scale = LinearTransform1D::new(2.0, 0.0);
        let mut data = [0.0, 1.0, 2.0, 3.0];
        scale.transform_in_place(&mut data, 1, 0, 3).unwrap();
        assert_eq!(&data[0..3], &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_in_place_bounds_check() {
        let scale = LinearTransform1D::new(2.0, 0.0);
        let mut data = [0.0; 2];
        assert!(scale.transform_in_place(&mut data, 0, 1, 2).is_err());
    }
}
