//! Abridged Molodensky datum shift
//!
//! Closed-form first-order datum shift operating directly on geographic
//! coordinates (longitude, latitude in degrees, ellipsoidal height in
//! metres). No iteration and no closed-form inverse; asking for the
//! inverse is a typed failure.

use crate::datum::Ellipsoid;
use crate::error::{Error, Result};

use super::matrix::Matrix;
use super::{check_dimension, MathTransform};

/// Step used for the finite-difference Jacobian
const DERIVATIVE_STEP: f64 = 1e-6;

/// Wrap a longitude into the ±180° range.
///
/// Values already in range (the ±180° endpoints included) pass through
/// unchanged, so the wrap is idempotent.
pub fn ensure_longitude_in_range(mut lon: f64) -> f64 {
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

/// Abridged Molodensky transform between two geodetic datums
///
/// Ordinate order is (longitude°, latitude°, height m) in and out.
#[derive(Debug, Clone)]
pub struct AbridgedMolodenskyTransform {
    dx: f64,
    dy: f64,
    dz: f64,
    /// Source semi-major axis
    a: f64,
    /// Source flattening
    f: f64,
    /// Source first eccentricity squared
    e2: f64,
    /// Target minus source semi-major axis
    da: f64,
    /// a*df + f*da, the combined flattening/axis correction term
    adf: f64,
}

impl AbridgedMolodenskyTransform {
    /// Create a shift from `source` to `target` with geocentric
    /// translation (dx, dy, dz) in metres
    pub fn new(dx: f64, dy: f64, dz: f64, source: &Ellipsoid, target: &Ellipsoid) -> Self {
        let a = source.semi_major;
        let f = source.flattening();
        let da = target.semi_major - a;
        let df = target.flattening() - f;
        Self {
            dx,
            dy,
            dz,
            a,
            f,
            e2: source.eccentricity_squared(),
            da,
            adf: a * df + f * da,
        }
    }

    /// Shift a single (lon°, lat°, h) coordinate
    fn shift(&self, lon: f64, lat: f64, height: f64) -> (f64, f64, f64) {
        let lam = lon.to_radians();
        let phi = lat.to_radians();
        let (sin_lam, cos_lam) = lam.sin_cos();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let sin2_phi = sin_phi * sin_phi;

        let rn = self.a / (1.0 - self.e2 * sin2_phi).sqrt();
        let rm = self.a * (1.0 - self.e2) / (1.0 - self.e2 * sin2_phi).powf(1.5);

        let d_lat = (self.dz * cos_phi - sin_phi * (self.dy * sin_lam + self.dx * cos_lam)
            + self.adf * (2.0 * phi).sin())
            / rm;
        let d_lon = (self.dy * cos_lam - self.dx * sin_lam) / (rn * cos_phi);
        let d_height = self.dx * cos_phi * cos_lam
            + self.dy * cos_phi * sin_lam
            + self.dz * sin_phi
            + self.adf * sin2_phi
            - self.da;

        let shifted_lat = lat + d_lat.to_degrees();
        let shifted_lon = lon + d_lon.to_degrees();
        let shifted_height = height + d_height;

        // The series approximation is invalid past the poles: an
        // out-of-range latitude snaps to the pole itself, longitude 0.
        if shifted_lat.abs() > 90.0 {
            return (0.0, 90.0_f64.copysign(shifted_lat), shifted_height);
        }
        (
            ensure_longitude_in_range(shifted_lon),
            shifted_lat,
            shifted_height,
        )
    }
}

impl MathTransform for AbridgedMolodenskyTransform {
    fn source_dimensions(&self) -> usize {
        3
    }

    fn target_dimensions(&self) -> usize {
        3
    }

    fn transform_point(&self, src: &[f64], dst: &mut [f64]) -> Result<()> {
        check_dimension("source point", src.len(), 3)?;
        check_dimension("target point", dst.len(), 3)?;
        let (lon, lat, height) = self.shift(src[0], src[1], src[2]);
        dst[0] = lon;
        dst[1] = lat;
        dst[2] = height;
        Ok(())
    }

    /// Central finite-difference Jacobian; the shift has no tidy
    /// analytic derivative worth carrying
    fn derivative(&self, point: &[f64]) -> Result<Matrix> {
        check_dimension("point", point.len(), 3)?;
        let mut jacobian = Matrix::zeros(3, 3);
        for col in 0..3 {
            let mut forward = [point[0], point[1], point[2]];
            let mut backward = forward;
            forward[col] += DERIVATIVE_STEP;
            backward[col] -= DERIVATIVE_STEP;
            let f = self.shift(forward[0], forward[1], forward[2]);
            let b = self.shift(backward[0], backward[1], backward[2]);
            let f = [f.0, f.1, f.2];
            let b = [b.0, b.1, b.2];
            for row in 0..3 {
                jacobian.set(row, col, (f[row] - b[row]) / (2.0 * DERIVATIVE_STEP));
            }
        }
        Ok(jacobian)
    }

    fn inverse(&self) -> Result<Box<dyn MathTransform>> {
        Err(Error::NoninvertibleTransform(
            "abridged Molodensky shift has no closed-form inverse".to_string(),
        ))
    }

    fn to_wkt(&self) -> String {
        let b = self.a * (1.0 - self.f);
        let tgt_a = self.a + self.da;
        let tgt_f = self.f + (self.adf - self.f * self.da) / self.a;
        let tgt_b = tgt_a * (1.0 - tgt_f);
        format!(
            "PARAM_MT[\"Abridged_Molodenski\", PARAMETER[\"dim\", 3], \
             PARAMETER[\"dx\", {:?}], PARAMETER[\"dy\", {:?}], PARAMETER[\"dz\", {:?}], \
             PARAMETER[\"src_semi_major\", {:?}], PARAMETER[\"src_semi_minor\", {:?}], \
             PARAMETER[\"tgt_semi_major\", {:?}], PARAMETER[\"tgt_semi_minor\", {:?}]]",
            self.dx, self.dy, self.dz, self.a, b, tgt_a, tgt_b
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wgs84_to_ed50() -> AbridgedMolodenskyTransform {
        // WGS84 -> ED50 (International 1924), approximate European shift
        AbridgedMolodenskyTransform::new(
            87.0,
            98.0,
            121.0,
            &Ellipsoid::wgs84(),
            &Ellipsoid::international_1924(),
        )
    }

    #[test]
    fn test_shift_magnitude_is_plausible() {
        let t = wgs84_to_ed50();
        let out = t.apply(&[2.337, 48.858, 50.0]).unwrap();
        // European datum shifts move points on the order of seconds of arc
        let d_lon = (out[0] - 2.337).abs();
        let d_lat = (out[1] - 48.858).abs();
        assert!(d_lon > 1e-5 && d_lon < 0.01, "d_lon = {}", d_lon);
        assert!(d_lat > 1e-5 && d_lat < 0.01, "d_lat = {}", d_lat);
    }

    #[test]
    fn test_zero_shift_same_ellipsoid_is_noop() {
        let e = Ellipsoid::wgs84();
        let t = AbridgedMolodenskyTransform::new(0.0, 0.0, 0.0, &e, &e);
        let out = t.apply(&[12.5, -33.9, 100.0]).unwrap();
        assert!((out[0] - 12.5).abs() < 1e-12);
        assert!((out[1] + 33.9).abs() < 1e-12);
        assert!((out[2] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_latitude_overflow_snaps_to_pole() {
        // near the pole the -sin(lat)*dx*cos(lon) term dominates; a large
        // negative dx pushes the shifted latitude past 90°
        let t = AbridgedMolodenskyTransform::new(
            -10_000.0,
            0.0,
            0.0,
            &Ellipsoid::wgs84(),
            &Ellipsoid::wgs84(),
        );
        let out = t.apply(&[45.0, 89.9999, 0.0]).unwrap();
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 90.0);
    }

    #[test]
    fn test_no_inverse() {
        let t = wgs84_to_ed50();
        assert!(matches!(
            t.inverse(),
            Err(Error::NoninvertibleTransform(_))
        ));
    }

    #[test]
    fn test_derivative_near_identity_for_zero_shift() {
        let e = Ellipsoid::wgs84();
        let t = AbridgedMolodenskyTransform::new(0.0, 0.0, 0.0, &e, &e);
        let jacobian = t.derivative(&[10.0, 45.0, 0.0]).unwrap();
        assert!(jacobian.is_identity(1e-6));
    }

    #[test]
    fn test_wkt_keyword() {
        let wkt = wgs84_to_ed50().to_wkt();
        assert!(wkt.starts_with("PARAM_MT[\"Abridged_Molodenski\""));
        assert!(wkt.contains("src_semi_major"));
    }

    #[test]
    fn test_ensure_in_range_wraps() {
        assert_eq!(ensure_longitude_in_range(190.0), -170.0);
        assert_eq!(ensure_longitude_in_range(-190.0), 170.0);
        assert_eq!(ensure_longitude_in_range(540.0), 180.0);
        assert_eq!(ensure_longitude_in_range(180.0), 180.0);
        assert_eq!(ensure_longitude_in_range(-180.0), -180.0);
        assert_eq!(ensure_longitude_in_range(0.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_ensure_in_range_is_idempotent(lon in -100_000.0..100_000.0f64) {
            let once = ensure_longitude_in_range(lon);
            let twice = ensure_longitude_in_range(once);
            prop_assert_eq!(once, twice);
            prop_assert!((-180.0..=180.0).contains(&once));
        }
    }
}
