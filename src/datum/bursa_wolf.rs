//! Bursa-Wolf parameters
//!
//! Seven-parameter description of the affine relation between two
//! geodetic datums: geocentric translation in metres, rotation in
//! arc-seconds, and scale in parts per million.

use std::sync::Arc;

use crate::transform::Matrix;

use super::GeodeticDatum;

/// Arc-seconds to radians
const SEC_TO_RAD: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// A Bursa-Wolf parameter set naming its target datum
#[derive(Debug, Clone)]
pub struct BursaWolfParameters {
    /// X-axis translation in metres
    pub dx: f64,
    /// Y-axis translation in metres
    pub dy: f64,
    /// Z-axis translation in metres
    pub dz: f64,
    /// X-axis rotation in arc-seconds
    pub ex: f64,
    /// Y-axis rotation in arc-seconds
    pub ey: f64,
    /// Z-axis rotation in arc-seconds
    pub ez: f64,
    /// Scale difference in parts per million
    pub ppm: f64,
    /// The datum these parameters shift toward
    pub target: Arc<GeodeticDatum>,
}

impl BursaWolfParameters {
    /// An all-zero (identity) parameter set toward a target datum
    pub fn identity(target: Arc<GeodeticDatum>) -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
            ex: 0.0,
            ey: 0.0,
            ez: 0.0,
            ppm: 0.0,
            target,
        }
    }

    /// A translation-only parameter set
    pub fn translation(dx: f64, dy: f64, dz: f64, target: Arc<GeodeticDatum>) -> Self {
        Self {
            dx,
            dy,
            dz,
            ..Self::identity(target)
        }
    }

    /// A full seven-parameter set
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dx: f64,
        dy: f64,
        dz: f64,
        ex: f64,
        ey: f64,
        ez: f64,
        ppm: f64,
        target: Arc<GeodeticDatum>,
    ) -> Self {
        Self {
            dx,
            dy,
            dz,
            ex,
            ey,
            ez,
            ppm,
            target,
        }
    }

    /// Whether every parameter is zero
    pub fn is_identity(&self) -> bool {
        self.is_translation() && self.dx == 0.0 && self.dy == 0.0 && self.dz == 0.0
    }

    /// Whether only the translation terms are non-zero
    pub fn is_translation(&self) -> bool {
        self.ex == 0.0 && self.ey == 0.0 && self.ez == 0.0 && self.ppm == 0.0
    }

    /// The 4x4 homogeneous affine matrix for these parameters
    /// (position-vector rotation convention)
    pub fn affine(&self) -> Matrix {
        let s = 1.0 + self.ppm / 1e6;
        let rs = SEC_TO_RAD * s;
        let mut m = Matrix::identity(4);
        m.set(0, 0, s);
        m.set(0, 1, -self.ez * rs);
        m.set(0, 2, self.ey * rs);
        m.set(0, 3, self.dx);
        m.set(1, 0, self.ez * rs);
        m.set(1, 1, s);
        m.set(1, 2, -self.ex * rs);
        m.set(1, 3, self.dy);
        m.set(2, 0, -self.ey * rs);
        m.set(2, 1, self.ex * rs);
        m.set(2, 2, s);
        m.set(2, 3, self.dz);
        m
    }
}

impl std::fmt::Display for BursaWolfParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TOWGS84[{:?}, {:?}, {:?}, {:?}, {:?}, {:?}, {:?}]",
            self.dx, self.dy, self.dz, self.ex, self.ey, self.ez, self.ppm
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wgs84() -> Arc<GeodeticDatum> {
        Arc::new(GeodeticDatum::wgs84())
    }

    #[test]
    fn test_identity_predicates() {
        let p = BursaWolfParameters::identity(wgs84());
        assert!(p.is_identity());
        assert!(p.is_translation());
        assert!(p.affine().is_identity(0.0));
    }

    #[test]
    fn test_translation_only() {
        let p = BursaWolfParameters::translation(-87.0, -98.0, -121.0, wgs84());
        assert!(!p.is_identity());
        assert!(p.is_translation());

        let m = p.affine();
        assert_eq!(m.get(0, 3), -87.0);
        assert_eq!(m.get(1, 3), -98.0);
        assert_eq!(m.get(2, 3), -121.0);
        assert_eq!(m.get(0, 0), 1.0);
    }

    #[test]
    fn test_rotation_terms_are_antisymmetric() {
        let p = BursaWolfParameters::new(0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 0.0, wgs84());
        let m = p.affine();
        assert!((m.get(0, 1) + m.get(1, 0)).abs() < 1e-18);
        assert!((m.get(0, 2) + m.get(2, 0)).abs() < 1e-18);
        assert!((m.get(1, 2) + m.get(2, 1)).abs() < 1e-18);
        // one arc-second is about 4.85e-6 radians
        assert!((m.get(1, 0) - 3.0 * SEC_TO_RAD).abs() < 1e-12);
    }

    #[test]
    fn test_scale_applies_to_diagonal() {
        let p = BursaWolfParameters::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, wgs84());
        let m = p.affine();
        let s = 1.0 + 2.0 / 1e6;
        assert_eq!(m.get(0, 0), s);
        assert_eq!(m.get(1, 1), s);
        assert_eq!(m.get(2, 2), s);
    }

    #[test]
    fn test_display_uses_towgs84_keyword() {
        let p = BursaWolfParameters::translation(1.0, 2.0, 3.0, wgs84());
        let text = p.to_string();
        assert!(text.starts_with("TOWGS84[1.0, 2.0, 3.0"));
    }
}
