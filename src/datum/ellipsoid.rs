//! Ellipsoid definitions
//!
//! Reference ellipsoids with their defining parameters and the derived
//! geodetic quantities the transform pipeline needs.

use serde::{Deserialize, Serialize};

/// A reference ellipsoid, defined by its semi-major axis (metres) and
/// inverse flattening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Ellipsoid name
    pub name: String,
    /// Semi-major axis in metres
    pub semi_major: f64,
    /// Inverse flattening 1/f (infinite for a sphere)
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    /// Create from semi-major axis and inverse flattening
    pub fn new(name: impl Into<String>, semi_major: f64, inverse_flattening: f64) -> Self {
        Self {
            name: name.into(),
            semi_major,
            inverse_flattening,
        }
    }

    /// Create from both semi-axes
    pub fn from_axes(name: impl Into<String>, semi_major: f64, semi_minor: f64) -> Self {
        let inverse_flattening = if semi_major == semi_minor {
            f64::INFINITY
        } else {
            semi_major / (semi_major - semi_minor)
        };
        Self {
            name: name.into(),
            semi_major,
            inverse_flattening,
        }
    }

    /// WGS 84 (EPSG ellipsoid 7030)
    pub fn wgs84() -> Self {
        Self::new("WGS84", 6_378_137.0, 298.257_223_563)
    }

    /// GRS 1980 (EPSG ellipsoid 7019)
    pub fn grs80() -> Self {
        Self::new("GRS80", 6_378_137.0, 298.257_222_101)
    }

    /// International 1924 (EPSG ellipsoid 7022)
    pub fn international_1924() -> Self {
        Self::new("International 1924", 6_378_388.0, 297.0)
    }

    /// Clarke 1866 (EPSG ellipsoid 7008)
    pub fn clarke_1866() -> Self {
        Self::from_axes("Clarke 1866", 6_378_206.4, 6_356_583.8)
    }

    /// An authalic sphere of the given radius
    pub fn sphere(radius: f64) -> Self {
        Self::from_axes("Sphere", radius, radius)
    }

    /// Flattening f = (a-b)/a
    pub fn flattening(&self) -> f64 {
        if self.inverse_flattening.is_infinite() {
            0.0
        } else {
            1.0 / self.inverse_flattening
        }
    }

    /// Semi-minor axis b = a(1-f)
    pub fn semi_minor(&self) -> f64 {
        self.semi_major * (1.0 - self.flattening())
    }

    /// First eccentricity squared e2 = 2f - f2
    pub fn eccentricity_squared(&self) -> f64 {
        let f = self.flattening();
        f * (2.0 - f)
    }

    /// First eccentricity
    pub fn eccentricity(&self) -> f64 {
        self.eccentricity_squared().sqrt()
    }

    /// Whether this ellipsoid degenerates to a sphere
    pub fn is_sphere(&self) -> bool {
        self.inverse_flattening.is_infinite()
    }

    /// Meridional radius of curvature at a latitude (radians)
    ///
    /// M = a(1-e2) / (1-e2 sin2(lat))^(3/2)
    pub fn meridional_radius(&self, lat_rad: f64) -> f64 {
        let sin_lat = lat_rad.sin();
        let e2 = self.eccentricity_squared();
        self.semi_major * (1.0 - e2) / (1.0 - e2 * sin_lat * sin_lat).powf(1.5)
    }

    /// Prime-vertical radius of curvature at a latitude (radians)
    ///
    /// N = a / sqrt(1-e2 sin2(lat))
    pub fn prime_vertical_radius(&self, lat_rad: f64) -> f64 {
        let sin_lat = lat_rad.sin();
        let e2 = self.eccentricity_squared();
        self.semi_major / (1.0 - e2 * sin_lat * sin_lat).sqrt()
    }

    /// Mean radius of curvature at a latitude (geometric mean of M and N)
    pub fn mean_radius(&self, lat_rad: f64) -> f64 {
        (self.meridional_radius(lat_rad) * self.prime_vertical_radius(lat_rad)).sqrt()
    }
}

impl std::fmt::Display for Ellipsoid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (a={:?}, 1/f={:?})",
            self.name, self.semi_major, self.inverse_flattening
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_parameters() {
        let e = Ellipsoid::wgs84();
        assert!((e.semi_major - 6_378_137.0).abs() < 1e-6);
        assert!((e.semi_minor() - 6_356_752.314_245).abs() < 1e-3);
        assert!((e.eccentricity_squared() - 0.006_694_379_990_14).abs() < 1e-12);
    }

    #[test]
    fn test_from_axes_matches_inverse_flattening() {
        let e = Ellipsoid::from_axes("test", 6_378_137.0, 6_356_752.314_245);
        assert!((e.flattening() - Ellipsoid::wgs84().flattening()).abs() < 1e-9);
    }

    #[test]
    fn test_sphere() {
        let s = Ellipsoid::sphere(6_371_000.0);
        assert!(s.is_sphere());
        assert_eq!(s.flattening(), 0.0);
        assert_eq!(s.semi_minor(), 6_371_000.0);
        assert_eq!(s.eccentricity_squared(), 0.0);
    }

    #[test]
    fn test_curvature_radii() {
        let e = Ellipsoid::wgs84();
        // at the equator N equals a and exceeds M
        let n = e.prime_vertical_radius(0.0);
        let m = e.meridional_radius(0.0);
        assert!((n - e.semi_major).abs() < 1e-6);
        assert!(n > m);
        // at the pole both approach the polar radius of curvature a2/b
        let polar = e.semi_major * e.semi_major / e.semi_minor();
        assert!((e.prime_vertical_radius(std::f64::consts::FRAC_PI_2) - polar).abs() < 1e-3);
    }

    #[test]
    fn test_grs80_close_to_wgs84() {
        let wgs84 = Ellipsoid::wgs84();
        let grs80 = Ellipsoid::grs80();
        assert_eq!(wgs84.semi_major, grs80.semi_major);
        let df = (wgs84.flattening() - grs80.flattening()).abs();
        assert!(df > 1e-12 && df < 1e-9);
    }
}
