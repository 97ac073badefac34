//! Geodetic reference definitions
//!
//! Immutable datum, ellipsoid and prime meridian definitions, the
//! Bursa-Wolf parameter model linking geodetic datums, and the shift
//! path search over that graph.

pub mod bursa_wolf;
pub mod ellipsoid;
pub mod shift;
pub mod wkt;

use serde::{Deserialize, Serialize};

pub use bursa_wolf::BursaWolfParameters;
pub use ellipsoid::Ellipsoid;
pub use shift::affine_shift;
pub use wkt::ToWkt;

/// A prime meridian, in degrees east of Greenwich
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimeMeridian {
    /// Meridian name
    pub name: String,
    /// Longitude relative to Greenwich, in degrees
    pub greenwich_longitude: f64,
}

impl PrimeMeridian {
    /// Create a prime meridian
    pub fn new(name: impl Into<String>, greenwich_longitude: f64) -> Self {
        Self {
            name: name.into(),
            greenwich_longitude,
        }
    }

    /// The Greenwich meridian
    pub fn greenwich() -> Self {
        Self::new("Greenwich", 0.0)
    }
}

/// A geodetic datum: an ellipsoid anchored by a prime meridian, with the
/// known Bursa-Wolf shifts toward other datums
#[derive(Debug, Clone)]
pub struct GeodeticDatum {
    /// Datum name; shift edges refer to datums by this name
    pub name: String,
    /// The datum's ellipsoid
    pub ellipsoid: Ellipsoid,
    /// The datum's prime meridian
    pub prime_meridian: PrimeMeridian,
    /// Known shifts from this datum toward others
    shifts: Vec<BursaWolfParameters>,
}

impl GeodeticDatum {
    /// Create a datum with no known shifts
    pub fn new(
        name: impl Into<String>,
        ellipsoid: Ellipsoid,
        prime_meridian: PrimeMeridian,
    ) -> Self {
        Self {
            name: name.into(),
            ellipsoid,
            prime_meridian,
            shifts: Vec::new(),
        }
    }

    /// The World Geodetic System 1984 datum
    pub fn wgs84() -> Self {
        Self::new("WGS84", Ellipsoid::wgs84(), PrimeMeridian::greenwich())
    }

    /// Add a known shift toward another datum
    pub fn with_shift(mut self, parameters: BursaWolfParameters) -> Self {
        self.shifts.push(parameters);
        self
    }

    /// The known shifts, in registration order
    pub fn shifts(&self) -> &[BursaWolfParameters] {
        &self.shifts
    }
}

/// Vertical datum realization types, with their well-known-text codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalDatumType {
    /// Heights above the geoid
    Geoidal,
    /// Heights above the ellipsoid
    Ellipsoidal,
    /// Depths below a reference surface
    Depth,
    /// Anything else
    Other,
}

impl VerticalDatumType {
    /// The numeric code used in WKT output
    pub fn wkt_code(&self) -> u32 {
        match self {
            Self::Other => 2000,
            Self::Ellipsoidal => 2002,
            Self::Geoidal => 2005,
            Self::Depth => 2006,
        }
    }
}

/// A vertical reference frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalDatum {
    /// Datum name
    pub name: String,
    /// Realization type
    pub datum_type: VerticalDatumType,
}

impl VerticalDatum {
    /// Create a vertical datum
    pub fn new(name: impl Into<String>, datum_type: VerticalDatumType) -> Self {
        Self {
            name: name.into(),
            datum_type,
        }
    }
}

/// A local engineering reference frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringDatum {
    /// Datum name
    pub name: String,
}

impl EngineeringDatum {
    /// Create an engineering datum
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_datum() {
        let datum = GeodeticDatum::wgs84();
        assert_eq!(datum.name, "WGS84");
        assert_eq!(datum.ellipsoid, Ellipsoid::wgs84());
        assert_eq!(datum.prime_meridian, PrimeMeridian::greenwich());
        assert!(datum.shifts().is_empty());
    }

    #[test]
    fn test_vertical_datum_codes() {
        assert_eq!(VerticalDatumType::Geoidal.wkt_code(), 2005);
        assert_eq!(VerticalDatumType::Ellipsoidal.wkt_code(), 2002);
        assert_eq!(VerticalDatumType::Depth.wkt_code(), 2006);
        assert_eq!(VerticalDatumType::Other.wkt_code(), 2000);
    }

    #[test]
    fn test_prime_meridian() {
        let paris = PrimeMeridian::new("Paris", 2.5969213);
        assert_eq!(paris.name, "Paris");
        assert!(paris.greenwich_longitude > 0.0);
        assert_eq!(PrimeMeridian::greenwich().greenwich_longitude, 0.0);
    }
}
