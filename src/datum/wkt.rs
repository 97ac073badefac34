//! Well-known-text rendering for reference definitions
//!
//! Fixed keyword-per-type output (`DATUM`, `VERT_DATUM`, `LOCAL_DATUM`,
//! `PRIMEM`, `SPHEROID`, `TOWGS84`) for interoperability with WKT
//! consumers.

use super::{EngineeringDatum, Ellipsoid, GeodeticDatum, PrimeMeridian, VerticalDatum};

/// Well-known-text rendering
pub trait ToWkt {
    /// The fixed keyword this type renders under
    fn wkt_keyword(&self) -> &'static str;

    /// Render the definition as WKT
    fn to_wkt(&self) -> String;
}

impl ToWkt for Ellipsoid {
    fn wkt_keyword(&self) -> &'static str {
        "SPHEROID"
    }

    fn to_wkt(&self) -> String {
        // WKT writes 0 for a sphere's inverse flattening
        let ivf = if self.is_sphere() {
            0.0
        } else {
            self.inverse_flattening
        };
        format!(
            "SPHEROID[\"{}\", {:?}, {:?}]",
            self.name, self.semi_major, ivf
        )
    }
}

impl ToWkt for PrimeMeridian {
    fn wkt_keyword(&self) -> &'static str {
        "PRIMEM"
    }

    fn to_wkt(&self) -> String {
        format!("PRIMEM[\"{}\", {:?}]", self.name, self.greenwich_longitude)
    }
}

impl ToWkt for GeodeticDatum {
    fn wkt_keyword(&self) -> &'static str {
        "DATUM"
    }

    fn to_wkt(&self) -> String {
        // a shift whose target is WGS84 renders as the TOWGS84 element
        let towgs84 = self
            .shifts()
            .iter()
            .find(|p| p.target.name == "WGS84")
            .map(|p| format!(", {}", p))
            .unwrap_or_default();
        format!(
            "DATUM[\"{}\", {}{}]",
            self.name,
            self.ellipsoid.to_wkt(),
            towgs84
        )
    }
}

impl ToWkt for VerticalDatum {
    fn wkt_keyword(&self) -> &'static str {
        "VERT_DATUM"
    }

    fn to_wkt(&self) -> String {
        format!(
            "VERT_DATUM[\"{}\", {}]",
            self.name,
            self.datum_type.wkt_code()
        )
    }
}

impl ToWkt for EngineeringDatum {
    fn wkt_keyword(&self) -> &'static str {
        "LOCAL_DATUM"
    }

    fn to_wkt(&self) -> String {
        format!("LOCAL_DATUM[\"{}\", 0]", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{BursaWolfParameters, VerticalDatumType};
    use std::sync::Arc;

    #[test]
    fn test_spheroid_wkt() {
        let wkt = Ellipsoid::wgs84().to_wkt();
        assert_eq!(wkt, "SPHEROID[\"WGS84\", 6378137.0, 298.257223563]");
    }

    #[test]
    fn test_sphere_writes_zero_flattening() {
        let wkt = Ellipsoid::sphere(6_371_000.0).to_wkt();
        assert!(wkt.contains(", 0.0]"));
    }

    #[test]
    fn test_primem_wkt() {
        let wkt = PrimeMeridian::greenwich().to_wkt();
        assert_eq!(wkt, "PRIMEM[\"Greenwich\", 0.0]");
    }

    #[test]
    fn test_datum_wkt_without_shift() {
        let wkt = GeodeticDatum::wgs84().to_wkt();
        assert_eq!(
            wkt,
            "DATUM[\"WGS84\", SPHEROID[\"WGS84\", 6378137.0, 298.257223563]]"
        );
    }

    #[test]
    fn test_datum_wkt_with_towgs84() {
        let wgs84 = Arc::new(GeodeticDatum::wgs84());
        let ed50 = GeodeticDatum::new(
            "European Datum 1950",
            Ellipsoid::international_1924(),
            PrimeMeridian::greenwich(),
        )
        .with_shift(BursaWolfParameters::translation(-87.0, -98.0, -121.0, wgs84));

        let wkt = ed50.to_wkt();
        assert!(wkt.starts_with("DATUM[\"European Datum 1950\""));
        assert!(wkt.contains("TOWGS84[-87.0, -98.0, -121.0, 0.0, 0.0, 0.0, 0.0]"));
    }

    #[test]
    fn test_vertical_and_local_datum_keywords() {
        let vert = VerticalDatum::new("Mean Sea Level", VerticalDatumType::Geoidal);
        assert_eq!(vert.to_wkt(), "VERT_DATUM[\"Mean Sea Level\", 2005]");
        assert_eq!(vert.wkt_keyword(), "VERT_DATUM");

        let local = EngineeringDatum::new("Site Grid");
        assert_eq!(local.to_wkt(), "LOCAL_DATUM[\"Site Grid\", 0]");
        assert_eq!(local.wkt_keyword(), "LOCAL_DATUM");
    }
}
