//! Datum shift path search
//!
//! Finds an affine transform between two geodetic datums over the graph
//! of known Bursa-Wolf parameter sets: a direct edge, an inverted reverse
//! edge, or a composition through intermediate datums. "No path" is a
//! `None` result, letting callers fall back or report the datums as not
//! interoperable.

use std::collections::HashSet;

use tracing::trace;

use crate::transform::Matrix;

use super::GeodeticDatum;

/// The 4x4 affine shift matrix from `source` to `target`, or `None`
/// when no path of known parameter sets connects them
pub fn affine_shift(source: &GeodeticDatum, target: &GeodeticDatum) -> Option<Matrix> {
    if source.name == target.name {
        return Some(Matrix::identity(4));
    }
    let mut visited = HashSet::new();
    visited.insert(source.name.clone());
    search(source, target, &visited)
}

/// One step of the search.
///
/// The visited set is threaded functionally: each recursive attempt gets
/// its own extended copy, so a datum excluded on one branch stays
/// reachable from a sibling branch and no cleanup is needed.
fn search(
    source: &GeodeticDatum,
    target: &GeodeticDatum,
    visited: &HashSet<String>,
) -> Option<Matrix> {
    // direct forward edge
    for params in source.shifts() {
        if params.target.name == target.name {
            trace!(from = %source.name, to = %target.name, "direct shift edge");
            return Some(params.affine());
        }
    }

    // reverse edge, inverted
    for params in target.shifts() {
        if params.target.name == source.name {
            trace!(from = %source.name, to = %target.name, "inverted reverse edge");
            return params.affine().invert().ok();
        }
    }

    // compose through an intermediate datum
    for params in source.shifts() {
        if visited.contains(&params.target.name) {
            continue;
        }
        let mut branch = visited.clone();
        branch.insert(params.target.name.clone());
        if let Some(rest) = search(&params.target, target, &branch) {
            trace!(
                from = %source.name,
                via = %params.target.name,
                to = %target.name,
                "composed shift path"
            );
            return rest.multiply(&params.affine()).ok();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{BursaWolfParameters, Ellipsoid, PrimeMeridian};
    use std::sync::Arc;

    fn datum(name: &str) -> GeodeticDatum {
        GeodeticDatum::new(name, Ellipsoid::wgs84(), PrimeMeridian::greenwich())
    }

    #[test]
    fn test_same_datum_is_identity() {
        let wgs84 = datum("WGS84");
        let shift = affine_shift(&wgs84, &wgs84).unwrap();
        assert!(shift.is_identity(0.0));
    }

    #[test]
    fn test_direct_edge() {
        let wgs84 = Arc::new(datum("WGS84"));
        let ed50 = datum("ED50")
            .with_shift(BursaWolfParameters::translation(-87.0, -98.0, -121.0, Arc::clone(&wgs84)));

        let shift = affine_shift(&ed50, &wgs84).unwrap();
        assert_eq!(shift.get(0, 3), -87.0);
    }

    #[test]
    fn test_reverse_edge_is_inverted() {
        let wgs84 = Arc::new(datum("WGS84"));
        let ed50 = datum("ED50")
            .with_shift(BursaWolfParameters::translation(-87.0, -98.0, -121.0, Arc::clone(&wgs84)));

        // from WGS84 to ED50 only the ED50 -> WGS84 edge exists
        let shift = affine_shift(&wgs84, &ed50).unwrap();
        assert!((shift.get(0, 3) - 87.0).abs() < 1e-9);
        assert!((shift.get(2, 3) - 121.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_hop_through_common_intermediate() {
        let wgs84 = Arc::new(datum("WGS84"));
        let nad27 = datum("NAD27")
            .with_shift(BursaWolfParameters::translation(-8.0, 160.0, 176.0, Arc::clone(&wgs84)));
        let ed50 = datum("ED50")
            .with_shift(BursaWolfParameters::translation(-87.0, -98.0, -121.0, Arc::clone(&wgs84)));

        // NAD27 -> WGS84 -> ED50 (second leg inverted)
        let shift = affine_shift(&nad27, &ed50).unwrap();
        assert!((shift.get(0, 3) - (-8.0 + 87.0)).abs() < 1e-9);
        assert!((shift.get(1, 3) - (160.0 + 98.0)).abs() < 1e-9);
        assert!((shift.get(2, 3) - (176.0 + 121.0)).abs() < 1e-9);
    }

    #[test]
    fn test_three_hop_chain() {
        let d = Arc::new(datum("D"));
        let c = Arc::new(
            datum("C").with_shift(BursaWolfParameters::translation(0.0, 0.0, 3.0, Arc::clone(&d))),
        );
        let b = Arc::new(
            datum("B").with_shift(BursaWolfParameters::translation(0.0, 2.0, 0.0, Arc::clone(&c))),
        );
        let a =
            datum("A").with_shift(BursaWolfParameters::translation(1.0, 0.0, 0.0, Arc::clone(&b)));

        let shift = affine_shift(&a, &d).unwrap();
        assert!((shift.get(0, 3) - 1.0).abs() < 1e-12);
        assert!((shift.get(1, 3) - 2.0).abs() < 1e-12);
        assert!((shift.get(2, 3) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_path_is_none() {
        let lonely = datum("Lonely");
        let wgs84 = datum("WGS84");
        assert!(affine_shift(&lonely, &wgs84).is_none());
    }

    #[test]
    fn test_cycle_terminates() {
        // A -> B and B -> A edges form a cycle; searching for an
        // unreachable target must terminate with None
        let a_plain = Arc::new(datum("A"));
        let b = Arc::new(
            datum("B").with_shift(BursaWolfParameters::translation(
                0.0,
                0.0,
                -1.0,
                Arc::clone(&a_plain),
            )),
        );
        let a =
            datum("A").with_shift(BursaWolfParameters::translation(0.0, 0.0, 1.0, Arc::clone(&b)));

        let unreachable = datum("Unreachable");
        assert!(affine_shift(&a, &unreachable).is_none());
    }
}
