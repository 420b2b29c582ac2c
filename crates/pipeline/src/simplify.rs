//! Geometry simplification
//!
//! Two methods:
//! - Visvalingam-Whyatt with topology preservation (default): no new ring
//!   self-intersections, rings keep their minimum vertex count. The
//!   tolerance is interpreted as an effective area in squared CRS units.
//! - Douglas-Peucker: distance-based, faster, no topology guarantee.
//!
//! Run after reprojection so the tolerance is expressed in target-CRS units.

use geo::{Geometry, LineString, MultiLineString, MultiPolygon, Polygon};
use geo::{Simplify, SimplifyVwPreserve};

use geoflow_core::vector::FeatureCollection;

use crate::vertices::total_vertices;

/// Simplification method selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimplifyMethod {
    /// Visvalingam-Whyatt, topology preserving
    #[default]
    VisvalingamPreserve,
    /// Douglas-Peucker
    DouglasPeucker,
}

/// Parameters for simplification
#[derive(Debug, Clone)]
pub struct SimplifyParams {
    /// Tolerance in units of the collection's current CRS
    pub tolerance: f64,
    pub method: SimplifyMethod,
}

impl Default for SimplifyParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            method: SimplifyMethod::default(),
        }
    }
}

/// Aggregate vertex counts around a simplification pass
#[derive(Debug, Clone, Copy)]
pub struct SimplifyReport {
    pub before: usize,
    pub after: usize,
}

impl SimplifyReport {
    /// Reduction percentage; zero when there was nothing to reduce.
    pub fn reduction_pct(&self) -> f64 {
        if self.before == 0 {
            0.0
        } else {
            100.0 * (1.0 - self.after as f64 / self.before as f64)
        }
    }
}

/// Simplify every geometry of a collection in place.
///
/// Returns before/after aggregate vertex counts for the reduction report.
pub fn simplify_collection(
    collection: &mut FeatureCollection,
    params: &SimplifyParams,
) -> SimplifyReport {
    let before = total_vertices(collection);
    for feature in collection.iter_mut() {
        if let Some(geometry) = feature.geometry.take() {
            feature.geometry = Some(simplify_geometry(&geometry, params));
        }
    }
    let after = total_vertices(collection);
    SimplifyReport { before, after }
}

/// Simplify a single geometry.
///
/// Points and other non-simplifiable types pass through unchanged.
pub fn simplify_geometry(geometry: &Geometry<f64>, params: &SimplifyParams) -> Geometry<f64> {
    match geometry {
        Geometry::LineString(ls) => Geometry::LineString(simplify_line(ls, params)),
        Geometry::MultiLineString(mls) => {
            let simplified: Vec<LineString<f64>> =
                mls.0.iter().map(|ls| simplify_line(ls, params)).collect();
            Geometry::MultiLineString(MultiLineString::new(simplified))
        }
        Geometry::Polygon(p) => Geometry::Polygon(simplify_polygon(p, params)),
        Geometry::MultiPolygon(mp) => {
            let simplified: Vec<Polygon<f64>> =
                mp.0.iter().map(|p| simplify_polygon(p, params)).collect();
            Geometry::MultiPolygon(MultiPolygon::new(simplified))
        }
        other => other.clone(),
    }
}

// Tolerance <= 0 is an exact no-op: geo's VW epsilon is an area threshold
// and even a zero threshold drops strictly collinear vertices.
fn simplify_line(line: &LineString<f64>, params: &SimplifyParams) -> LineString<f64> {
    if params.tolerance <= 0.0 {
        return line.clone();
    }
    match params.method {
        SimplifyMethod::VisvalingamPreserve => line.simplify_vw_preserve(&params.tolerance),
        SimplifyMethod::DouglasPeucker => line.simplify(&params.tolerance),
    }
}

fn simplify_polygon(polygon: &Polygon<f64>, params: &SimplifyParams) -> Polygon<f64> {
    if params.tolerance <= 0.0 {
        return polygon.clone();
    }
    let simplified = match params.method {
        SimplifyMethod::VisvalingamPreserve => polygon.simplify_vw_preserve(&params.tolerance),
        SimplifyMethod::DouglasPeucker => Polygon::new(
            polygon.exterior().simplify(&params.tolerance),
            polygon
                .interiors()
                .iter()
                .map(|ring| ring.simplify(&params.tolerance))
                .collect(),
        ),
    };
    // A ring below 4 coordinates is no longer a valid ring
    if simplified.exterior().0.len() < 4 {
        return polygon.clone();
    }
    let interiors: Vec<LineString<f64>> = simplified
        .interiors()
        .iter()
        .filter(|ring| ring.0.len() >= 4)
        .cloned()
        .collect();
    Polygon::new(simplified.exterior().clone(), interiors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Point;

    fn zigzag_line() -> LineString<f64> {
        LineString::from(vec![
            (0.0, 0.0),
            (1.0, 0.1),
            (2.0, 0.0),
            (3.0, -0.05),
            (4.0, 0.0),
            (5.0, 0.2),
            (6.0, 0.0),
            (7.0, 0.0),
            (8.0, 0.0),
            (9.0, 0.0),
            (10.0, 0.0),
        ])
    }

    fn wavy_square() -> Polygon<f64> {
        let exterior = LineString::from(vec![
            (0.0, 0.0),
            (1.0, 0.1),
            (2.0, 0.0),
            (3.0, 0.05),
            (4.0, 0.0),
            (5.0, 0.0),
            (5.0, 5.0),
            (4.0, 4.9),
            (3.0, 5.0),
            (2.0, 5.1),
            (1.0, 5.0),
            (0.0, 5.0),
            (0.0, 0.0),
        ]);
        Polygon::new(exterior, vec![])
    }

    #[test]
    fn test_simplify_never_increases_vertices() {
        for method in [SimplifyMethod::VisvalingamPreserve, SimplifyMethod::DouglasPeucker] {
            let line = Geometry::LineString(zigzag_line());
            let before = crate::vertices::count_vertices(Some(&line));
            let simplified = simplify_geometry(
                &line,
                &SimplifyParams {
                    tolerance: 0.5,
                    method,
                },
            );
            let after = crate::vertices::count_vertices(Some(&simplified));
            assert!(after <= before, "{method:?}: {before} -> {after}");
        }
    }

    #[test]
    fn test_simplified_ring_stays_closed() {
        let simplified = simplify_geometry(
            &Geometry::Polygon(wavy_square()),
            &SimplifyParams {
                tolerance: 0.2,
                method: SimplifyMethod::DouglasPeucker,
            },
        );
        let Geometry::Polygon(p) = simplified else {
            panic!("expected Polygon");
        };
        assert!(p.exterior().0.len() >= 4);
        assert_eq!(p.exterior().0.first(), p.exterior().0.last());
    }

    #[test]
    fn test_zero_tolerance_is_a_noop() {
        let line = Geometry::LineString(zigzag_line());
        let simplified = simplify_geometry(
            &line,
            &SimplifyParams {
                tolerance: 0.0,
                method: SimplifyMethod::VisvalingamPreserve,
            },
        );
        assert_eq!(line, simplified);
    }

    #[test]
    fn test_point_passes_through() {
        let point = Geometry::Point(Point::new(1.0, 2.0));
        let simplified = simplify_geometry(&point, &SimplifyParams::default());
        assert_eq!(point, simplified);
    }

    #[test]
    fn test_collection_report() {
        let mut fc = FeatureCollection::new(geoflow_core::Crs::wgs84());
        fc.push(geoflow_core::Feature::new(Geometry::LineString(
            zigzag_line(),
        )));
        let report = simplify_collection(
            &mut fc,
            &SimplifyParams {
                tolerance: 0.5,
                method: SimplifyMethod::DouglasPeucker,
            },
        );
        assert_eq!(report.before, 11);
        assert!(report.after < report.before);
        assert!(report.reduction_pct() > 0.0);
    }

    #[test]
    fn test_empty_collection_reports_zero_pct() {
        let mut fc = FeatureCollection::new(geoflow_core::Crs::wgs84());
        let report = simplify_collection(&mut fc, &SimplifyParams::default());
        assert_eq!(report.before, 0);
        assert_eq!(report.reduction_pct(), 0.0);
    }
}
