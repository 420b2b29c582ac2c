//! Geometry validation and best-effort repair
//!
//! Invalid geometries (self-intersections, unclosed or degenerate rings,
//! repeated vertices) are detected with geo's validation rules and coerced
//! toward validity in place: rings are closed and deduplicated, degenerate
//! interior rings dropped, winding order normalized. Repair never fails the
//! pipeline; what cannot be fixed is logged and kept.

use geo::algorithm::validation::Validation;
use geo::orient::{Direction, Orient};
use geo::{Geometry, LineString, MultiLineString, MultiPolygon, Polygon};
use tracing::warn;

use geoflow_core::vector::FeatureCollection;

/// Outcome of a repair pass
#[derive(Debug, Clone, Copy, Default)]
pub struct RepairReport {
    /// Geometries that failed validation
    pub invalid: usize,
    /// Geometries still invalid after the fix-up
    pub unresolved: usize,
}

/// Validate every geometry and repair the invalid ones in place.
pub fn repair_collection(collection: &mut FeatureCollection) -> RepairReport {
    let mut report = RepairReport::default();
    for feature in collection.iter_mut() {
        let Some(geometry) = feature.geometry.as_mut() else {
            continue;
        };
        if geometry.is_valid() {
            continue;
        }
        report.invalid += 1;
        let fixed = fix_geometry(geometry);
        if !fixed.is_valid() {
            report.unresolved += 1;
        }
        *geometry = fixed;
    }
    if report.invalid > 0 {
        warn!(
            "{} invalid geometries detected, {} repaired",
            report.invalid,
            report.invalid - report.unresolved
        );
    }
    report
}

fn fix_geometry(geometry: &Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::LineString(ls) => Geometry::LineString(dedup_line(ls)),
        Geometry::MultiLineString(mls) => {
            let lines: Vec<LineString<f64>> = mls
                .0
                .iter()
                .map(dedup_line)
                .filter(|ls| ls.0.len() >= 2)
                .collect();
            if lines.is_empty() {
                geometry.clone()
            } else {
                Geometry::MultiLineString(MultiLineString::new(lines))
            }
        }
        Geometry::Polygon(p) => Geometry::Polygon(fix_polygon(p)),
        Geometry::MultiPolygon(mp) => {
            let polygons: Vec<Polygon<f64>> = mp
                .0
                .iter()
                .map(fix_polygon)
                .filter(|p| p.exterior().0.len() >= 4)
                .collect();
            if polygons.is_empty() {
                geometry.clone()
            } else {
                Geometry::MultiPolygon(MultiPolygon::new(polygons))
            }
        }
        other => other.clone(),
    }
}

fn fix_polygon(polygon: &Polygon<f64>) -> Polygon<f64> {
    let exterior = close_ring(dedup_line(polygon.exterior()));
    let interiors: Vec<LineString<f64>> = polygon
        .interiors()
        .iter()
        .map(|ring| close_ring(dedup_line(ring)))
        .filter(|ring| ring.0.len() >= 4)
        .collect();
    Polygon::new(exterior, interiors).orient(Direction::Default)
}

/// Remove consecutive duplicate coordinates.
fn dedup_line(line: &LineString<f64>) -> LineString<f64> {
    let mut coords = line.0.clone();
    coords.dedup();
    LineString::new(coords)
}

fn close_ring(mut ring: LineString<f64>) -> LineString<f64> {
    if ring.0.len() >= 3 && ring.0.first() != ring.0.last() {
        let first = ring.0[0];
        ring.0.push(first);
    }
    ring
}
