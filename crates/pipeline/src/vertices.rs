//! Vertex counting across the supported geometry types
//!
//! Feeds the simplification reduction report. The match over the geometry
//! union is exhaustive.

use geo_types::Geometry;
use geoflow_core::vector::FeatureCollection;

/// Count the coordinate points of a geometry.
///
/// Polygons count the exterior ring only; interior rings are excluded from
/// the reduction figure. `None` and unsupported types count as zero.
pub fn count_vertices(geometry: Option<&Geometry<f64>>) -> usize {
    let Some(geometry) = geometry else { return 0 };
    match geometry {
        Geometry::Point(_) => 1,
        Geometry::MultiPoint(mp) => mp.0.len(),
        Geometry::LineString(ls) => ls.0.len(),
        Geometry::MultiLineString(mls) => mls.0.iter().map(|ls| ls.0.len()).sum(),
        Geometry::Polygon(p) => p.exterior().0.len(),
        Geometry::MultiPolygon(mp) => mp.0.iter().map(|p| p.exterior().0.len()).sum(),
        Geometry::Line(_)
        | Geometry::Rect(_)
        | Geometry::Triangle(_)
        | Geometry::GeometryCollection(_) => 0,
    }
}

/// Aggregate vertex count over a whole collection.
pub fn total_vertices(collection: &FeatureCollection) -> usize {
    collection
        .iter()
        .map(|feature| count_vertices(feature.geometry.as_ref()))
        .sum()
}
