//! Coordinate reprojection between EPSG-coded systems
//!
//! Pure Rust, no libproj binding: PROJ definitions come from the built-in
//! table in `geoflow_core::crs`, the transform itself is evaluated by
//! proj4rs. Geographic ends of the transform are converted between degrees
//! and radians, so collections always carry degree coordinates for
//! geographic systems.

use geo::MapCoords;
use geo_types::Coord;
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use tracing::debug;

use geoflow_core::crs::Crs;
use geoflow_core::vector::FeatureCollection;

use crate::error::{Error, Result};

/// Reproject a collection to the target CRS in place.
///
/// No-op when the collection is already in the target CRS. Fails with a
/// `Projection` error when either CRS is undefined or the transform is
/// unavailable between the two.
pub fn reproject_collection(collection: &mut FeatureCollection, target: Crs) -> Result<()> {
    if collection.crs == target {
        debug!("collection already in {target}, skipping reprojection");
        return Ok(());
    }
    let transformer = Transformer::new(collection.crs, target)?;
    for feature in collection.iter_mut() {
        if let Some(geometry) = feature.geometry.as_mut() {
            *geometry = geometry.try_map_coords(|coord| transformer.apply(coord))?;
        }
    }
    collection.crs = target;
    Ok(())
}

/// One source-to-target coordinate transform.
pub struct Transformer {
    source: Proj,
    target: Proj,
    from: Crs,
    to: Crs,
}

impl Transformer {
    pub fn new(from: Crs, to: Crs) -> Result<Self> {
        Ok(Self {
            source: build_proj(from, to, from)?,
            target: build_proj(from, to, to)?,
            from,
            to,
        })
    }

    /// Transform one coordinate.
    pub fn apply(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let mut point = (coord.x, coord.y, 0.0);
        if self.source.is_latlong() {
            point.0 = point.0.to_radians();
            point.1 = point.1.to_radians();
        }
        transform(&self.source, &self.target, &mut point).map_err(|e| self.error(e.to_string()))?;
        if self.target.is_latlong() {
            point.0 = point.0.to_degrees();
            point.1 = point.1.to_degrees();
        }
        Ok(Coord {
            x: point.0,
            y: point.1,
        })
    }

    fn error(&self, reason: String) -> Error {
        Error::Projection {
            from: self.from.to_string(),
            to: self.to.to_string(),
            reason,
        }
    }
}

fn build_proj(from: Crs, to: Crs, which: Crs) -> Result<Proj> {
    let projection_error = |reason: String| Error::Projection {
        from: from.to_string(),
        to: to.to_string(),
        reason,
    };
    let definition = which
        .proj_string()
        .map_err(|e| projection_error(e.to_string()))?;
    Proj::from_proj_string(&definition).map_err(|e| projection_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Geometry, LineString, Point, Polygon};
    use geoflow_core::Feature;

    fn lambert93_square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (652000.0, 6862000.0),
                (653000.0, 6862000.0),
                (653000.0, 6863000.0),
                (652000.0, 6863000.0),
                (652000.0, 6862000.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_noop_when_crs_matches() {
        let mut fc = FeatureCollection::new(Crs::wgs84());
        fc.push(Feature::new(Geometry::Point(Point::new(2.35, 48.85))));
        let before = fc.features[0].geometry.clone();

        reproject_collection(&mut fc, Crs::wgs84()).unwrap();

        assert_eq!(fc.features[0].geometry, before);
        assert_eq!(fc.crs, Crs::wgs84());
    }

    #[test]
    fn test_lambert93_to_wgs84() {
        let mut fc = FeatureCollection::new(Crs::from_epsg(2154));
        fc.push(Feature::new(Geometry::Polygon(lambert93_square())));

        reproject_collection(&mut fc, Crs::wgs84()).unwrap();

        assert_eq!(fc.crs, Crs::wgs84());
        let Some(Geometry::Polygon(p)) = &fc.features[0].geometry else {
            panic!("expected Polygon");
        };
        // The square sits near Paris: roughly 2.3 E, 48.8 N
        for coord in &p.exterior().0 {
            assert!((2.0..3.0).contains(&coord.x), "lon {} out of range", coord.x);
            assert!((48.0..49.5).contains(&coord.y), "lat {} out of range", coord.y);
        }
    }

    #[test]
    fn test_unknown_source_crs_fails() {
        let mut fc = FeatureCollection::new(Crs::from_epsg(0));
        fc.push(Feature::new(Geometry::Point(Point::new(0.0, 0.0))));

        let err = reproject_collection(&mut fc, Crs::wgs84()).unwrap_err();
        assert!(matches!(err, Error::Projection { .. }));
        // The collection keeps its original tag on failure
        assert_eq!(fc.crs, Crs::from_epsg(0));
    }

    #[test]
    fn test_utm_roundtrip_stability() {
        let utm31 = Crs::from_epsg(32631);
        let forward = Transformer::new(Crs::wgs84(), utm31).unwrap();
        let back = Transformer::new(utm31, Crs::wgs84()).unwrap();

        let original = Coord { x: 2.35, y: 48.85 };
        let projected = forward.apply(original).unwrap();
        let restored = back.apply(projected).unwrap();

        assert!((restored.x - original.x).abs() < 1e-6);
        assert!((restored.y - original.y).abs() < 1e-6);
    }
}
