//! I/O operations for reading and writing geospatial vector data

mod geojson_io;
mod gpkg;

pub use geojson_io::{read_geojson, write_geojson};
pub use gpkg::read_gpkg;

use std::path::Path;

use crate::error::{Error, Result};
use crate::vector::FeatureCollection;

/// Read a vector dataset, dispatching on the file extension.
///
/// Supported: `.gpkg` (GeoPackage) and `.geojson` / `.json` (GeoJSON).
pub fn read_vector(path: &Path) -> Result<FeatureCollection> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("gpkg") => gpkg::read_gpkg(path),
        Some("geojson") | Some("json") => geojson_io::read_geojson(path),
        _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
}
