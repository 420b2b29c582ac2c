//! Coordinate precision reduction on serialized GeoJSON
//!
//! Runs after full serialization, on the generic JSON tree rather than the
//! typed geometry model: rings inside polygons inside multi-geometries are
//! just nested arrays here, so the pass is agnostic to geometry type. The
//! rounding is idempotent.

use serde_json::Value;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{Error, Result};

/// Default number of decimal places kept (~0.1 m at the equator).
pub const DEFAULT_PRECISION: u32 = 6;

/// Round every number in a nested coordinate array to `precision` decimals,
/// preserving structure and ordering exactly.
pub fn round_coords(value: &mut Value, precision: u32) {
    match value {
        Value::Number(number) => {
            // Integral coordinates are already exact
            if number.is_i64() || number.is_u64() {
                return;
            }
            if let Some(f) = number.as_f64() {
                if let Some(rounded) = serde_json::Number::from_f64(round_to(f, precision)) {
                    *value = Value::Number(rounded);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                round_coords(item, precision);
            }
        }
        _ => {}
    }
}

fn round_to(x: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (x * factor).round() / factor
}

/// Round the coordinates of every feature geometry in a serialized
/// FeatureCollection document.
pub fn round_document(document: &mut Value, precision: u32) {
    let Some(features) = document.get_mut("features").and_then(Value::as_array_mut) else {
        return;
    };
    for feature in features {
        if let Some(coordinates) = feature
            .get_mut("geometry")
            .and_then(|geometry| geometry.get_mut("coordinates"))
        {
            round_coords(coordinates, precision);
        }
    }
}

/// Rewrite a GeoJSON file with its coordinates rounded.
pub fn round_file(path: &Path, precision: u32) -> Result<()> {
    let serialization_error = |reason: String| Error::Serialization {
        path: path.to_path_buf(),
        reason,
    };
    let text = fs::read_to_string(path)?;
    let mut document: Value =
        serde_json::from_str(&text).map_err(|e| serialization_error(e.to_string()))?;
    round_document(&mut document, precision);
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &document).map_err(|e| serialization_error(e.to_string()))?;
    Ok(())
}
