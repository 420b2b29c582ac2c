//! GeoJSON reading and writing
//!
//! Reading honors the legacy `crs` foreign member (2008-style GeoJSON) so
//! that non-WGS84 sources keep their projection tag; absent that, RFC 7946
//! applies and the collection is tagged EPSG:4326. Writing produces the
//! minified `FeatureCollection` document the map front end consumes.

use geojson::{GeoJson, JsonObject};
use serde_json::Value;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::crs::Crs;
use crate::error::Result;
use crate::vector::{AttributeValue, Feature, FeatureCollection};

/// Read a GeoJSON file into a feature collection.
pub fn read_geojson(path: &Path) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path)?;
    let geojson: GeoJson = text.parse()?;
    let fc = geojson::FeatureCollection::try_from(geojson)?;

    let crs = crs_from_foreign_members(fc.foreign_members.as_ref()).unwrap_or_else(Crs::wgs84);
    let mut collection = FeatureCollection::new(crs);

    for gj_feature in fc.features {
        let mut feature = Feature::empty();
        if let Some(geometry) = gj_feature.geometry {
            feature.geometry = Some(geo_types::Geometry::<f64>::try_from(geometry)?);
        }
        if let Some(properties) = gj_feature.properties {
            for (name, value) in properties {
                feature.set_property(name, attribute_from_json(value));
            }
        }
        collection.push(feature);
    }
    Ok(collection)
}

/// Legacy `"crs": {"type": "name", "properties": {"name": ...}}` member.
fn crs_from_foreign_members(foreign: Option<&JsonObject>) -> Option<Crs> {
    let name = foreign?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    // "EPSG:2154" or "urn:ogc:def:crs:EPSG::2154"; CRS84 is WGS84 axis-swapped
    if name.ends_with("CRS84") {
        return Some(Crs::wgs84());
    }
    name.rsplit(':')
        .next()
        .and_then(|code| code.parse().ok())
        .map(Crs::from_epsg)
}

fn attribute_from_json(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                AttributeValue::Int(i)
            } else {
                AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => AttributeValue::String(s),
        // Nested structures have no scalar representation; keep their JSON text
        other => AttributeValue::String(other.to_string()),
    }
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Int(i) => Value::from(*i),
        AttributeValue::Float(f) if f.is_nan() => Value::Null,
        AttributeValue::Float(f) => Value::from(*f),
        AttributeValue::String(s) => Value::from(s.clone()),
        AttributeValue::Date(d) => Value::from(d.format("%Y-%m-%d").to_string()),
        AttributeValue::DateTime(dt) => Value::from(dt.format("%Y-%m-%d").to_string()),
    }
}

/// Serialize a feature collection to a standard GeoJSON document tree.
pub fn to_geojson_document(collection: &FeatureCollection) -> Result<Value> {
    let features: Vec<geojson::Feature> = collection
        .iter()
        .map(|feature| geojson::Feature {
            bbox: None,
            geometry: feature
                .geometry
                .as_ref()
                .map(|geom| geojson::Geometry::new(geojson::Value::from(geom))),
            id: None,
            properties: Some(
                feature
                    .properties
                    .iter()
                    .map(|(name, value)| (name.clone(), attribute_to_json(value)))
                    .collect(),
            ),
            foreign_members: None,
        })
        .collect();

    let fc = geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    Ok(serde_json::to_value(GeoJson::FeatureCollection(fc))?)
}

/// Write a feature collection as minified UTF-8 GeoJSON.
pub fn write_geojson(collection: &FeatureCollection, path: &Path) -> Result<()> {
    let document = to_geojson_document(collection)?;
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &document)?;
    Ok(())
}
