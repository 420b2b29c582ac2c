//! GeoPackage reader
//!
//! Reads the first feature table of a GeoPackage (SQLite) file: geometry
//! blobs carry the standard GeoPackage binary header followed by WKB.
//! Attribute columns are typed from the table's declared column types, so
//! DATE / DATETIME columns come out as date values rather than strings.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use chrono::{NaiveDate, NaiveDateTime};
use geo_types::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};

/// Read the first feature table of a GeoPackage file.
pub fn read_gpkg(path: &Path) -> Result<FeatureCollection> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let (table, geom_column, srs_id): (String, String, i64) = conn
        .query_row(
            "SELECT c.table_name, g.column_name, g.srs_id
             FROM gpkg_contents c
             JOIN gpkg_geometry_columns g ON g.table_name = c.table_name
             WHERE c.data_type = 'features'
             ORDER BY c.table_name LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .map_err(|_| Error::NoFeatureTable(path.to_path_buf()))?;

    let crs = resolve_srs(&conn, srs_id);
    debug!("reading table {table} (geometry column {geom_column}, {crs})");

    let decl_types = declared_types(&conn, &table)?;

    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{}\"", table.replace('"', "\"\"")))?;
    let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut collection = FeatureCollection::new(crs);
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut feature = Feature::empty();
        for (idx, name) in names.iter().enumerate() {
            let value = row.get_ref(idx)?;
            if name == &geom_column {
                feature.geometry = match value {
                    ValueRef::Blob(blob) => parse_gpkg_blob(blob)?,
                    _ => None,
                };
            } else {
                let decl = decl_types.get(name).map(String::as_str).unwrap_or("");
                feature.set_property(name.clone(), attribute_from_sql(value, decl));
            }
        }
        collection.push(feature);
    }
    Ok(collection)
}

/// Look up the EPSG code behind a GeoPackage srs_id.
///
/// Falls back to the srs_id itself when the registry table is absent; an
/// undefined srs (id <= 0) yields EPSG:0, which the reprojector rejects.
fn resolve_srs(conn: &Connection, srs_id: i64) -> Crs {
    let code: i64 = conn
        .query_row(
            "SELECT organization_coordsys_id FROM gpkg_spatial_ref_sys WHERE srs_id = ?1",
            [srs_id],
            |row| row.get(0),
        )
        .unwrap_or(srs_id);
    Crs::from_epsg(code.max(0) as u32)
}

/// Declared column types of a table, uppercased, keyed by column name.
fn declared_types(conn: &Connection, table: &str) -> Result<HashMap<String, String>> {
    let mut stmt = conn.prepare(&format!(
        "PRAGMA table_info(\"{}\")",
        table.replace('"', "\"\"")
    ))?;
    let mut types = HashMap::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        let decl: String = row.get(2)?;
        types.insert(name, decl.to_ascii_uppercase());
    }
    Ok(types)
}

fn attribute_from_sql(value: ValueRef<'_>, decl_type: &str) -> AttributeValue {
    match value {
        ValueRef::Null => AttributeValue::Null,
        ValueRef::Integer(i) if decl_type == "BOOLEAN" => AttributeValue::Bool(i != 0),
        ValueRef::Integer(i) => AttributeValue::Int(i),
        ValueRef::Real(f) => AttributeValue::Float(f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            match decl_type {
                "DATE" => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                    .map(AttributeValue::Date)
                    .unwrap_or(AttributeValue::String(text)),
                "DATETIME" | "TIMESTAMP" => parse_datetime(&text)
                    .map(AttributeValue::DateTime)
                    .unwrap_or(AttributeValue::String(text)),
                _ => AttributeValue::String(text),
            }
        }
        // Non-geometry blobs have no attribute representation
        ValueRef::Blob(_) => AttributeValue::Null,
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok())
}

// ── GeoPackage binary header + WKB ──────────────────────────────────────

const GPKG_MAGIC: [u8; 2] = [0x47, 0x50]; // "GP"
const FLAG_ENVELOPE_MASK: u8 = 0b0000_1110;
const FLAG_EMPTY: u8 = 0b0001_0000;

/// Parse a GeoPackage geometry blob: "GP" header, optional envelope, WKB.
///
/// Returns `None` for blobs flagged as empty geometries.
fn parse_gpkg_blob(blob: &[u8]) -> Result<Option<Geometry<f64>>> {
    if blob.len() < 8 || blob[0..2] != GPKG_MAGIC {
        return Err(Error::InvalidGeoPackage {
            reason: "geometry blob missing GP magic".to_string(),
        });
    }
    let flags = blob[3];
    if flags & FLAG_EMPTY != 0 {
        return Ok(None);
    }
    let envelope_len = match (flags & FLAG_ENVELOPE_MASK) >> 1 {
        0 => 0,
        1 => 32,
        2 | 3 => 48,
        4 => 64,
        other => {
            return Err(Error::InvalidGeoPackage {
                reason: format!("invalid envelope indicator {other}"),
            })
        }
    };
    // magic(2) + version(1) + flags(1) + srs_id(4) + envelope
    let wkb_start = 8 + envelope_len;
    if blob.len() <= wkb_start {
        return Err(Error::InvalidGeoPackage {
            reason: "geometry blob truncated before WKB".to_string(),
        });
    }
    let mut cursor = Cursor::new(&blob[wkb_start..]);
    read_wkb(&mut cursor).map(Some)
}

const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;

fn read_wkb(cursor: &mut Cursor<&[u8]>) -> Result<Geometry<f64>> {
    let little = match cursor.read_u8()? {
        0 => false,
        1 => true,
        other => {
            return Err(Error::InvalidGeoPackage {
                reason: format!("invalid WKB byte order {other}"),
            })
        }
    };
    let raw_type = read_u32(cursor, little)?;

    // Both ISO (type + 1000/2000/3000) and EWKB (high-bit flags) encodings
    // of the dimensionality are seen in the wild.
    let code = raw_type & 0x0FFF_FFFF;
    let dim_block = code / 1000;
    let base = code % 1000;
    let has_z = raw_type & EWKB_Z != 0 || dim_block == 1 || dim_block == 3;
    let has_m = raw_type & EWKB_M != 0 || dim_block == 2 || dim_block == 3;
    if raw_type & EWKB_SRID != 0 {
        read_u32(cursor, little)?;
    }
    let extra_dims = usize::from(has_z) + usize::from(has_m);

    match base {
        1 => {
            let coord = read_coord(cursor, little, extra_dims)?;
            Ok(Geometry::Point(Point::from(coord)))
        }
        2 => Ok(Geometry::LineString(read_linestring(
            cursor, little, extra_dims,
        )?)),
        3 => Ok(Geometry::Polygon(read_polygon(cursor, little, extra_dims)?)),
        4 => {
            let points = read_members(cursor, little, |geom| match geom {
                Geometry::Point(p) => Some(p),
                _ => None,
            })?;
            Ok(Geometry::MultiPoint(MultiPoint::new(points)))
        }
        5 => {
            let lines = read_members(cursor, little, |geom| match geom {
                Geometry::LineString(ls) => Some(ls),
                _ => None,
            })?;
            Ok(Geometry::MultiLineString(MultiLineString::new(lines)))
        }
        6 => {
            let polygons = read_members(cursor, little, |geom| match geom {
                Geometry::Polygon(p) => Some(p),
                _ => None,
            })?;
            Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
        }
        other => Err(Error::UnsupportedWkbType(other)),
    }
}

/// Cap a declared element count by what the remaining bytes could hold, so
/// a corrupt count cannot drive a huge pre-allocation. Reads past the
/// actual data still fail with an EOF error.
fn bounded_capacity(cursor: &Cursor<&[u8]>, count: usize, min_item_len: usize) -> usize {
    let remaining = cursor
        .get_ref()
        .len()
        .saturating_sub(cursor.position() as usize);
    count.min(remaining / min_item_len)
}

/// Read the members of a multi-geometry; each member is a full WKB geometry
/// with its own byte-order marker.
fn read_members<T>(
    cursor: &mut Cursor<&[u8]>,
    little: bool,
    extract: impl Fn(Geometry<f64>) -> Option<T>,
) -> Result<Vec<T>> {
    let count = read_u32(cursor, little)? as usize;
    // byte order + type code is the smallest possible member
    let mut members = Vec::with_capacity(bounded_capacity(cursor, count, 5));
    for _ in 0..count {
        let geom = read_wkb(cursor)?;
        members.push(extract(geom).ok_or_else(|| Error::InvalidGeoPackage {
            reason: "multi-geometry member of mismatched type".to_string(),
        })?);
    }
    Ok(members)
}

fn read_polygon(
    cursor: &mut Cursor<&[u8]>,
    little: bool,
    extra_dims: usize,
) -> Result<Polygon<f64>> {
    let num_rings = read_u32(cursor, little)? as usize;
    if num_rings == 0 {
        return Err(Error::InvalidGeoPackage {
            reason: "polygon with zero rings".to_string(),
        });
    }
    let exterior = read_linestring(cursor, little, extra_dims)?;
    let mut interiors = Vec::with_capacity(bounded_capacity(cursor, num_rings - 1, 4));
    for _ in 1..num_rings {
        interiors.push(read_linestring(cursor, little, extra_dims)?);
    }
    Ok(Polygon::new(exterior, interiors))
}

fn read_linestring(
    cursor: &mut Cursor<&[u8]>,
    little: bool,
    extra_dims: usize,
) -> Result<LineString<f64>> {
    let count = read_u32(cursor, little)? as usize;
    let mut coords = Vec::with_capacity(bounded_capacity(cursor, count, 16));
    for _ in 0..count {
        coords.push(read_coord(cursor, little, extra_dims)?);
    }
    Ok(LineString::new(coords))
}

/// Read one coordinate; Z/M ordinates are read and dropped (the model is 2D).
fn read_coord(cursor: &mut Cursor<&[u8]>, little: bool, extra_dims: usize) -> Result<Coord<f64>> {
    let x = read_f64(cursor, little)?;
    let y = read_f64(cursor, little)?;
    for _ in 0..extra_dims {
        read_f64(cursor, little)?;
    }
    Ok(Coord { x, y })
}

fn read_u32(cursor: &mut Cursor<&[u8]>, little: bool) -> std::io::Result<u32> {
    if little {
        cursor.read_u32::<LittleEndian>()
    } else {
        cursor.read_u32::<BigEndian>()
    }
}

fn read_f64(cursor: &mut Cursor<&[u8]>, little: bool) -> std::io::Result<f64> {
    if little {
        cursor.read_f64::<LittleEndian>()
    } else {
        cursor.read_f64::<BigEndian>()
    }
}
