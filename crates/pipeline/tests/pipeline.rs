//! End-to-end pipeline tests on GeoJSON sources in a temp sandbox.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tempfile::TempDir;

use geoflow_pipeline::layer::{run_all, run_layer, LayerJob, PipelineParams};

struct Sandbox {
    _dir: TempDir,
    raw: std::path::PathBuf,
    processed: std::path::PathBuf,
    backup: std::path::PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw");
        let processed = dir.path().join("processed");
        let backup = dir.path().join("backup");
        for d in [&raw, &processed, &backup] {
            fs::create_dir(d).unwrap();
        }
        Self {
            _dir: dir,
            raw,
            processed,
            backup,
        }
    }

    fn params(&self) -> PipelineParams {
        PipelineParams {
            backup_dir: self.backup.clone(),
            ..PipelineParams::default()
        }
    }

    fn job(&self, name: &str) -> LayerJob {
        LayerJob {
            name: name.to_string(),
            source: self.raw.join(format!("{name}.geojson")),
            output: self.processed.join(format!("{name}.geojson")),
            description: format!("{name} layer"),
        }
    }
}

/// A Lambert-93 square near Paris with `segments` vertices per side,
/// jittered so simplification has something to remove.
fn lambert_square_geojson(segments: usize) -> String {
    let (x0, y0, size) = (652000.0, 6862000.0, 1000.0);
    let mut coords = Vec::new();
    let step = size / segments as f64;
    for i in 0..segments {
        let jitter = if i % 2 == 0 { 0.0 } else { 0.05 };
        coords.push((x0 + i as f64 * step, y0 + jitter));
    }
    for i in 0..segments {
        let jitter = if i % 2 == 0 { 0.0 } else { 0.05 };
        coords.push((x0 + size + jitter, y0 + i as f64 * step));
    }
    for i in 0..segments {
        coords.push((x0 + size - i as f64 * step, y0 + size));
    }
    for i in 0..segments {
        coords.push((x0, y0 + size - i as f64 * step));
    }
    coords.push(coords[0]);

    let ring: Vec<String> = coords.iter().map(|(x, y)| format!("[{x},{y}]")).collect();
    format!(
        r#"{{"type":"FeatureCollection",
            "crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::2154"}}}},
            "features":[{{"type":"Feature",
                "geometry":{{"type":"Polygon","coordinates":[[{}]]}},
                "properties":{{"name":"lot A","__index":1,"surface":42.5}}}}]}}"#,
        ring.join(",")
    )
}

fn read_output(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn ring_coords(document: &Value) -> Vec<(f64, f64)> {
    document["features"][0]["geometry"]["coordinates"][0]
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            (
                pair[0].as_f64().unwrap(),
                pair[1].as_f64().unwrap(),
            )
        })
        .collect()
}

fn decimals_at_most(value: f64, precision: u32) -> bool {
    let factor = 10f64.powi(precision as i32);
    ((value * factor).round() / factor - value).abs() < 1e-12
}

#[test]
fn full_pipeline_reprojects_simplifies_and_rounds() {
    let sandbox = Sandbox::new();
    let job = sandbox.job("parcels");
    fs::write(&job.source, lambert_square_geojson(25)).unwrap();

    let mut params = sandbox.params();
    params.tolerance = 1e-7;
    run_layer(&job, &params).unwrap();

    let document = read_output(&job.output);
    assert_eq!(document["type"], "FeatureCollection");

    let ring = ring_coords(&document);
    // Ring survived as a valid closed ring near Paris, in WGS84 degrees
    assert!(ring.len() >= 4);
    assert_eq!(ring.first(), ring.last());
    for &(lon, lat) in &ring {
        assert!((2.0..3.0).contains(&lon), "lon {lon} not in WGS84 range");
        assert!((48.0..49.5).contains(&lat), "lat {lat} not in WGS84 range");
        assert!(decimals_at_most(lon, 6), "lon {lon} not rounded");
        assert!(decimals_at_most(lat, 6), "lat {lat} not rounded");
    }
    // Simplification removed some of the 101 input vertices
    assert!(ring.len() < 101);

    // Attribute cleaning dropped the internal column, kept the rest
    let properties = &document["features"][0]["properties"];
    assert!(properties.get("__index").is_none());
    assert_eq!(properties["name"], "lot A");
    assert_eq!(properties["surface"], 42.5);
}

#[test]
fn missing_source_fails_job_but_not_run() {
    let sandbox = Sandbox::new();
    let jobs = vec![
        sandbox.job("lots"),
        sandbox.job("ghost"),
        sandbox.job("blocks"),
    ];
    fs::write(&jobs[0].source, lambert_square_geojson(10)).unwrap();
    fs::write(&jobs[2].source, lambert_square_geojson(10)).unwrap();
    // jobs[1].source deliberately absent

    let summary = run_all(&jobs, &sandbox.params());

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.total, 3);
    assert!(!summary.all_succeeded());
    assert!(jobs[0].output.exists());
    assert!(!jobs[1].output.exists());
    assert!(jobs[2].output.exists());
}

#[test]
fn rerun_creates_backup_of_previous_output() {
    let sandbox = Sandbox::new();
    let job = sandbox.job("lots");
    fs::write(&job.source, lambert_square_geojson(10)).unwrap();

    let params = sandbox.params();
    run_layer(&job, &params).unwrap();
    run_layer(&job, &params).unwrap();

    let backups: Vec<_> = fs::read_dir(&sandbox.backup)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].starts_with("lots_"));
    assert!(backups[0].ends_with(".geojson"));
}

#[test]
fn already_projected_source_passes_through() {
    let sandbox = Sandbox::new();
    let job = sandbox.job("points");
    fs::write(
        &job.source,
        r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "geometry":{"type":"Point","coordinates":[2.123456789,48.85]},
            "properties":{"name":"P"}}]}"#,
    )
    .unwrap();

    run_layer(&job, &sandbox.params()).unwrap();

    let document = read_output(&job.output);
    let coords = document["features"][0]["geometry"]["coordinates"]
        .as_array()
        .unwrap();
    // No reprojection, but precision reduction still applies
    assert_eq!(coords[0].as_f64().unwrap(), 2.123457);
    assert_eq!(coords[1].as_f64().unwrap(), 48.85);
}

#[test]
fn allow_list_filters_output_properties() {
    let sandbox = Sandbox::new();
    let job = sandbox.job("named");
    fs::write(
        &job.source,
        r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "geometry":{"type":"Point","coordinates":[1.0,2.0]},
            "properties":{"name":"A","extra":1}}]}"#,
    )
    .unwrap();

    let mut params = sandbox.params();
    params.keep_attributes = vec!["name".to_string()];
    run_layer(&job, &params).unwrap();

    let document = read_output(&job.output);
    let properties = document["features"][0]["properties"].as_object().unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties["name"], "A");
}
