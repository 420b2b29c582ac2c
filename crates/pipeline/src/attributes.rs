//! Attribute cleaning ahead of serialization
//!
//! Drops internal-use columns, applies the configured allow-list, formats
//! date values for JSON, and collapses NaN to an explicit null. Geometry is
//! never touched and the pass never fails.

use std::collections::BTreeSet;

use geoflow_core::vector::{AttributeValue, FeatureCollection};

/// Attributes named with this prefix never reach the output.
const INTERNAL_PREFIX: &str = "__";

/// Parameters for attribute cleaning
#[derive(Debug, Clone, Default)]
pub struct CleanParams {
    /// When non-empty, only these attributes survive (geometry always does).
    /// Listed-but-absent names are silently ignored.
    pub keep: Vec<String>,
}

/// Clean every feature's attributes in place.
///
/// Returns the number of distinct attribute names remaining.
pub fn clean_collection(collection: &mut FeatureCollection, params: &CleanParams) -> usize {
    let mut retained: BTreeSet<String> = BTreeSet::new();
    for feature in collection.iter_mut() {
        feature
            .properties
            .retain(|name, _| !name.starts_with(INTERNAL_PREFIX));
        if !params.keep.is_empty() {
            feature
                .properties
                .retain(|name, _| params.keep.iter().any(|keep| keep == name));
        }
        for (name, value) in feature.properties.iter_mut() {
            normalize(value);
            retained.insert(name.clone());
        }
    }
    retained.len()
}

fn normalize(value: &mut AttributeValue) {
    let replacement = match value {
        AttributeValue::Date(d) => AttributeValue::String(d.format("%Y-%m-%d").to_string()),
        AttributeValue::DateTime(dt) => AttributeValue::String(dt.format("%Y-%m-%d").to_string()),
        AttributeValue::Float(f) if f.is_nan() => AttributeValue::Null,
        _ => return,
    };
    *value = replacement;
}
