//! The boundary result of one detection run.

use crate::domain::{Zone, ZoneFeatures};
use crate::processors::BoundingBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One zone as exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub zone_id: u32,
    #[serde(rename = "type")]
    pub zone_type: String,
    pub bbox: BoundingBox,
    pub content: String,
    /// Composite confidence in `[0, 1]`.
    pub confidence: f32,
    /// Recognizer score in `[0, 100]`.
    pub ocr_confidence: f32,
    pub reading_order: u32,
    pub features: ZoneFeatures,
}

impl From<&Zone> for ZoneRecord {
    fn from(zone: &Zone) -> Self {
        Self {
            zone_id: zone.id,
            zone_type: zone.zone_type.as_str().to_string(),
            bbox: zone.bbox,
            content: zone.content.clone(),
            confidence: zone.confidence,
            ocr_confidence: zone.ocr_confidence,
            reading_order: zone.reading_order,
            features: zone.features.clone(),
        }
    }
}

/// Outcome of [`detect_and_classify`](crate::pipeline::detect_and_classify).
///
/// `zones` is listed in reading order and `reading_order` holds the zone ids
/// in that same order. When `success` is false, `error` explains why and the
/// zone list is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub success: bool,
    pub zones: Vec<ZoneRecord>,
    pub reading_order: Vec<u32>,
    pub zone_type_counts: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when the zones come from the full-page recovery path.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub recovered: bool,
}

impl DetectionResult {
    /// Builds a successful result from zones that already carry reading positions.
    pub fn from_zones(zones: &[Zone]) -> Self {
        let mut records: Vec<ZoneRecord> = zones.iter().map(ZoneRecord::from).collect();
        records.sort_by_key(|record| record.reading_order);

        let mut zone_type_counts = BTreeMap::new();
        for record in &records {
            *zone_type_counts.entry(record.zone_type.clone()).or_insert(0) += 1;
        }

        Self {
            success: true,
            reading_order: records.iter().map(|record| record.zone_id).collect(),
            zones: records,
            zone_type_counts,
            error: None,
            recovered: false,
        }
    }

    /// Marks the result as produced by the recovery path.
    pub fn into_recovered(mut self) -> Self {
        self.recovered = true;
        self
    }

    /// Builds a failed result carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Number of zones in the result.
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Looks up a zone by id.
    pub fn zone(&self, zone_id: u32) -> Option<&ZoneRecord> {
        self.zones.iter().find(|record| record.zone_id == zone_id)
    }
}
