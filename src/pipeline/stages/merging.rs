//! Fusion of adjacent, compatible zones.
//!
//! Clustering is a single greedy pass: each unclaimed zone seeds a cluster
//! with every later unclaimed zone it may merge with. A claimed zone never
//! seeds or joins another cluster, so grouping does not chain through
//! sequences of barely adjacent zones.

use super::types::{StageMetrics, StageResult};
use crate::core::ProcessingStage;
use crate::domain::{FeatureValue, MergeConfig, Zone, ZoneType};
use crate::processors::BoundingBox;
use itertools::Itertools;
use std::time::Instant;
use tracing::{debug, trace};

/// Merges neighboring zones of the same type and similar confidence.
#[derive(Debug)]
pub struct ZoneMerger<'a> {
    config: &'a MergeConfig,
}

impl<'a> ZoneMerger<'a> {
    pub fn new(config: &'a MergeConfig) -> Self {
        Self { config }
    }

    pub fn merge(&self, zones: Vec<Zone>) -> StageResult<Vec<Zone>> {
        let start = Instant::now();
        let input_count = zones.len();
        let mut claimed = vec![false; input_count];
        let mut clusters: Vec<Vec<usize>> = Vec::new();

        for seed in 0..input_count {
            if claimed[seed] {
                continue;
            }
            claimed[seed] = true;
            let mut cluster = vec![seed];
            for candidate in seed + 1..input_count {
                if !claimed[candidate] && self.should_merge(&zones[seed], &zones[candidate]) {
                    claimed[candidate] = true;
                    cluster.push(candidate);
                }
            }
            clusters.push(cluster);
        }

        let mut slots: Vec<Option<Zone>> = zones.into_iter().map(Some).collect();
        let merged: Vec<Zone> = clusters
            .into_iter()
            .filter_map(|cluster| {
                let members: Vec<Zone> =
                    cluster.iter().filter_map(|&i| slots[i].take()).collect();
                fuse(members)
            })
            .collect();

        debug!("Zones after merging: {}", merged.len());
        let metrics = StageMetrics::new(ProcessingStage::Merging, input_count, merged.len())
            .with_info("absorbed", input_count - merged.len())
            .with_processing_time(start.elapsed());
        StageResult::new(merged, metrics)
    }

    /// The merge predicate for a pair of zones.
    pub fn should_merge(&self, a: &Zone, b: &Zone) -> bool {
        if self.config.is_incompatible(a.zone_type, b.zone_type) {
            return false;
        }
        if a.zone_type != b.zone_type {
            return false;
        }

        let distance = a.bbox.center_distance(&b.bbox);
        let size = a.bbox.average_size(&b.bbox);
        distance < self.config.distance_ratio * size
            && (a.confidence - b.confidence).abs() < self.config.max_confidence_gap
    }
}

/// Fuses a cluster into one zone. Single-member clusters are returned as is.
fn fuse(mut members: Vec<Zone>) -> Option<Zone> {
    if members.len() <= 1 {
        return members.pop();
    }
    trace!(
        "Fusing zones {:?}",
        members.iter().map(|z| z.id).collect::<Vec<_>>()
    );

    let bbox = BoundingBox::enclosing(members.iter().map(|z| &z.bbox))?;
    let content = members
        .iter()
        .map(|z| z.content.trim())
        .filter(|text| !text.is_empty())
        .join(" ");

    let total_area: u64 = members.iter().map(|z| z.bbox.area()).sum();
    let confidence = if total_area == 0 {
        members.iter().map(|z| z.confidence).sum::<f32>() / members.len() as f32
    } else {
        let weighted: f64 = members
            .iter()
            .map(|z| z.confidence as f64 * z.bbox.area() as f64)
            .sum();
        (weighted / total_area as f64) as f32
    };
    let ocr_confidence =
        members.iter().map(|z| z.ocr_confidence).sum::<f32>() / members.len() as f32;
    let zone_type = majority_type(&members);
    let id = members.iter().map(|z| z.id).min()?;
    let merged_count = members.len();

    let mut features = members.swap_remove(0).features;
    features.insert("merged_count".into(), FeatureValue::from(merged_count));

    Some(Zone {
        id,
        zone_type,
        bbox,
        confidence,
        content,
        ocr_confidence,
        features,
        reading_order: 0,
    })
}

/// Most frequent type; ties go to the type seen first.
fn majority_type(members: &[Zone]) -> ZoneType {
    let counts = members.iter().map(|z| z.zone_type).counts();
    members
        .iter()
        .map(|z| z.zone_type)
        .unique()
        .fold((ZoneType::Unknown, 0usize), |best, zone_type| {
            let count = counts[&zone_type];
            if count > best.1 { (zone_type, count) } else { best }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(id: u32, zone_type: ZoneType, bbox: BoundingBox, confidence: f32, text: &str) -> Zone {
        Zone {
            zone_type,
            confidence,
            content: text.to_string(),
            ocr_confidence: confidence * 100.0,
            ..Zone::candidate(id, bbox)
        }
    }

    #[test]
    fn test_adjacent_unknown_zones_are_fused() {
        let config = MergeConfig::default();
        let a = zone(1, ZoneType::Unknown, BoundingBox::new(100, 100, 60, 20), 0.40, "hello");
        let b = zone(2, ZoneType::Unknown, BoundingBox::new(130, 100, 60, 20), 0.43, "world");

        let result = ZoneMerger::new(&config).merge(vec![a, b]);
        assert_eq!(result.data.len(), 1);
        let fused = &result.data[0];
        assert_eq!(fused.id, 1);
        assert_eq!(fused.content, "hello world");
        assert_eq!(fused.bbox, BoundingBox::new(100, 100, 90, 20));
        assert!((fused.confidence - 0.415).abs() < 1e-5);
        assert!((fused.ocr_confidence - 41.5).abs() < 1e-3);
        assert_eq!(fused.features["merged_count"], FeatureValue::Int(2));
    }

    #[test]
    fn test_incompatible_pairs_never_merge() {
        let config = MergeConfig::default();
        let merger = ZoneMerger::new(&config);
        let bbox = BoundingBox::new(10, 10, 100, 20);
        let pairs = [
            (ZoneType::Header, ZoneType::Footer),
            (ZoneType::Signature, ZoneType::Price),
            (ZoneType::Logo, ZoneType::Paragraph),
        ];
        for (first, second) in pairs {
            let a = zone(1, first, bbox, 0.5, "a");
            let b = zone(2, second, bbox, 0.5, "b");
            assert!(!merger.should_merge(&a, &b));
            assert!(!merger.should_merge(&b, &a));
            assert_eq!(merger.merge(vec![a, b]).data.len(), 2);
        }
    }

    #[test]
    fn test_confidence_gap_and_distance_block_merge() {
        let config = MergeConfig::default();
        let merger = ZoneMerger::new(&config);
        let a = zone(1, ZoneType::Paragraph, BoundingBox::new(0, 0, 60, 20), 0.9, "a");
        let near_low = zone(2, ZoneType::Paragraph, BoundingBox::new(20, 0, 60, 20), 0.5, "b");
        let far = zone(3, ZoneType::Paragraph, BoundingBox::new(500, 500, 60, 20), 0.9, "c");
        assert!(!merger.should_merge(&a, &near_low));
        assert!(!merger.should_merge(&a, &far));
    }

    #[test]
    fn test_clustering_is_not_transitive() {
        let config = MergeConfig::default();
        // a-b and b-c are close enough, a-c is not.
        let a = zone(1, ZoneType::Paragraph, BoundingBox::new(0, 0, 40, 20), 0.6, "a");
        let b = zone(2, ZoneType::Paragraph, BoundingBox::new(20, 0, 40, 20), 0.6, "b");
        let c = zone(3, ZoneType::Paragraph, BoundingBox::new(42, 0, 40, 20), 0.6, "c");
        let merger = ZoneMerger::new(&config);
        assert!(merger.should_merge(&a, &b));
        assert!(merger.should_merge(&b, &c));
        assert!(!merger.should_merge(&a, &c));

        let merged = merger.merge(vec![a, b, c]).data;
        let ids: Vec<u32> = merged.iter().map(|z| z.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(merged[0].content, "a b");
    }

    #[test]
    fn test_fused_area_is_monotonic() {
        let config = MergeConfig::default();
        let a = zone(5, ZoneType::Date, BoundingBox::new(10, 10, 50, 30), 0.7, "");
        let b = zone(3, ZoneType::Date, BoundingBox::new(30, 20, 40, 20), 0.7, "12/05/2024");
        let (area_a, area_b) = (a.bbox.area(), b.bbox.area());

        let merged = ZoneMerger::new(&config).merge(vec![a, b]).data;
        assert_eq!(merged.len(), 1);
        assert!(merged[0].bbox.area() >= area_a.max(area_b));
        assert_eq!(merged[0].id, 3);
        assert_eq!(merged[0].content, "12/05/2024");
    }

    #[test]
    fn test_majority_type_prefers_first_on_tie() {
        let bbox = BoundingBox::new(0, 0, 10, 10);
        let members = vec![
            zone(1, ZoneType::Title, bbox, 0.5, ""),
            zone(2, ZoneType::Header, bbox, 0.5, ""),
            zone(3, ZoneType::Header, bbox, 0.5, ""),
            zone(4, ZoneType::Title, bbox, 0.5, ""),
        ];
        assert_eq!(majority_type(&members), ZoneType::Title);
        assert_eq!(majority_type(&members[1..]), ZoneType::Header);
    }
}
