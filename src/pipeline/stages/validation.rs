//! Final pruning of low-value zones.

use super::reading_order::renumber;
use super::types::{StageMetrics, StageResult};
use crate::core::ProcessingStage;
use crate::domain::{ValidationConfig, Zone, ZoneType};
use std::time::Instant;
use tracing::{debug, warn};

/// Removes weak zones without modifying the ones it keeps.
///
/// The thresholds are permissive; consumers can discard more themselves.
/// The output is non-empty whenever the input is: if every zone fails, the
/// first input zone is kept. Reading positions of the survivors are
/// re-compacted to `1..=N` in their incoming order.
#[derive(Debug)]
pub struct Validator<'a> {
    config: &'a ValidationConfig,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate(
        &self,
        zones: Vec<Zone>,
        image_width: u32,
        image_height: u32,
    ) -> StageResult<Vec<Zone>> {
        let start = Instant::now();
        let input_count = zones.len();
        let first = zones.first().cloned();

        let mut kept: Vec<Zone> = zones
            .into_iter()
            .filter(|zone| self.is_valid(zone, image_width, image_height))
            .collect();

        let used_fallback = kept.is_empty() && first.is_some();
        if used_fallback && let Some(zone) = first {
            warn!("Every zone failed validation, keeping zone {}", zone.id);
            kept.push(zone);
        }

        renumber(&mut kept);
        debug!("Zones after validation: {}", kept.len());

        let metrics = StageMetrics::new(ProcessingStage::Validation, input_count, kept.len())
            .with_info("fallback", used_fallback)
            .with_processing_time(start.elapsed());
        StageResult::new(kept, metrics)
    }

    /// Returns true if a zone passes every check.
    pub fn is_valid(&self, zone: &Zone, image_width: u32, image_height: u32) -> bool {
        let config = self.config;
        let area_ratio = zone.bbox.area_ratio(image_width, image_height);

        zone.bbox.is_within(image_width, image_height)
            && zone.confidence >= config.min_confidence
            && (config.min_area_ratio..=config.max_area_ratio).contains(&area_ratio)
            && zone.has_content()
            && zone.zone_type != ZoneType::Noise
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::BoundingBox;

    fn zone(id: u32, bbox: BoundingBox, confidence: f32, text: &str) -> Zone {
        Zone {
            zone_type: ZoneType::Paragraph,
            confidence,
            content: text.to_string(),
            ..Zone::candidate(id, bbox)
        }
    }

    #[test]
    fn test_each_rule_drops_a_zone() {
        let config = ValidationConfig::default();
        let validator = Validator::new(&config);
        let good = BoundingBox::new(10, 10, 100, 20);

        let mut noise = zone(5, good, 0.9, "~~");
        noise.zone_type = ZoneType::Noise;
        let zones = vec![
            zone(1, good, 0.9, "kept"),
            zone(2, good, 0.05, "weak"),
            zone(3, good, 0.9, "   "),
            zone(4, BoundingBox::new(0, 0, 1000, 950), 0.9, "page"),
            noise,
            zone(6, BoundingBox::new(990, 10, 20, 20), 0.9, "outside"),
            zone(7, BoundingBox::new(0, 0, 5, 5), 0.9, "tiny"),
            zone(8, good, 0.5, "also kept"),
        ];

        let result = validator.validate(zones, 1000, 1000);
        let ids: Vec<u32> = result.data.iter().map(|z| z.id).collect();
        assert_eq!(ids, vec![1, 8]);
        let positions: Vec<u32> = result.data.iter().map(|z| z.reading_order).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(result.metrics.additional_info["fallback"], "false");
    }

    #[test]
    fn test_last_resort_keeps_first_zone() {
        let config = ValidationConfig::default();
        let first = zone(3, BoundingBox::full_image(200, 100), 0.05, "");
        let second = zone(4, BoundingBox::new(0, 0, 10, 10), 0.05, "");

        let result = Validator::new(&config).validate(vec![first.clone(), second], 200, 100);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].id, first.id);
        assert_eq!(result.data[0].bbox, first.bbox);
        assert_eq!(result.data[0].reading_order, 1);
        assert_eq!(result.metrics.additional_info["fallback"], "true");
    }

    #[test]
    fn test_empty_input_stays_empty() {
        let config = ValidationConfig::default();
        let result = Validator::new(&config).validate(Vec::new(), 10, 10);
        assert!(result.data.is_empty());
    }
}
