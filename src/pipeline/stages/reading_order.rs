//! Approximate reading order.
//!
//! Zones are ranked by type priority first, then by coarse row and column
//! bands, so page metadata comes before the body and trailing metadata comes
//! last. Within a band zones read left to right. This is not column detection.

use super::types::{StageMetrics, StageResult};
use crate::core::{ProcessingStage, READING_ORDER_BAND};
use crate::domain::Zone;
use std::time::Instant;
use tracing::debug;

/// Sorts zones and assigns 1-based reading positions.
#[derive(Debug, Clone, Copy)]
pub struct ReadingOrderResolver {
    band: u32,
}

impl Default for ReadingOrderResolver {
    fn default() -> Self {
        Self::new(READING_ORDER_BAND)
    }
}

impl ReadingOrderResolver {
    /// Creates a resolver with the given band height in pixels (minimum 1).
    pub fn new(band: u32) -> Self {
        Self { band: band.max(1) }
    }

    pub fn resolve(&self, mut zones: Vec<Zone>) -> StageResult<Vec<Zone>> {
        let start = Instant::now();
        zones.sort_by_key(|zone| self.sort_key(zone));
        renumber(&mut zones);
        debug!("Reading order assigned to {} zones", zones.len());

        let metrics = StageMetrics::new(ProcessingStage::ReadingOrder, zones.len(), zones.len())
            .with_info("band", self.band)
            .with_processing_time(start.elapsed());
        StageResult::new(zones, metrics)
    }

    fn sort_key(&self, zone: &Zone) -> (u8, u32, u32) {
        (
            zone.zone_type.priority(),
            zone.bbox.y / self.band,
            zone.bbox.x / self.band,
        )
    }
}

/// Sets `reading_order` to the 1-based position of each zone in the slice.
pub fn renumber(zones: &mut [Zone]) {
    for (index, zone) in zones.iter_mut().enumerate() {
        zone.reading_order = index as u32 + 1;
    }
}
