//! The six zone detection stages.
//!
//! Each stage is a small struct borrowing its slice of the
//! [`DocumentTypeProfile`](crate::domain::DocumentTypeProfile) and returning a
//! [`StageResult`] with the stage output and its metrics. Stages run strictly
//! in sequence: detection, geometric filtering, classification, merging,
//! reading order, validation.

mod candidate_detection;
mod classification;
mod geometric_filter;
mod merging;
mod reading_order;
mod types;
mod validation;

pub use candidate_detection::{CandidateDetector, CandidateSet};
pub use classification::SemanticClassifier;
pub use geometric_filter::{GeometricFilter, Rejection};
pub use merging::ZoneMerger;
pub use reading_order::{ReadingOrderResolver, renumber};
pub use types::{StageMetrics, StageResult};
pub use validation::Validator;
