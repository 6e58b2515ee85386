//! Zone types and the zone entity shared by every pipeline stage.

use crate::core::DEFAULT_TYPE_PRIORITY;
use crate::processors::BoundingBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Semantic category of a document zone.
///
/// Tags that are not known to this build deserialize as [`ZoneType::Unknown`],
/// so they share its reading priority and validation behavior.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Header,
    Title,
    Subtitle,
    Paragraph,
    List,
    Table,
    Footer,
    Signature,
    Logo,
    FormField,
    Price,
    Date,
    Address,
    Reference,
    Noise,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Reading priority per tag. Tags absent from this table rank as
/// [`DEFAULT_TYPE_PRIORITY`].
const TYPE_PRIORITIES: &[(ZoneType, u8)] = &[
    (ZoneType::Header, 1),
    (ZoneType::Title, 2),
    (ZoneType::Subtitle, 3),
    (ZoneType::Date, 4),
    (ZoneType::Reference, 5),
    (ZoneType::Address, 6),
    (ZoneType::Paragraph, 7),
    (ZoneType::List, 8),
    (ZoneType::Table, 9),
    (ZoneType::Price, 10),
    (ZoneType::FormField, 11),
    (ZoneType::Signature, 12),
    (ZoneType::Footer, 13),
    (ZoneType::Logo, 14),
    (ZoneType::Unknown, 15),
    (ZoneType::Noise, 16),
];

impl ZoneType {
    /// Every tag, in declaration order.
    pub const ALL: [ZoneType; 16] = [
        ZoneType::Header,
        ZoneType::Title,
        ZoneType::Subtitle,
        ZoneType::Paragraph,
        ZoneType::List,
        ZoneType::Table,
        ZoneType::Footer,
        ZoneType::Signature,
        ZoneType::Logo,
        ZoneType::FormField,
        ZoneType::Price,
        ZoneType::Date,
        ZoneType::Address,
        ZoneType::Reference,
        ZoneType::Noise,
        ZoneType::Unknown,
    ];

    /// Lowercase tag used in serialized output and exported filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Header => "header",
            ZoneType::Title => "title",
            ZoneType::Subtitle => "subtitle",
            ZoneType::Paragraph => "paragraph",
            ZoneType::List => "list",
            ZoneType::Table => "table",
            ZoneType::Footer => "footer",
            ZoneType::Signature => "signature",
            ZoneType::Logo => "logo",
            ZoneType::FormField => "form_field",
            ZoneType::Price => "price",
            ZoneType::Date => "date",
            ZoneType::Address => "address",
            ZoneType::Reference => "reference",
            ZoneType::Noise => "noise",
            ZoneType::Unknown => "unknown",
        }
    }

    /// Rank used as the primary reading order key; lower reads first.
    pub fn priority(&self) -> u8 {
        TYPE_PRIORITIES
            .iter()
            .find(|(tag, _)| tag == self)
            .map(|(_, priority)| *priority)
            .unwrap_or(DEFAULT_TYPE_PRIORITY)
    }

    /// Confidence adjustment applied by the classifier for this tag.
    pub fn confidence_bonus(&self) -> f32 {
        match self {
            ZoneType::Price => 0.15,
            ZoneType::Header | ZoneType::Title | ZoneType::Date => 0.10,
            ZoneType::Paragraph | ZoneType::Reference => 0.05,
            ZoneType::Unknown => -0.10,
            ZoneType::Noise => -0.50,
            _ => 0.0,
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneType {
    type Err = std::convert::Infallible;

    /// Parses a tag case-insensitively. Unrecognized tags become `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Ok(ZoneType::ALL
            .into_iter()
            .find(|zone_type| zone_type.as_str() == tag)
            .unwrap_or(ZoneType::Unknown))
    }
}

/// A scalar diagnostic recorded for a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<u32> for FeatureValue {
    fn from(value: u32) -> Self {
        FeatureValue::Int(value as i64)
    }
}

impl From<u64> for FeatureValue {
    fn from(value: u64) -> Self {
        FeatureValue::Int(value as i64)
    }
}

impl From<usize> for FeatureValue {
    fn from(value: usize) -> Self {
        FeatureValue::Int(value as i64)
    }
}

impl From<f32> for FeatureValue {
    fn from(value: f32) -> Self {
        FeatureValue::Float(value as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

/// Named diagnostics for a zone, ordered by key.
pub type ZoneFeatures = BTreeMap<String, FeatureValue>;

/// A rectangular region of the document with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Identifier assigned at candidate creation.
    pub id: u32,
    /// Classified type; `Unknown` until classification runs.
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    /// Region in source-image pixel coordinates.
    pub bbox: BoundingBox,
    /// Composite confidence in `[floor, 1.0]`.
    pub confidence: f32,
    /// Recognized text.
    pub content: String,
    /// Raw recognizer score in `[0, 100]`.
    pub ocr_confidence: f32,
    pub features: ZoneFeatures,
    /// 1-based reading position; 0 until ordering runs.
    pub reading_order: u32,
}

impl Zone {
    /// Creates an unclassified zone for a candidate box.
    pub fn candidate(id: u32, bbox: BoundingBox) -> Self {
        Self {
            id,
            zone_type: ZoneType::Unknown,
            bbox,
            confidence: 0.0,
            content: String::new(),
            ocr_confidence: 0.0,
            features: ZoneFeatures::new(),
            reading_order: 0,
        }
    }

    /// Returns true if the trimmed content is empty.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_table() {
        assert_eq!(ZoneType::Header.priority(), 1);
        assert_eq!(ZoneType::Price.priority(), 10);
        assert_eq!(ZoneType::Unknown.priority(), DEFAULT_TYPE_PRIORITY);
        assert_eq!(ZoneType::Noise.priority(), 16);
    }

    #[test]
    fn test_unrecognized_tag_falls_back_to_unknown() {
        let parsed: ZoneType = "marginalia".parse().unwrap();
        assert_eq!(parsed, ZoneType::Unknown);
        assert_eq!(parsed.priority(), 15);

        let from_json: ZoneType = serde_json::from_str("\"marginalia\"").unwrap();
        assert_eq!(from_json, ZoneType::Unknown);
    }

    #[test]
    fn test_tag_round_trip_through_str() {
        for zone_type in ZoneType::ALL {
            let parsed: ZoneType = zone_type.to_string().to_uppercase().parse().unwrap();
            assert_eq!(parsed, zone_type);
        }
        assert_eq!(
            serde_json::to_string(&ZoneType::FormField).unwrap(),
            "\"form_field\""
        );
    }

    #[test]
    fn test_zone_serializes_type_field() {
        let zone = Zone::candidate(3, BoundingBox::new(1, 2, 3, 4));
        let json = serde_json::to_value(&zone).unwrap();
        assert_eq!(json["type"], "unknown");
        assert_eq!(json["bbox"]["width"], 3);
        assert!(!zone.has_content());
    }
}
