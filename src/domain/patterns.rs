//! Ordered text pattern tables used by the semantic classifier.
//!
//! A table is a list of `(type, patterns)` rules. Classification walks the
//! rules in declaration order and returns the first type with any matching
//! pattern, so the order of the rules is part of the table's behavior.

use crate::core::{OCRError, OcrResult};
use crate::domain::zone::ZoneType;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Language selector for the built-in tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternLanguage {
    /// Mixed French/English invoice vocabulary.
    #[default]
    Default,
    French,
    English,
}

/// One uncompiled rule, as it appears in a profile file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    pub zone_type: ZoneType,
    pub patterns: Vec<String>,
}

type RawTable = &'static [(ZoneType, &'static [&'static str])];

const DEFAULT_RULES: RawTable = &[
    (
        ZoneType::Header,
        &[
            r"facture|invoice|devis|quote|bon de commande",
            r"société|company|entreprise|sarl|sas|sa\b",
            r"n°\s*\d+|numero|number",
        ],
    ),
    (
        ZoneType::Date,
        &[
            r"\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}",
            r"\d{1,2}\s+(janvier|février|mars|avril|mai|juin|juillet|août|septembre|octobre|novembre|décembre)",
            r"date\s*:",
        ],
    ),
    (
        ZoneType::Price,
        &[
            r"\d+[,.]\d{2}\s*€",
            r"€\s*\d+[,.]\d{2}",
            r"total|montant|prix|price|amount",
            r"tva|ht|ttc|tax",
        ],
    ),
    (
        ZoneType::Address,
        &[
            r"\d+\s+rue|avenue|boulevard|place|chemin",
            r"\d{5}\s+[a-zA-Z]+",
            r"adresse|address",
        ],
    ),
    (
        ZoneType::Reference,
        &[r"ref\s*:?\s*\w+", r"référence|reference", r"n°|num|number"],
    ),
    (ZoneType::Signature, &[r"signature|signé|signed", r"cachet|stamp"]),
];

const FRENCH_RULES: RawTable = &[
    (
        ZoneType::Header,
        &[
            r"facture|devis|bon de commande|commande|order",
            r"société|company|entreprise|sarl|sas|sa\b|eurl",
            r"n°\s*\d+|numero|numéro|ref\s*:",
            r"siret|siren|tva|rcs",
        ],
    ),
    (
        ZoneType::Date,
        &[
            r"\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}",
            r"\d{1,2}\s+(janvier|février|mars|avril|mai|juin|juillet|août|septembre|octobre|novembre|décembre)",
            r"date\s*:?\s*",
            r"le\s+\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}",
        ],
    ),
    (
        ZoneType::Price,
        &[
            r"\d+[,.]\d{2}\s*€",
            r"€\s*\d+[,.]\d{2}",
            r"total|montant|prix|price|amount|somme",
            r"tva|ht|ttc|tax|hors\s+taxe|toutes\s+taxes",
            r"\d+\s*%",
        ],
    ),
    (
        ZoneType::Address,
        &[
            r"\d+\s+(rue|avenue|boulevard|place|chemin|allée|impasse)",
            r"\d{5}\s+[a-zA-ZÀ-ÿ\s]+",
            r"adresse|address",
            r"france|paris|lyon|marseille|toulouse|nice|nantes|strasbourg|montpellier|bordeaux",
        ],
    ),
    (
        ZoneType::Reference,
        &[
            r"ref\s*:?\s*\w+",
            r"référence|reference",
            r"n°|num|number|commande\s+n°",
            r"code\s+client|client\s+n°",
        ],
    ),
    (
        ZoneType::Signature,
        &[
            r"signature|signé|signed",
            r"cachet|stamp|tampon",
            r"lu\s+et\s+approuvé",
            r"bon\s+pour\s+accord",
        ],
    ),
    (
        ZoneType::Footer,
        &[
            r"page\s+\d+",
            r"siège\s+social",
            r"capital\s+social",
            r"mentions\s+légales",
        ],
    ),
];

const ENGLISH_RULES: RawTable = &[
    (
        ZoneType::Header,
        &[
            r"invoice|quote|order|receipt|bill",
            r"company|corporation|inc\.|ltd\.|llc",
            r"invoice\s*#\s*\d+|order\s*#\s*\d+",
        ],
    ),
    (
        ZoneType::Date,
        &[
            r"\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}",
            r"(january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2}",
            r"date\s*:?",
        ],
    ),
    (
        ZoneType::Price,
        &[
            r"\$\d+[,.]\d{2}",
            r"\d+[,.]\d{2}\s*\$",
            r"total|amount|price|cost|sum",
            r"tax|vat|net|gross",
        ],
    ),
    (
        ZoneType::Address,
        &[
            r"\d+\s+(street|avenue|boulevard|road|lane|drive)",
            r"\d{5}(-\d{4})?\s+[a-zA-Z\s]+",
            r"address|street\s+address",
        ],
    ),
];

static DEFAULT_TABLE: Lazy<PatternTable> = Lazy::new(|| compile_builtin(DEFAULT_RULES));
static FRENCH_TABLE: Lazy<PatternTable> = Lazy::new(|| compile_builtin(FRENCH_RULES));
static ENGLISH_TABLE: Lazy<PatternTable> = Lazy::new(|| compile_builtin(ENGLISH_RULES));

fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn compile_builtin(rules: RawTable) -> PatternTable {
    let rules = rules
        .iter()
        .map(|(zone_type, patterns)| {
            let compiled = patterns
                .iter()
                .map(|pattern| {
                    compile_pattern(pattern)
                        .unwrap_or_else(|e| panic!("Failed to compile pattern {pattern}: {e}"))
                })
                .collect();
            (*zone_type, compiled)
        })
        .collect();
    PatternTable { rules }
}

/// A compiled, ordered pattern table.
#[derive(Debug, Clone)]
pub struct PatternTable {
    rules: Vec<(ZoneType, Vec<Regex>)>,
}

impl PatternTable {
    /// Compiles a custom table. Rules keep the order given.
    ///
    /// # Errors
    ///
    /// Returns `OCRError::ConfigError` naming the first pattern that fails to compile.
    pub fn from_rules(rules: &[PatternRule]) -> OcrResult<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let mut patterns = Vec::with_capacity(rule.patterns.len());
            for pattern in &rule.patterns {
                let regex = compile_pattern(pattern).map_err(|e| {
                    OCRError::config_error(format!(
                        "invalid {} pattern '{}': {}",
                        rule.zone_type, pattern, e
                    ))
                })?;
                patterns.push(regex);
            }
            compiled.push((rule.zone_type, patterns));
        }
        Ok(Self { rules: compiled })
    }

    /// Returns the shared built-in table for a language.
    pub fn for_language(language: PatternLanguage) -> &'static PatternTable {
        match language {
            PatternLanguage::Default => &DEFAULT_TABLE,
            PatternLanguage::French => &FRENCH_TABLE,
            PatternLanguage::English => &ENGLISH_TABLE,
        }
    }

    /// Returns the first type whose patterns match the lowercased, trimmed text.
    pub fn classify(&self, text: &str) -> Option<ZoneType> {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        self.rules
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(&normalized)))
            .map(|(zone_type, _)| *zone_type)
    }

    /// Types covered by this table, in matching order.
    pub fn zone_types(&self) -> impl Iterator<Item = ZoneType> + '_ {
        self.rules.iter().map(|(zone_type, _)| *zone_type)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_table() -> &'static PatternTable {
        PatternTable::for_language(PatternLanguage::Default)
    }

    #[test]
    fn test_default_declaration_order() {
        let order: Vec<_> = default_table().zone_types().collect();
        assert_eq!(
            order,
            vec![
                ZoneType::Header,
                ZoneType::Date,
                ZoneType::Price,
                ZoneType::Address,
                ZoneType::Reference,
                ZoneType::Signature,
            ]
        );
    }

    #[test]
    fn test_invoice_heading_is_header() {
        assert_eq!(
            default_table().classify("FACTURE N° 2024-01"),
            Some(ZoneType::Header)
        );
    }

    #[test]
    fn test_amount_is_price() {
        assert_eq!(default_table().classify("123,45 €"), Some(ZoneType::Price));
        assert_eq!(default_table().classify("Total HT"), Some(ZoneType::Price));
    }

    #[test]
    fn test_first_matching_type_wins() {
        // Matches both the date and the price rules; dates are declared first.
        assert_eq!(
            default_table().classify("12/05/2024 total"),
            Some(ZoneType::Date)
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(default_table().classify("lorem ipsum"), None);
        assert_eq!(default_table().classify("   "), None);
    }

    #[test]
    fn test_language_tables() {
        let french = PatternTable::for_language(PatternLanguage::French);
        assert_eq!(french.classify("Page 2"), Some(ZoneType::Footer));
        assert_eq!(french.classify("lu et approuvé"), Some(ZoneType::Signature));

        let english = PatternTable::for_language(PatternLanguage::English);
        assert_eq!(english.classify("Receipt"), Some(ZoneType::Header));
        assert_eq!(english.classify("$19.99"), Some(ZoneType::Price));
    }

    #[test]
    fn test_custom_rules() {
        let table = PatternTable::from_rules(&[PatternRule {
            zone_type: ZoneType::Logo,
            patterns: vec!["acme".to_string()],
        }])
        .unwrap();
        assert_eq!(table.classify("ACME Corp"), Some(ZoneType::Logo));
        assert_eq!(table.len(), 1);

        let invalid = PatternTable::from_rules(&[PatternRule {
            zone_type: ZoneType::Logo,
            patterns: vec!["(unclosed".to_string()],
        }]);
        assert!(matches!(invalid, Err(OCRError::ConfigError { .. })));
    }
}
