//! Category-specific secondary field extraction.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use super::rules::{self, apply_rules, DateNormalizer, FieldRule};
use crate::models::document::{CandidateSource, Category, ExtractionCandidate, FieldValue};

/// Dispatches sanitized text to the rule table of a category.
pub struct FieldExtractionEngine {
    dates: DateNormalizer,
}

impl FieldExtractionEngine {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            dates: DateNormalizer::new(today),
        }
    }

    /// The rule table for a category.
    pub fn rules_for(category: Category) -> &'static [FieldRule] {
        match category {
            Category::Warranty => &rules::warranty::RULES,
            Category::Insurance => &rules::insurance::RULES,
            Category::Amc => &rules::amc::RULES,
            Category::Subscription => &rules::subscription::RULES,
            Category::Medicine => &rules::medicine::RULES,
            Category::Other => &rules::other::RULES,
        }
    }

    /// Extract the secondary fields of a category. Fields with no match are
    /// absent from the map.
    pub fn extract_fields(&self, text: &str, category: Category) -> BTreeMap<String, FieldValue> {
        let fields = apply_rules(Self::rules_for(category), text, &self.dates);
        debug!("Field rules for {}: {} fields found", category, fields.len());
        fields
    }

    /// The regex pass as an aggregation candidate.
    pub fn candidate(&self, text: &str, category: Category) -> ExtractionCandidate {
        let mut candidate = ExtractionCandidate::new(CandidateSource::Regex, category);
        for (name, value) in self.extract_fields(text, category) {
            candidate.insert(&name, value);
        }
        candidate
    }
}
