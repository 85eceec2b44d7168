//! Merging of independent extraction passes into one result.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::extraction::rules::DateNormalizer;
use crate::extraction::EXPIRY_FIELD;
use crate::models::document::{
    Category, CategoryConfidence, ExtractionCandidate, ExtractionResult, ExtractionWarning,
    FieldValue,
};
use crate::schema::CategorySchemaRegistry;

/// Fields whose values must be ISO dates.
const DATE_FIELDS: &[&str] = &[EXPIRY_FIELD, "manufacturingDate"];

/// The category the result will carry, decided before merging.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDecision {
    pub category: Category,
    pub confidence: CategoryConfidence,
    pub warnings: Vec<ExtractionWarning>,
}

impl CategoryDecision {
    pub fn new(category: Category, percentage: u8) -> Self {
        Self {
            category,
            confidence: CategoryConfidence::from_percentage(percentage),
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: ExtractionWarning) -> Self {
        self.warnings.push(warning);
        self
    }
}

/// Combines candidates by source precedence, then applies the schema gate.
pub struct ResultAggregator {
    registry: CategorySchemaRegistry,
    dates: DateNormalizer,
}

impl ResultAggregator {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            registry: CategorySchemaRegistry::new(),
            dates: DateNormalizer::new(today),
        }
    }

    /// Merge candidates into the canonical result.
    ///
    /// Per field, the strongest source with a value wins; within one source
    /// the higher score wins. Lower tiers only fill gaps.
    pub fn merge(
        &self,
        decision: CategoryDecision,
        candidates: &[ExtractionCandidate],
    ) -> ExtractionResult {
        let mut ordered: Vec<&ExtractionCandidate> = candidates.iter().collect();
        ordered.sort_by_key(|c| c.source.precedence());

        let mut merged: BTreeMap<String, (u8, FieldValue)> = BTreeMap::new();
        for candidate in &ordered {
            let tier = candidate.source.precedence();
            for (name, value) in &candidate.fields {
                let Some(value) = self.canonical(name, value) else {
                    continue;
                };
                match merged.get(name) {
                    Some((held_tier, _)) if *held_tier < tier => {}
                    Some((_, held)) if held.confidence_score >= value.confidence_score => {}
                    _ => {
                        merged.insert(name.clone(), (tier, value));
                    }
                }
            }
        }

        let fields: BTreeMap<String, FieldValue> =
            merged.into_iter().map(|(name, (_, value))| (name, value)).collect();
        let mut fields = self.registry.sanitize_fields(decision.category, fields);
        let expiry_date = fields.remove(EXPIRY_FIELD).unwrap_or_default();

        let mut warnings: Vec<String> = decision.warnings.iter().map(ToString::to_string).collect();
        warnings.extend(ordered.iter().flat_map(|c| c.warnings.iter().cloned()));

        if let Some(iso) = expiry_date.as_str() {
            let past = NaiveDate::parse_from_str(iso, "%Y-%m-%d")
                .is_ok_and(|d| d < self.dates.today());
            if past {
                let warning = ExtractionWarning::PastExpirySuspected { date: iso.to_string() };
                warnings.push(warning.to_string());
            }
        }

        let mut present = fields.clone();
        present.insert(EXPIRY_FIELD.to_string(), expiry_date.clone());
        for name in self.registry.missing_required(decision.category, &present) {
            warnings.push(ExtractionWarning::MissingRequiredField(name.to_string()).to_string());
        }

        let mut seen = std::collections::HashSet::new();
        warnings.retain(|w| seen.insert(w.clone()));

        debug!(
            "Merged {} candidates into {} fields, expiry {}",
            candidates.len(),
            fields.len(),
            if expiry_date.is_present() { "found" } else { "missing" }
        );

        ExtractionResult {
            category: decision.category,
            category_confidence: decision.confidence,
            expiry_date,
            fields,
            warnings,
        }
    }

    /// Normalize date fields; drop values that are absent or not dates.
    fn canonical(&self, name: &str, value: &FieldValue) -> Option<FieldValue> {
        let raw = value.as_str()?;
        if !DATE_FIELDS.contains(&name) {
            return Some(value.clone());
        }
        let iso = self.dates.normalize(raw, None)?;
        Some(FieldValue {
            value: Some(iso),
            ..value.clone()
        })
    }
}
