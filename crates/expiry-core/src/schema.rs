//! Per-category field policy: what may be returned, and what never may.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::extraction::rules::patterns::{
    AADHAAR_NUMBER, CARD_NUMBER, GSTIN, IFSC_CODE, LONG_DIGIT_RUN, PAN_NUMBER, PASSPORT_NUMBER,
    PHONE, UPI_ID,
};
use crate::extraction::EXPIRY_FIELD;
use crate::models::document::{Category, FieldValue};

/// Field policy for one category.
#[derive(Debug)]
pub struct CategorySchema {
    pub category: Category,
    pub allowed_fields: &'static [&'static str],
    pub required_fields: &'static [&'static str],
    forbidden_patterns: Vec<Regex>,
}

impl CategorySchema {
    pub fn allows(&self, field: &str) -> bool {
        self.allowed_fields.contains(&field)
    }

    pub fn requires(&self, field: &str) -> bool {
        self.required_fields.contains(&field)
    }

    /// Whether a value matches any forbidden pattern.
    pub fn forbids_value(&self, value: &str) -> bool {
        self.forbidden_patterns.iter().any(|p| p.is_match(value))
    }
}

fn patterns(own: &[&str], shared: &[&Regex]) -> Vec<Regex> {
    let mut all: Vec<Regex> = own.iter().map(|p| Regex::new(p).unwrap()).collect();
    all.extend(shared.iter().map(|&p| p.clone()));
    all.push(REDACTED.clone());
    all
}

const REQUIRED: &[&str] = &[EXPIRY_FIELD];

lazy_static! {
    static ref REDACTED: Regex = Regex::new(r"\[REDACTED\]").unwrap();

    static ref ADDRESS: Regex = Regex::new(
        r"(?i)\b(?:address|addr|flat\s+no|house\s+no|street|pin\s*code|pincode)\b"
    ).unwrap();

    static ref WARRANTY: CategorySchema = CategorySchema {
        category: Category::Warranty,
        allowed_fields: &[EXPIRY_FIELD, "productName", "brand", "companyName", "warrantyPeriod", "serialNumber"],
        required_fields: REQUIRED,
        forbidden_patterns: patterns(
            &[r"(?i)\b(?:invoice|bill|receipt)\s*(?:no|number|#)", r"(?i)\bgst"],
            &[&*GSTIN, &*PHONE, &*ADDRESS],
        ),
    };

    static ref INSURANCE: CategorySchema = CategorySchema {
        category: Category::Insurance,
        allowed_fields: &[EXPIRY_FIELD, "policyType", "provider", "insurerName", "policyNumber"],
        required_fields: REQUIRED,
        forbidden_patterns: patterns(
            &[r"(?i)\b(?:d\.?o\.?b|date\s+of\s+birth|nominee|proposer|insured\s+name)\b"],
            &[&*ADDRESS, &*AADHAAR_NUMBER, &*PAN_NUMBER],
        ),
    };

    static ref AMC: CategorySchema = CategorySchema {
        category: Category::Amc,
        allowed_fields: &[EXPIRY_FIELD, "serviceProvider", "productName", "contractNumber", "serviceType"],
        required_fields: REQUIRED,
        forbidden_patterns: patterns(
            &[r"(?i)\b(?:phone|mobile|contact\s+no)\b"],
            &[&*PHONE, &*ADDRESS],
        ),
    };

    static ref SUBSCRIPTION: CategorySchema = CategorySchema {
        category: Category::Subscription,
        allowed_fields: &[EXPIRY_FIELD, "serviceName", "plan", "planType", "subscriptionId"],
        required_fields: REQUIRED,
        forbidden_patterns: patterns(
            &[r"(?i)\b(?:bank|a/c|account\s+no|card\s+(?:no|number|ending))\b", r"(?i)\b(?:visa|mastercard|rupay)\b.*\d{4}"],
            &[&*CARD_NUMBER, &*UPI_ID, &*IFSC_CODE],
        ),
    };

    static ref MEDICINE: CategorySchema = CategorySchema {
        category: Category::Medicine,
        allowed_fields: &[
            EXPIRY_FIELD, "medicineName", "productName", "brand", "manufacturer", "batchNumber", "manufacturingDate",
        ],
        required_fields: REQUIRED,
        forbidden_patterns: patterns(
            &[r"(?i)\b(?:patient|doctor|diagnosis|diagnosed|prescribed\s+(?:by|to|for))\b"],
            &[],
        ),
    };

    static ref OTHER: CategorySchema = CategorySchema {
        category: Category::Other,
        allowed_fields: &[EXPIRY_FIELD, "documentType"],
        required_fields: REQUIRED,
        forbidden_patterns: patterns(
            &[r"(?i)\b(?:name|d\.?o\.?b|date\s+of\s+birth|licen[cs]e\s+no|[sdw]/o)\b"],
            &[&*ADDRESS, &*LONG_DIGIT_RUN, &*PAN_NUMBER, &*AADHAAR_NUMBER, &*PASSPORT_NUMBER],
        ),
    };
}

/// The single authority on which fields may leave the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategorySchemaRegistry;

impl CategorySchemaRegistry {
    pub fn new() -> Self {
        Self
    }

    pub fn schema_for(&self, category: Category) -> &'static CategorySchema {
        match category {
            Category::Warranty => &WARRANTY,
            Category::Insurance => &INSURANCE,
            Category::Amc => &AMC,
            Category::Subscription => &SUBSCRIPTION,
            Category::Medicine => &MEDICINE,
            Category::Other => &OTHER,
        }
    }

    pub fn is_allowed(&self, category: Category, field: &str) -> bool {
        self.schema_for(category).allows(field)
    }

    /// Drop fields the category does not allow, values matching a forbidden
    /// pattern, and fields with no value.
    pub fn sanitize_fields(
        &self,
        category: Category,
        fields: BTreeMap<String, FieldValue>,
    ) -> BTreeMap<String, FieldValue> {
        let schema = self.schema_for(category);
        let before = fields.len();

        let kept: BTreeMap<String, FieldValue> = fields
            .into_iter()
            .filter(|(name, _)| schema.allows(name))
            .filter(|(_, value)| value.as_str().is_some_and(|v| !schema.forbids_value(v)))
            .collect();

        if kept.len() < before {
            debug!("Schema for {} dropped {} fields", category, before - kept.len());
        }
        kept
    }

    /// Required fields with no value in `fields`.
    pub fn missing_required(
        &self,
        category: Category,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Vec<&'static str> {
        self.schema_for(category)
            .required_fields
            .iter()
            .copied()
            .filter(|name| !fields.get(*name).is_some_and(FieldValue::is_present))
            .collect()
    }
}
