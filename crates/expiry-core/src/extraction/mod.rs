//! Expiry date and field extraction passes.

mod fields;
mod heuristics;
pub mod rules;

pub use fields::FieldExtractionEngine;
pub use heuristics::HeuristicPass;
pub use rules::{
    normalize_date, scan_date_tokens, DateHint, DateNormalizer, DateToken, ExpiryExtraction,
    ExpiryFieldExtractor,
};

/// Name of the expiry date in candidate field maps.
pub const EXPIRY_FIELD: &str = "expiryDate";
