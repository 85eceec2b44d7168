//! Core library for expiry-bearing document extraction.
//!
//! This crate provides:
//! - PII redaction of raw OCR text
//! - Rule-based document categorization (warranty, insurance, AMC,
//!   subscription, medicine, other)
//! - Date normalization and keyword-anchored expiry date search
//! - Category-specific field extraction behind a per-category privacy schema
//! - Merging of heuristic, regex, keyword and optional AI candidates

pub mod aggregate;
pub mod classify;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod extraction;
pub mod models;
pub mod sanitize;
pub mod schema;

pub use aggregate::{CategoryDecision, ResultAggregator};
pub use classify::{CategoryPrediction, CategoryPredictor, PredictionReason};
pub use engine::ExtractionEngine;
pub use enrichment::{
    EnrichmentPolicy, EnrichmentProvider, EnrichmentRequest, NoEnrichment, StaticEnrichment,
};
pub use error::{EngineError, EnrichmentError, ExtractionError, Result};
pub use extraction::{
    normalize_date, DateNormalizer, ExpiryFieldExtractor, FieldExtractionEngine, EXPIRY_FIELD,
};
pub use models::{
    CandidateSource, Category, CategoryConfidence, ConfidenceLevel, EngineConfig,
    ExtractionCandidate, ExtractionInput, ExtractionResult, ExtractionWarning, FieldValue,
};
pub use sanitize::{sanitize, PiiKind, PiiSanitizer, SanitizeReport};
pub use schema::{CategorySchema, CategorySchemaRegistry};
