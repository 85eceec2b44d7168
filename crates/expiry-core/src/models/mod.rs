//! Data models for extraction inputs, results, and configuration.

pub mod config;
pub mod document;

pub use config::{ClassifierConfig, EngineConfig, EnrichmentConfig, ExpiryConfig};
pub use document::{
    CandidateSource, Category, CategoryConfidence, ConfidenceLevel, ExtractionCandidate,
    ExtractionInput, ExtractionResult, ExtractionWarning, FieldValue, UnknownCategory,
};
