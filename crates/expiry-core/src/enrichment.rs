//! Optional AI enrichment collaborator.
//!
//! The engine never calls an external service itself. A caller may hand it
//! an [`EnrichmentProvider`]; its answer becomes the lowest-precedence
//! candidate and only fills fields the deterministic passes left empty.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{EngineError, EnrichmentError};
use crate::models::config::EnrichmentConfig;
use crate::models::document::{CandidateSource, Category, ExtractionCandidate};

/// What an enrichment provider is asked about.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRequest {
    /// Sanitized document text.
    pub text: String,
    pub category_hint: Option<Category>,
}

/// A source of one extra extraction candidate, typically an LLM.
pub trait EnrichmentProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    fn enrich(
        &self,
        request: &EnrichmentRequest,
    ) -> impl Future<Output = Result<ExtractionCandidate, EnrichmentError>> + Send;
}

/// Provider used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnrichment;

impl EnrichmentProvider for NoEnrichment {
    fn name(&self) -> &str {
        "none"
    }

    async fn enrich(
        &self,
        _request: &EnrichmentRequest,
    ) -> Result<ExtractionCandidate, EnrichmentError> {
        Err(EnrichmentError::Unavailable("no enrichment provider configured".into()))
    }
}

/// Replays one stored candidate for every request.
#[derive(Debug, Clone)]
pub struct StaticEnrichment {
    candidate: ExtractionCandidate,
}

impl StaticEnrichment {
    pub fn new(candidate: ExtractionCandidate) -> Self {
        Self { candidate }
    }

    /// Parse stored collaborator output.
    pub fn from_json(json: &str) -> Result<Self, EnrichmentError> {
        ExtractionCandidate::from_json(json).map(Self::new)
    }

    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))
    }
}

impl EnrichmentProvider for StaticEnrichment {
    fn name(&self) -> &str {
        "static"
    }

    async fn enrich(
        &self,
        _request: &EnrichmentRequest,
    ) -> Result<ExtractionCandidate, EnrichmentError> {
        Ok(self.candidate.clone())
    }
}

/// Timeout and retry budget for one enrichment call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl From<&EnrichmentConfig> for EnrichmentPolicy {
    fn from(config: &EnrichmentConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_retries: config.max_retries,
        }
    }
}

/// Call the provider under the policy.
///
/// Timeouts and transport failures are retried; rate limits, auth failures
/// and malformed answers are not. A successful answer is always tagged as
/// an AI candidate.
pub async fn request_candidate<P: EnrichmentProvider>(
    provider: &P,
    request: &EnrichmentRequest,
    policy: EnrichmentPolicy,
) -> Result<ExtractionCandidate, EnrichmentError> {
    let mut attempt = 0;
    loop {
        let outcome = match tokio::time::timeout(policy.timeout, provider.enrich(request)).await {
            Ok(result) => result,
            Err(_) => Err(EnrichmentError::Timeout(policy.timeout)),
        };

        match outcome {
            Ok(mut candidate) => {
                candidate.source = CandidateSource::Ai;
                debug!(
                    "Enrichment '{}' returned {} fields",
                    provider.name(),
                    candidate.fields.len()
                );
                return Ok(candidate);
            }
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    "Enrichment '{}' failed ({}), retry {}/{}",
                    provider.name(),
                    e,
                    attempt,
                    policy.max_retries
                );
            }
            Err(e) => return Err(e),
        }
    }
}
