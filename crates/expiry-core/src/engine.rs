//! The single extraction entry point.
//!
//! `raw text -> predictor (unsanitized) -> sanitizer -> heuristic, regex and
//! keyword passes (sanitized) -> optional enrichment -> aggregator`.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::aggregate::{CategoryDecision, ResultAggregator};
use crate::classify::{CategoryPrediction, CategoryPredictor, PredictionReason};
use crate::enrichment::{request_candidate, EnrichmentPolicy, EnrichmentProvider, EnrichmentRequest};
use crate::error::ExtractionError;
use crate::extraction::{ExpiryFieldExtractor, FieldExtractionEngine, HeuristicPass, EXPIRY_FIELD};
use crate::models::config::EngineConfig;
use crate::models::document::{
    CandidateSource, Category, ExtractionCandidate, ExtractionInput, ExtractionResult,
    ExtractionWarning,
};
use crate::sanitize::PiiSanitizer;

/// Category confidence when the caller's hint is used.
const HINT_CONFIDENCE: u8 = 100;

/// OCR confidence (percent) below which a warning is attached.
const LOW_OCR_CONFIDENCE: f32 = 50.0;

/// Deterministic state of one request, before merging.
struct Prepared {
    today: NaiveDate,
    decision: CategoryDecision,
    sanitized: String,
    candidates: Vec<ExtractionCandidate>,
}

/// Turns OCR text into an [`ExtractionResult`].
///
/// Never fails on input data: empty or unusable text yields a well-formed
/// result with missing values and low confidence.
pub struct ExtractionEngine {
    config: EngineConfig,
    sanitizer: PiiSanitizer,
    predictor: CategoryPredictor,
}

impl ExtractionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            predictor: CategoryPredictor::new(config.classifier.clone()),
            sanitizer: PiiSanitizer::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the deterministic passes only.
    pub fn extract(&self, input: &ExtractionInput) -> ExtractionResult {
        let start = Instant::now();
        match self.prepare(input) {
            Some(prepared) => self.finish(prepared, start),
            None => ExtractionResult::empty(),
        }
    }

    /// Run the deterministic passes, then ask `provider` to fill gaps.
    ///
    /// Provider failures are logged and otherwise ignored.
    pub async fn extract_enriched<P: EnrichmentProvider>(
        &self,
        input: &ExtractionInput,
        provider: &P,
    ) -> ExtractionResult {
        let start = Instant::now();
        let Some(mut prepared) = self.prepare(input) else {
            return ExtractionResult::empty();
        };

        if self.config.enrichment.enabled {
            let request = EnrichmentRequest {
                text: prepared.sanitized.clone(),
                category_hint: Some(prepared.decision.category),
            };
            let policy = EnrichmentPolicy::from(&self.config.enrichment);

            match request_candidate(provider, &request, policy).await {
                Ok(mut candidate) => {
                    candidate.category = prepared.decision.category;
                    prepared.candidates.push(candidate);
                }
                Err(e) => warn!("{}", ExtractionError::from(e)),
            }
        }

        self.finish(prepared, start)
    }

    fn prepare(&self, input: &ExtractionInput) -> Option<Prepared> {
        if input.raw_text.trim().is_empty() {
            debug!("{}", ExtractionError::NoTextProvided);
            return None;
        }

        let today = self.config.today();

        // Classification must see the text before redaction
        let prediction = self.predictor.predict_detailed(&input.raw_text);
        let mut decision = decide(input.category_hint, &prediction);

        if let Some(percent) = input.ocr_confidence.map(ocr_percent) {
            if percent < LOW_OCR_CONFIDENCE {
                decision.warnings.push(ExtractionWarning::LowOcrConfidence(percent.round() as u8));
            }
        }

        let report = self.sanitizer.sanitize_with_report(&input.raw_text);
        let text = report.text;
        let category = decision.category;

        let heuristics =
            HeuristicPass::new(self.config.expiry.clone(), today).candidate(&text, category);
        let regex = FieldExtractionEngine::new(today).candidate(&text, category);

        let expiry = ExpiryFieldExtractor::new(self.config.expiry.clone(), today).extract(&text);
        let mut keyword = ExtractionCandidate::new(CandidateSource::Keyword, category);
        keyword.insert(EXPIRY_FIELD, expiry.field);
        for warning in expiry.warnings {
            keyword.push_warning(warning);
        }

        Some(Prepared {
            today,
            decision,
            sanitized: text,
            candidates: vec![heuristics, regex, keyword],
        })
    }

    fn finish(&self, prepared: Prepared, start: Instant) -> ExtractionResult {
        let result =
            ResultAggregator::new(prepared.today).merge(prepared.decision, &prepared.candidates);

        info!(
            "Extracted {} ({}%): expiry {}, {} fields, {} warnings in {}ms",
            result.category,
            result.category_confidence.percentage,
            result.expiry_date.confidence_level,
            result.fields.len(),
            result.warnings.len(),
            start.elapsed().as_millis()
        );
        result
    }
}

impl Default for ExtractionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Combine the caller's hint with the prediction.
///
/// A hint wins unless the license rule fired; licenses always stay `other`.
fn decide(hint: Option<Category>, prediction: &CategoryPrediction) -> CategoryDecision {
    match hint {
        Some(hint) if prediction.is_license() && hint != Category::Other => {
            debug!("Category hint {} overridden by license rule", hint);
            CategoryDecision::new(Category::Other, prediction.confidence)
                .with_warning(ExtractionWarning::CategoryHintOverridden { hint })
        }
        Some(hint) => {
            let decision = CategoryDecision::new(hint, HINT_CONFIDENCE);
            if prediction.reason == PredictionReason::Scored && prediction.category != hint {
                decision.with_warning(ExtractionWarning::CategoryHintDisagrees {
                    hint,
                    predicted: prediction.category,
                })
            } else {
                decision
            }
        }
        None => CategoryDecision::new(prediction.category, prediction.confidence),
    }
}

/// OCR engines report either 0..1 or 0..100.
fn ocr_percent(confidence: f32) -> f32 {
    if confidence <= 1.0 {
        confidence * 100.0
    } else {
        confidence
    }
}
