//! Document categories, field values, and extraction results.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score at or above which a field is `High` confidence.
pub const HIGH_CONFIDENCE: u8 = 85;

/// Score at or above which a field is `Medium` confidence.
pub const MEDIUM_CONFIDENCE: u8 = 60;

/// Kind of expiry-bearing document.
///
/// `Other` is the privacy-first default: licenses, IDs and government
/// documents land here and almost every field is forbidden for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Category {
    Warranty,
    Insurance,
    Amc,
    Subscription,
    Medicine,
    #[default]
    Other,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Category; 6] = [
        Category::Warranty,
        Category::Insurance,
        Category::Amc,
        Category::Subscription,
        Category::Medicine,
        Category::Other,
    ];

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warranty => "warranty",
            Self::Insurance => "insurance",
            Self::Amc => "amc",
            Self::Subscription => "subscription",
            Self::Medicine => "medicine",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warranty" | "guarantee" => Ok(Self::Warranty),
            "insurance" => Ok(Self::Insurance),
            "amc" => Ok(Self::Amc),
            "subscription" | "membership" => Ok(Self::Subscription),
            "medicine" | "medication" => Ok(Self::Medicine),
            "other" => Ok(Self::Other),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Three-tier confidence label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[serde(alias = "low", alias = "LOW")]
    Low,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "high", alias = "HIGH")]
    High,
}

impl ConfidenceLevel {
    /// Map a 0-100 score onto a level using the fixed thresholds.
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_CONFIDENCE {
            Self::High
        } else if score >= MEDIUM_CONFIDENCE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// A score that sits inside this level's band.
    pub fn representative_score(&self) -> u8 {
        match self {
            Self::High => 90,
            Self::Medium => 70,
            Self::Low => 40,
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        };
        f.write_str(s)
    }
}

/// One extracted value with its confidence.
///
/// The level is always derived from the score, and a missing value always
/// carries a zero score, so `value == None` implies `Low`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawFieldValue")]
pub struct FieldValue {
    pub value: Option<String>,
    #[serde(rename = "confidence")]
    pub confidence_level: ConfidenceLevel,
    pub confidence_score: u8,
    pub source_keyword: Option<String>,
}

impl FieldValue {
    /// A present value with the given score (clamped to 100).
    pub fn new(value: impl Into<String>, score: u8) -> Self {
        Self::from_parts(Some(value.into()), score)
    }

    /// An absent value.
    pub fn missing() -> Self {
        Self {
            value: None,
            confidence_level: ConfidenceLevel::Low,
            confidence_score: 0,
            source_keyword: None,
        }
    }

    /// Build from an optional value, enforcing the invariants.
    pub fn from_parts(value: Option<String>, score: u8) -> Self {
        let value = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        match value {
            Some(value) => {
                let score = score.min(100);
                Self {
                    value: Some(value),
                    confidence_level: ConfidenceLevel::from_score(score),
                    confidence_score: score,
                    source_keyword: None,
                }
            }
            None => Self::missing(),
        }
    }

    /// Record the keyword that anchored the match.
    pub fn with_source(mut self, keyword: impl Into<String>) -> Self {
        if self.value.is_some() {
            self.source_keyword = Some(keyword.into());
        }
        self
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::missing()
    }
}

/// Loose confidence as it appears in collaborator JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawConfidence {
    Level(ConfidenceLevel),
    Score(f64),
}

/// Every field shape accepted at the deserialization boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawFieldValue {
    Null,
    Text(String),
    Detailed {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        confidence: Option<RawConfidence>,
        #[serde(default, rename = "confidenceScore", alias = "confidence_score")]
        confidence_score: Option<f64>,
        #[serde(default, rename = "sourceKeyword", alias = "source_keyword")]
        source_keyword: Option<String>,
    },
}

/// Score given to collaborator values that carry no confidence at all.
const UNSCORED_FIELD: u8 = MEDIUM_CONFIDENCE;

fn score_from_number(n: f64) -> u8 {
    if !n.is_finite() || n <= 0.0 {
        return 0;
    }
    // Fractions are 0..1, everything else is a percentage.
    let pct = if n <= 1.0 { n * 100.0 } else { n };
    pct.round().min(100.0) as u8
}

impl From<RawFieldValue> for FieldValue {
    fn from(raw: RawFieldValue) -> Self {
        match raw {
            RawFieldValue::Null => FieldValue::missing(),
            RawFieldValue::Text(text) => FieldValue::from_parts(Some(text), UNSCORED_FIELD),
            RawFieldValue::Detailed {
                value,
                confidence,
                confidence_score,
                source_keyword,
            } => {
                let score = match (confidence_score, confidence) {
                    (Some(n), _) => score_from_number(n),
                    (None, Some(RawConfidence::Score(n))) => score_from_number(n),
                    (None, Some(RawConfidence::Level(level))) => level.representative_score(),
                    (None, None) => UNSCORED_FIELD,
                };
                let field = FieldValue::from_parts(value, score);
                match source_keyword {
                    Some(keyword) => field.with_source(keyword),
                    None => field,
                }
            }
        }
    }
}

/// Which pass produced a candidate, in merge precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    /// Per-document-type heuristics.
    Heuristic,
    /// Category regex rules.
    Regex,
    /// Generic keyword-proximity search.
    Keyword,
    /// Optional AI enrichment; only fills gaps.
    #[default]
    Ai,
}

impl CandidateSource {
    /// Lower is stronger.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Heuristic => 0,
            Self::Regex => 1,
            Self::Keyword => 2,
            Self::Ai => 3,
        }
    }
}

/// One pass's opinion about a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionCandidate {
    #[serde(default)]
    pub source: CandidateSource,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ExtractionCandidate {
    pub fn new(source: CandidateSource, category: Category) -> Self {
        Self {
            source,
            category,
            fields: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Add a field, ignoring absent values.
    pub fn insert(&mut self, name: &str, value: FieldValue) {
        if value.is_present() {
            self.fields.insert(name.to_string(), value);
        }
    }

    pub fn with_field(mut self, name: &str, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn push_warning(&mut self, warning: ExtractionWarning) {
        self.warnings.push(warning.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.warnings.is_empty()
    }

    /// Parse a candidate from collaborator JSON.
    ///
    /// A missing `source` defaults to `ai`. Field values may be bare strings
    /// or `{ value, confidence }` objects.
    pub fn from_json(json: &str) -> std::result::Result<Self, crate::error::EnrichmentError> {
        serde_json::from_str(json)
            .map_err(|e| crate::error::EnrichmentError::MalformedResponse(e.to_string()))
    }
}

/// Category plus how sure the predictor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfidence {
    pub level: ConfidenceLevel,
    pub percentage: u8,
}

impl CategoryConfidence {
    pub fn from_percentage(percentage: u8) -> Self {
        let percentage = percentage.min(100);
        Self {
            level: ConfidenceLevel::from_score(percentage),
            percentage,
        }
    }
}

/// Input handed to the engine by the API layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionInput {
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_hint: Option<Category>,
    /// OCR engine confidence, either 0..1 or 0..100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,
}

impl ExtractionInput {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            category_hint: None,
            ocr_confidence: None,
        }
    }

    pub fn with_category_hint(mut self, category: Category) -> Self {
        self.category_hint = Some(category);
        self
    }

    pub fn with_ocr_confidence(mut self, confidence: f32) -> Self {
        self.ocr_confidence = Some(confidence);
        self
    }
}

/// The canonical, schema-sanitized answer for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub category: Category,
    pub category_confidence: CategoryConfidence,
    pub expiry_date: FieldValue,
    pub fields: BTreeMap<String, FieldValue>,
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    /// The result for empty input: `other`, nothing found, low confidence.
    pub fn empty() -> Self {
        Self {
            category: Category::Other,
            category_confidence: CategoryConfidence::from_percentage(0),
            expiry_date: FieldValue::missing(),
            fields: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Shortcut for the ISO expiry date, if any.
    pub fn expiry(&self) -> Option<&str> {
        self.expiry_date.as_str()
    }
}

/// Non-fatal conditions reported alongside a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionWarning {
    /// More than one plausible expiry date; the best one was kept.
    AmbiguousDateCandidates { chosen: String, others: Vec<String> },
    /// The expiry date lies before today.
    PastExpirySuspected { date: String },
    /// A caller hint was replaced by the license privacy rule.
    CategoryHintOverridden { hint: Category },
    /// The predictor disagrees with an honoured hint.
    CategoryHintDisagrees { hint: Category, predicted: Category },
    /// A schema-required field was not found.
    MissingRequiredField(String),
    /// The OCR engine reported low confidence for the text.
    LowOcrConfidence(u8),
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousDateCandidates { chosen, others } => write!(
                f,
                "multiple plausible expiry dates found ({}); using {}",
                others.join(", "),
                chosen
            ),
            Self::PastExpirySuspected { date } => {
                write!(f, "expiry date {} is in the past", date)
            }
            Self::CategoryHintOverridden { hint } => write!(
                f,
                "category hint '{}' ignored: document looks like a license or government ID",
                hint
            ),
            Self::CategoryHintDisagrees { hint, predicted } => write!(
                f,
                "category hint '{}' used, but text looks like '{}'",
                hint, predicted
            ),
            Self::MissingRequiredField(field) => {
                write!(f, "required field '{}' not found", field)
            }
            Self::LowOcrConfidence(score) => {
                write!(f, "OCR confidence {} is low; fields may be unreliable", score)
            }
        }
    }
}
