//! Weighted-keyword document classification.
//!
//! Runs on the unsanitized text: redaction can remove the very words that
//! tell a license apart from a subscription.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::models::config::ClassifierConfig;
use crate::models::document::Category;

/// Confidence reported for any non-`other` prediction.
pub const RULE_CONFIDENCE: u8 = 85;

/// Confidence reported for `other`.
pub const DEFAULT_CONFIDENCE: u8 = 60;

/// Number of license indicators that force `other`.
const LICENSE_INDICATOR_THRESHOLD: usize = 2;

/// Order in which tied categories are resolved.
const TIE_BREAK_ORDER: [Category; 5] = [
    Category::Warranty,
    Category::Insurance,
    Category::Medicine,
    Category::Subscription,
    Category::Amc,
];

const WARRANTY_KEYWORDS: &[(&str, u32)] = &[
    ("warranty", 15),
    ("guarantee", 12),
    ("warranty card", 8),
    ("extended warranty", 7),
    ("imei", 7),
    ("serial no", 6),
    ("serial number", 6),
    ("date of purchase", 6),
    ("purchase date", 6),
    ("model no", 5),
    ("product registration", 5),
    ("invoice", 4),
];

const INSURANCE_KEYWORDS: &[(&str, u32)] = &[
    ("insurance", 15),
    ("policy", 10),
    ("insured", 9),
    ("irda", 9),
    ("sum insured", 8),
    ("nominee", 8),
    ("insurer", 8),
    ("period of insurance", 8),
    ("premium", 7),
    ("no claim bonus", 7),
    ("policyholder", 6),
    ("policy holder", 6),
    ("coverage", 6),
    ("claim", 5),
];

const MEDICINE_KEYWORDS: &[(&str, u32)] = &[
    ("paracetamol", 13),
    ("tablet", 12),
    ("capsule", 12),
    ("syrup", 12),
    ("schedule h", 11),
    ("ointment", 11),
    ("injection", 10),
    ("dosage", 9),
    ("pharma", 9),
    ("store below", 9),
    ("batch", 8),
    ("mfg", 7),
    ("mfd", 7),
    ("mg", 6),
    ("best before", 5),
    ("use before", 5),
];

const SUBSCRIPTION_KEYWORDS: &[(&str, u32)] = &[
    ("subscription", 15),
    ("netflix", 14),
    ("spotify", 14),
    ("membership", 11),
    ("subscribe", 10),
    ("auto-renew", 9),
    ("auto renew", 9),
    ("next billing", 9),
    ("monthly plan", 9),
    ("annual plan", 9),
    ("renewal", 8),
    ("renews", 8),
    ("billing", 8),
    ("cancel anytime", 7),
    ("prime", 5),
    ("plan", 4),
    ("valid till", 4),
];

const AMC_KEYWORDS: &[(&str, u32)] = &[
    ("annual maintenance", 18),
    ("amc", 15),
    ("maintenance contract", 14),
    ("service contract", 12),
    ("preventive maintenance", 10),
    ("service visits", 8),
    ("service provider", 7),
    ("comprehensive", 6),
    ("breakdown", 6),
    ("contract", 5),
];

lazy_static! {
    // Driving licenses and other government documents
    static ref LICENSE_INDICATORS: Vec<Regex> = [
        r"driving\s+licen[cs]e",
        r"\bd\.?\s?l\.?\s*no\b",
        r"\blicen[cs]e\s+no\b",
        r"date\s+of\s+issue",
        r"union\s+of\s+india",
        r"transport\s+department",
        r"regional\s+transport",
        r"(?:issuing|licensing)\s+authority",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
    .collect();
}

fn keywords_for(category: Category) -> &'static [(&'static str, u32)] {
    match category {
        Category::Warranty => WARRANTY_KEYWORDS,
        Category::Insurance => INSURANCE_KEYWORDS,
        Category::Medicine => MEDICINE_KEYWORDS,
        Category::Subscription => SUBSCRIPTION_KEYWORDS,
        Category::Amc => AMC_KEYWORDS,
        Category::Other => &[],
    }
}

/// Why a category was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionReason {
    /// Text too short to score.
    TooShort,
    /// Enough license indicators matched.
    LicenseRule,
    /// No category reached the minimum score.
    BelowThreshold,
    /// Highest keyword score.
    Scored,
}

impl PredictionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooShort => "too_short",
            Self::LicenseRule => "license_rule",
            Self::BelowThreshold => "below_threshold",
            Self::Scored => "scored",
        }
    }
}

/// Full outcome of a prediction, for callers that want the detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPrediction {
    pub category: Category,
    pub confidence: u8,
    pub reason: PredictionReason,
    /// Aggregate keyword weight per category, in tie-break order.
    pub scores: Vec<(Category, u32)>,
    pub license_indicators: usize,
}

impl CategoryPrediction {
    fn new(
        category: Category,
        reason: PredictionReason,
        scores: Vec<(Category, u32)>,
        license_indicators: usize,
    ) -> Self {
        Self {
            category,
            confidence: CategoryPredictor::confidence_for(category),
            reason,
            scores,
            license_indicators,
        }
    }

    /// Whether the license privacy rule decided the category.
    pub fn is_license(&self) -> bool {
        self.reason == PredictionReason::LicenseRule
    }
}

/// Classifies raw OCR text into a [`Category`].
#[derive(Debug, Clone, Default)]
pub struct CategoryPredictor {
    config: ClassifierConfig,
}

impl CategoryPredictor {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn predict(&self, text: &str) -> Category {
        self.predict_detailed(text).category
    }

    /// Confidence (0-100) in `category` for this text.
    ///
    /// Flat: rule matches are reliable, `other` is an explicit low-certainty
    /// default. The text does not change the figure.
    pub fn confidence(&self, _text: &str, category: Category) -> u8 {
        Self::confidence_for(category)
    }

    fn confidence_for(category: Category) -> u8 {
        match category {
            Category::Other => DEFAULT_CONFIDENCE,
            _ => RULE_CONFIDENCE,
        }
    }

    /// Aggregate keyword weight for each scored category.
    pub fn scores(&self, text: &str) -> Vec<(Category, u32)> {
        let lower = text.to_lowercase();
        TIE_BREAK_ORDER
            .iter()
            .map(|&category| {
                let score = keywords_for(category)
                    .iter()
                    .filter(|(keyword, _)| lower.contains(keyword))
                    .map(|(_, weight)| weight)
                    .sum();
                (category, score)
            })
            .collect()
    }

    /// Number of distinct license indicators present.
    pub fn license_indicators(&self, text: &str) -> usize {
        LICENSE_INDICATORS.iter().filter(|p| p.is_match(text)).count()
    }

    pub fn predict_detailed(&self, text: &str) -> CategoryPrediction {
        if text.trim().chars().count() < self.config.min_text_length {
            let reason = PredictionReason::TooShort;
            return CategoryPrediction::new(Category::Other, reason, Vec::new(), 0);
        }

        let indicators = self.license_indicators(text);
        let scores = self.scores(text);

        if indicators >= LICENSE_INDICATOR_THRESHOLD {
            debug!("License rule matched {} indicators", indicators);
            let reason = PredictionReason::LicenseRule;
            return CategoryPrediction::new(Category::Other, reason, scores, indicators);
        }

        // First category reaching the maximum wins
        let best = scores
            .iter()
            .fold(None, |best: Option<(Category, u32)>, &(category, score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((category, score)),
            });

        debug!("Category scores: {:?}", scores);

        match best {
            Some((category, score)) if score >= self.config.min_score => {
                CategoryPrediction::new(category, PredictionReason::Scored, scores, indicators)
            }
            _ => CategoryPrediction::new(
                Category::Other,
                PredictionReason::BelowThreshold,
                scores,
                indicators,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn predict(text: &str) -> Category {
        CategoryPredictor::default().predict(text)
    }

    #[test]
    fn test_medicine_strip() {
        assert_eq!(predict("Paracetamol 500mg EXP: 31/12/2024 BATCH: ABC123"), Category::Medicine);
    }

    #[test]
    fn test_warranty_card() {
        assert_eq!(predict("Warranty Card Valid up to Date: 22-02-2022"), Category::Warranty);
    }

    #[test]
    fn test_each_category() {
        assert_eq!(
            predict("Health Insurance Policy Schedule, Sum Insured 5L"),
            Category::Insurance
        );
        assert_eq!(predict("Annual Maintenance Contract for Split AC"), Category::Amc);
        assert_eq!(predict("Your Netflix subscription renews on 1 Jan"), Category::Subscription);
    }

    #[test]
    fn test_license_beats_subscription() {
        let text = "DRIVING LICENCE\nDL No MH12 20110012345\nSubscription valid till 09/03/2041";
        let prediction = CategoryPredictor::default().predict_detailed(text);

        assert_eq!(prediction.category, Category::Other);
        assert!(prediction.is_license());
        assert_eq!(prediction.license_indicators, 2);
    }

    #[test]
    fn test_single_indicator_is_not_enough() {
        let text = "Insurance policy, Date of Issue 01/04/2024";
        assert_eq!(predict(text), Category::Insurance);
    }

    #[test]
    fn test_short_text_is_other() {
        let prediction = CategoryPredictor::default().predict_detailed("warranty");
        assert_eq!(prediction.category, Category::Other);
        assert_eq!(prediction.reason, PredictionReason::TooShort);
        assert!(prediction.scores.is_empty());
    }

    #[test]
    fn test_below_threshold_is_other() {
        let prediction = CategoryPredictor::default().predict_detailed("choose a plan today");
        assert_eq!(prediction.category, Category::Other);
        assert_eq!(prediction.reason, PredictionReason::BelowThreshold);
    }

    #[test]
    fn test_tie_goes_to_earlier_category() {
        // warranty 15, insurance 15
        assert_eq!(predict("warranty or insurance?"), Category::Warranty);
    }

    #[test]
    fn test_flat_confidence() {
        let predictor = CategoryPredictor::default();
        assert_eq!(predictor.confidence("anything", Category::Medicine), 85);
        assert_eq!(predictor.confidence("anything", Category::Other), 60);
        assert_eq!(predictor.predict_detailed("Paracetamol 500mg tablets").confidence, 85);
    }

    #[test]
    fn test_scores_listed_in_tie_break_order() {
        let scores = CategoryPredictor::default().scores("AMC");
        let order: Vec<Category> = scores.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, TIE_BREAK_ORDER.to_vec());
        assert_eq!(scores[4], (Category::Amc, 15));
    }
}
