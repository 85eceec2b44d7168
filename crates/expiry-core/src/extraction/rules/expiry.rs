//! Expiry date search by keyword proximity.
//!
//! Each expiry keyword opens a forward window in which the first date token
//! not claimed by an exclusion keyword (issue, manufacture, birth) becomes a
//! candidate. Candidates are ranked by confidence level, then by distance to
//! their keyword. When no keyword yields anything, a whole-text fallback picks
//! the date closest to today, at low confidence.

use chrono::{Duration, Months, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::dates::{DateNormalizer, DatePrecision, DateToken};
use crate::models::config::ExpiryConfig;
use crate::models::document::{ConfidenceLevel, ExtractionWarning, FieldValue};

/// How precise a keyword is, which sets its window and base score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordStrength {
    Strong,
    Standard,
    Weak,
}

impl KeywordStrength {
    fn base_score(&self) -> u8 {
        match self {
            Self::Strong => 95,
            Self::Standard => 92,
            Self::Weak => 89,
        }
    }
}

/// An expiry keyword and the phrasings that spell it.
pub struct ExpiryKeyword {
    pub label: &'static str,
    pub strength: KeywordStrength,
    pattern: Regex,
}

fn keyword(label: &'static str, pattern: &str, strength: KeywordStrength) -> ExpiryKeyword {
    ExpiryKeyword {
        label,
        strength,
        pattern: Regex::new(&format!(r"(?i)\b(?:{})\b", pattern)).unwrap(),
    }
}

lazy_static! {
    // Highest precision first
    pub static ref EXPIRY_KEYWORDS: Vec<ExpiryKeyword> = {
        use KeywordStrength::*;
        vec![
            keyword("valid till", r"valid\s*(?:till|til)", Strong),
            keyword("valid until", r"valid\s*until", Strong),
            keyword("valid up to", r"valid\s*up\s*to", Strong),
            keyword("valid through", r"valid\s*(?:thru|through)", Strong),
            keyword("expiry date", r"expiry\s*date|date\s+of\s+expiry|expiration\s+date", Strong),
            keyword("expires on", r"expires?\s+on|expiring\s+on", Strong),
            keyword("best before", r"best\s*before", Strong),
            keyword("use before", r"use\s*(?:before|by)", Strong),
            keyword("subscription ends on", r"subscription\s+(?:ends|expires|valid\s+till)(?:\s+on)?", Strong),
            keyword("membership expiry", r"membership\s+(?:expiry|expires|valid\s+till)", Strong),
            keyword("warranty till", r"warranty\s+(?:valid\s+)?(?:till|until|upto|up\s+to|expires(?:\s+on)?|expiry(?:\s+date)?|end\s+date)", Strong),
            keyword("policy expiry", r"policy\s+(?:expiry|end)(?:\s+date)?|policy\s+expires(?:\s+on)?", Strong),
            keyword("coverage ends", r"cover(?:age)?\s+(?:ends|expires)(?:\s+on)?", Strong),
            keyword("contract end date", r"contract\s+(?:end|expiry)(?:\s+date)?|amc\s+(?:valid\s+)?(?:till|upto|up\s+to|expiry)", Strong),
            keyword("renewal date", r"(?:next\s+)?renewal\s+date|renews\s+on|next\s+billing\s+date", Standard),
            keyword("exp date", r"exp\.?\s*(?:date|dt)", Standard),
            keyword("expiry", r"expiry|expires|expiration", Standard),
            keyword("validity", r"validity", Standard),
            keyword("end date", r"end\s+date", Standard),
            keyword("exp", r"exp", Weak),
        ]
    };

    // Dates next to these are never expiry dates
    pub static ref EXCLUSION_KEYWORDS: Vec<Regex> = [
        r"date\s+of\s+issue|issue\s+date|issued\s+on|date\s+of\s+issuance",
        r"mfg|mfd|manufactur(?:ing|ed|e)|date\s+of\s+manufacture|packed\s+on|pkd",
        r"date\s+of\s+birth|d\.?o\.?b|born",
        r"purchase\s+date|date\s+of\s+purchase|invoice\s+date|bill\s+date|order\s+date",
        r"(?:start|commencement|effective)\s+date|effective\s+from",
    ]
    .iter()
    .map(|p| Regex::new(&format!(r"(?i)\b(?:{})\b", p)).unwrap())
    .collect();
}

/// Whether the text contains any expiry keyword at all.
pub fn has_expiry_keyword(text: &str) -> bool {
    EXPIRY_KEYWORDS.iter().any(|k| k.pattern.is_match(text))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelKind {
    Expiry,
    Exclusion,
}

#[derive(Debug, Clone, Copy)]
struct Label {
    start: usize,
    end: usize,
    kind: LabelKind,
}

#[derive(Debug, Clone)]
struct Candidate {
    token: DateToken,
    keyword: Option<&'static str>,
    score: u8,
    distance: usize,
}

impl Candidate {
    fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.score)
    }

    /// Ordering key: higher wins.
    fn rank(&self) -> (ConfidenceLevel, std::cmp::Reverse<usize>, u8, std::cmp::Reverse<usize>) {
        (
            self.level(),
            std::cmp::Reverse(self.distance),
            self.score,
            std::cmp::Reverse(self.token.start),
        )
    }
}

/// Outcome of an expiry search.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryExtraction {
    pub field: FieldValue,
    pub warnings: Vec<ExtractionWarning>,
}

/// Finds the single best expiry date in a text.
pub struct ExpiryFieldExtractor {
    config: ExpiryConfig,
    normalizer: DateNormalizer,
}

impl ExpiryFieldExtractor {
    pub fn new(config: ExpiryConfig, today: NaiveDate) -> Self {
        Self {
            config,
            normalizer: DateNormalizer::new(today),
        }
    }

    fn today(&self) -> NaiveDate {
        self.normalizer.today()
    }

    /// The best expiry date as a field value.
    pub fn extract_expiry(&self, text: &str) -> FieldValue {
        self.extract(text).field
    }

    pub fn extract(&self, text: &str) -> ExpiryExtraction {
        let tokens = self.normalizer.scan(text);
        if tokens.is_empty() {
            return ExpiryExtraction {
                field: FieldValue::missing(),
                warnings: Vec::new(),
            };
        }

        let labels = find_labels(text);
        let candidates: Vec<Candidate> = self
            .keyword_candidates(text, &tokens, &labels)
            .into_iter()
            .filter(|c| self.is_plausible(c))
            .collect();

        debug!(
            "Expiry search: {} date tokens, {} keyword candidates",
            tokens.len(),
            candidates.len()
        );

        if let Some(best) = candidates.iter().max_by_key(|c| c.rank()) {
            let warnings = ambiguity_warning(best, &candidates).into_iter().collect();
            let field = FieldValue::new(best.token.resolved.iso(), best.score);
            let field = match best.keyword {
                Some(keyword) => field.with_source(keyword),
                None => field,
            };
            return ExpiryExtraction { field, warnings };
        }

        let field = self
            .fallback(&tokens, &labels)
            .map(|c| FieldValue::new(c.token.resolved.iso(), c.score))
            .unwrap_or_else(FieldValue::missing);

        ExpiryExtraction {
            field,
            warnings: Vec::new(),
        }
    }

    fn window(&self, strength: KeywordStrength) -> usize {
        match strength {
            KeywordStrength::Strong => self.config.strong_window,
            KeywordStrength::Standard => self.config.standard_window,
            KeywordStrength::Weak => self.config.weak_window,
        }
    }

    /// One candidate per date token, keeping the best keyword for each.
    fn keyword_candidates(
        &self,
        text: &str,
        tokens: &[DateToken],
        labels: &[Label],
    ) -> Vec<Candidate> {
        let mut hits: Vec<(usize, usize, &ExpiryKeyword)> = EXPIRY_KEYWORDS
            .iter()
            .flat_map(|k| k.pattern.find_iter(text).map(move |m| (m.start(), m.end(), k)))
            .collect();
        hits.sort_by_key(|&(start, _, _)| start);

        let mut best_per_token: Vec<Candidate> = Vec::new();

        for (_, kw_end, keyword) in hits {
            let window = self.window(keyword.strength);
            let found = tokens
                .iter()
                .filter(|t| t.start >= kw_end && t.start - kw_end <= window)
                .find(|t| !self.is_excluded(t, labels));

            let Some(token) = found else { continue };
            let distance = token.start - kw_end;
            let candidate = Candidate {
                token: token.clone(),
                keyword: Some(keyword.label),
                score: self.keyword_score(
                    keyword.strength,
                    distance,
                    window,
                    token.resolved.precision(),
                ),
                distance,
            };

            match best_per_token.iter_mut().find(|c| c.token.start == token.start) {
                Some(existing) if candidate.rank() > existing.rank() => *existing = candidate,
                Some(_) => {}
                None => best_per_token.push(candidate),
            }
        }

        best_per_token
    }

    fn keyword_score(
        &self,
        strength: KeywordStrength,
        distance: usize,
        window: usize,
        precision: DatePrecision,
    ) -> u8 {
        let near = self.config.near_window.max(1);
        let score = if distance <= near {
            strength.base_score() - (distance * 4 / near) as u8
        } else {
            let span = window.saturating_sub(near).max(1);
            let over = (distance - near).min(span);
            80 - (over * 20 / span) as u8
        };

        match precision {
            DatePrecision::Day => score,
            DatePrecision::Month => score.min(80),
            DatePrecision::Year => score.min(65),
        }
    }

    /// A token is excluded when its nearest label is an exclusion keyword.
    ///
    /// The nearest preceding label decides; labels after the token are only
    /// consulted when nothing precedes it within the radius.
    fn is_excluded(&self, token: &DateToken, labels: &[Label]) -> bool {
        let radius = self.config.exclusion_radius;

        let preceding = labels
            .iter()
            .filter(|l| l.end <= token.start && token.start - l.end <= radius)
            .max_by_key(|l| l.end);
        if let Some(label) = preceding {
            return label.kind == LabelKind::Exclusion;
        }

        labels
            .iter()
            .filter(|l| l.start >= token.end && l.start - token.end <= radius)
            .min_by_key(|l| l.start)
            .is_some_and(|l| l.kind == LabelKind::Exclusion)
    }

    fn too_far_ahead(&self, date: NaiveDate) -> bool {
        let months = u32::try_from(self.config.max_future_years.max(1))
            .ok()
            .and_then(|years| years.checked_mul(12));
        months
            .and_then(|months| self.today().checked_add_months(Months::new(months)))
            .is_some_and(|limit| date > limit)
    }

    fn is_stale(&self, date: NaiveDate) -> bool {
        Duration::try_days(self.config.stale_after_days.max(0))
            .and_then(|age| self.today().checked_sub_signed(age))
            .is_some_and(|cutoff| date < cutoff)
    }

    /// Whether a date found with this score may be reported as an expiry.
    ///
    /// Stale dates survive only with a high-confidence anchor.
    pub fn accepts(&self, date: NaiveDate, score: u8) -> bool {
        if self.too_far_ahead(date) {
            return false;
        }
        !self.is_stale(date) || ConfidenceLevel::from_score(score) == ConfidenceLevel::High
    }

    fn is_plausible(&self, candidate: &Candidate) -> bool {
        self.accepts(candidate.token.date(), candidate.score)
    }

    /// Any unexcluded, day- or month-precise date, nearest to today or later.
    fn fallback(&self, tokens: &[DateToken], labels: &[Label]) -> Option<Candidate> {
        let today = self.today();
        let usable: Vec<&DateToken> = tokens
            .iter()
            .filter(|t| t.resolved.precision() != DatePrecision::Year)
            .filter(|t| !self.is_excluded(t, labels))
            .filter(|t| !self.too_far_ahead(t.date()) && !self.is_stale(t.date()))
            .collect();

        let upcoming = usable.iter().filter(|t| t.date() >= today).min_by_key(|t| t.date());
        let (token, score) = match upcoming {
            Some(token) => (*token, 50),
            None => (*usable.iter().max_by_key(|t| t.date())?, 35),
        };

        let score = if token.resolved.precision() == DatePrecision::Month {
            score - 5
        } else {
            score
        };

        Some(Candidate {
            token: token.clone(),
            keyword: None,
            score,
            distance: usize::MAX,
        })
    }
}

fn find_labels(text: &str) -> Vec<Label> {
    let expiry = EXPIRY_KEYWORDS.iter().flat_map(|k| {
        k.pattern.find_iter(text).map(|m| Label {
            start: m.start(),
            end: m.end(),
            kind: LabelKind::Expiry,
        })
    });
    let exclusion = EXCLUSION_KEYWORDS.iter().flat_map(|p| {
        p.find_iter(text).map(|m| Label {
            start: m.start(),
            end: m.end(),
            kind: LabelKind::Exclusion,
        })
    });
    expiry.chain(exclusion).collect()
}

fn ambiguity_warning(best: &Candidate, candidates: &[Candidate]) -> Option<ExtractionWarning> {
    let chosen = best.token.resolved.iso();
    let mut others: Vec<String> = candidates
        .iter()
        .filter(|c| c.level() == best.level())
        .map(|c| c.token.resolved.iso())
        .filter(|iso| *iso != chosen)
        .collect();
    others.sort();
    others.dedup();

    if others.is_empty() {
        None
    } else {
        Some(ExtractionWarning::AmbiguousDateCandidates { chosen, others })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor() -> ExpiryFieldExtractor {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        ExpiryFieldExtractor::new(ExpiryConfig::default(), today)
    }

    #[test]
    fn test_near_keyword_is_high() {
        let field = extractor().extract_expiry("Paracetamol 500mg EXP: 31/12/2024 BATCH: ABC123");
        assert_eq!(field.as_str(), Some("2024-12-31"));
        assert_eq!(field.confidence_level, ConfidenceLevel::High);
        assert_eq!(field.source_keyword.as_deref(), Some("exp"));
    }

    #[test]
    fn test_month_only_is_medium() {
        let field = extractor().extract_expiry("Best before 08/26");
        assert_eq!(field.as_str(), Some("2026-08-31"));
        assert_eq!(field.confidence_level, ConfidenceLevel::Medium);
        assert_eq!(field.source_keyword.as_deref(), Some("best before"));
    }

    #[test]
    fn test_far_keyword_is_medium() {
        let text = format!("Valid till{}15/09/2026", " ".repeat(80));
        let field = extractor().extract_expiry(&text);
        assert_eq!(field.as_str(), Some("2026-09-15"));
        assert_eq!(field.confidence_level, ConfidenceLevel::Medium);
    }

    #[test]
    fn test_manufacture_date_skipped() {
        let field = extractor().extract_expiry("MFG: 01/2024 EXP: 12/2026");
        assert_eq!(field.as_str(), Some("2026-12-31"));
    }

    #[test]
    fn test_issue_date_not_taken_from_wide_window() {
        let text = "Validity: see below. Date of Issue: 10/03/2025 Valid Till: 09/03/2045";
        let field = extractor().extract_expiry(text);
        assert_eq!(field.as_str(), Some("2045-03-09"));
        assert_eq!(field.source_keyword.as_deref(), Some("valid till"));
    }

    #[test]
    fn test_birth_date_never_returned() {
        let field = extractor().extract_expiry("Date of Birth: 12/05/2030");
        assert_eq!(field.value, None);
        assert_eq!(field.confidence_level, ConfidenceLevel::Low);
    }

    #[test]
    fn test_high_later_beats_medium_earlier() {
        let text = "Validity 2027 ... Expiry Date: 14/02/2026";
        let field = extractor().extract_expiry(text);
        assert_eq!(field.as_str(), Some("2026-02-14"));
        assert_eq!(field.source_keyword.as_deref(), Some("expiry date"));
    }

    #[test]
    fn test_closer_match_wins_among_equals() {
        let text = "Valid till:    01/01/2030\nUse by: 02/02/2029";
        let extraction = extractor().extract(text);
        assert_eq!(extraction.field.as_str(), Some("2029-02-02"));
        assert_eq!(
            extraction.warnings,
            vec![ExtractionWarning::AmbiguousDateCandidates {
                chosen: "2029-02-02".to_string(),
                others: vec!["2030-01-01".to_string()],
            }]
        );
    }

    #[test]
    fn test_stale_weak_match_dropped() {
        // Month-only, so medium confidence; more than a year old
        let field = extractor().extract_expiry("EXP 01/2022");
        assert_eq!(field.value, None);
    }

    #[test]
    fn test_stale_strong_match_kept() {
        let field = extractor().extract_expiry("Warranty Card Valid up to Date: 22-02-2022");
        assert_eq!(field.as_str(), Some("2022-02-22"));
        assert_eq!(field.source_keyword.as_deref(), Some("valid up to"));
    }

    #[test]
    fn test_fallback_prefers_upcoming_date() {
        let text = "Receipt 02/03/2024\nNext service 10/10/2024\nLater 11/11/2025";
        let field = extractor().extract_expiry(text);
        assert_eq!(field.as_str(), Some("2024-10-10"));
        assert_eq!(field.confidence_level, ConfidenceLevel::Low);
        assert_eq!(field.source_keyword, None);
    }

    #[test]
    fn test_fallback_uses_recent_past() {
        let field = extractor().extract_expiry("Printed 02/03/2024");
        assert_eq!(field.as_str(), Some("2024-03-02"));
        assert_eq!(field.confidence_score, 35);
    }

    #[test]
    fn test_far_future_noise_ignored() {
        let field = extractor().extract_expiry("EXP 01/01/2090");
        assert_eq!(field.value, None);
    }

    #[test]
    fn test_extreme_limits_do_not_overflow() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let config = ExpiryConfig {
            stale_after_days: 1_000_000_000,
            max_future_years: 400_000_000,
            ..ExpiryConfig::default()
        };
        let extractor = ExpiryFieldExtractor::new(config, today);

        assert_eq!(extractor.extract_expiry("EXP 01/2022").as_str(), Some("2022-01-31"));
        assert_eq!(extractor.extract_expiry("EXP 01/01/2090").as_str(), Some("2090-01-01"));
    }

    #[test]
    fn test_split_line_date() {
        let field = extractor().extract_expiry("USE BEFORE\n03/\n2027");
        assert_eq!(field.as_str(), Some("2027-03-31"));
    }

    #[test]
    fn test_no_dates() {
        let extraction = extractor().extract("no dates here at all");
        assert_eq!(extraction.field, FieldValue::missing());
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_has_expiry_keyword() {
        assert!(has_expiry_keyword("Subscription ends on 1 Jan 2026"));
        assert!(!has_expiry_keyword("Export quality, expert made"));
    }
}
