//! Rule-based field extractors for expiry-bearing documents.

pub mod amc;
pub mod dates;
pub mod expiry;
pub mod insurance;
pub mod medicine;
pub mod other;
pub mod patterns;
pub mod subscription;
pub mod warranty;

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

pub use dates::{
    normalize_date, scan_date_tokens, DateExtractor, DateHint, DateNormalizer, DatePrecision,
    DateShape, DateToken, ResolvedDate,
};
pub use expiry::{has_expiry_keyword, ExpiryExtraction, ExpiryFieldExtractor, KeywordStrength};
pub use patterns::*;

use crate::models::document::FieldValue;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0 - 100).
    pub confidence: u8,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: u8, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// Loose date text for labelled date fields; normalized after capture.
pub const DATE_TEXT: &str = r"(?:\d{1,2}\s?[/.\-]\s?\d{1,2}\s?[/.\-]\s?\d{2,4}|\d{4}[/.\-]\d{1,2}[/.\-]\d{1,2}|\d{1,2}\s?[/.\-]\s?\d{2,4}|\d{1,2}(?:st|nd|rd|th)?[\s\-]*[A-Za-z]{3,9}\.?[\s\-,']*\d{2,4}|[A-Za-z]{3,9}\.?[\s\-,']*\d{2,4})";

lazy_static! {
    // Words that end a free-text value: they start the next label on the same line
    static ref STOP_WORDS: Regex = Regex::new(
        r"(?i)\b(?:batch|b\.\s?no|lot\s+no|invoice|bill\s+no|exp|expiry|expires|mfg|mfd|valid|date|dated|mrp|price|qty|gstin|gst|serial|s/n|imei|phone|tel|mob(?:ile)?|e-?mail)\b"
    ).unwrap();
}

/// How a captured value is validated and shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Free text such as a product or provider name.
    Text,
    /// An identifier; must contain a digit.
    Code,
    /// A date token; normalized to ISO by the caller.
    Date,
    /// A fixed label emitted whenever a pattern matches.
    Label(&'static str),
}

/// One output field and the ordered patterns that can fill it.
///
/// Patterns are tried most-specific-first. Every pattern except those of
/// [`ValueKind::Label`] rules must have a `value` capture group.
#[derive(Debug)]
pub struct FieldRule {
    pub field: &'static str,
    pub kind: ValueKind,
    patterns: Vec<(Regex, u8)>,
    max_len: usize,
}

impl FieldRule {
    fn with_kind(field: &'static str, kind: ValueKind) -> Self {
        Self {
            field,
            kind,
            patterns: Vec::new(),
            max_len: 60,
        }
    }

    pub fn text(field: &'static str) -> Self {
        Self::with_kind(field, ValueKind::Text)
    }

    pub fn code(field: &'static str) -> Self {
        Self::with_kind(field, ValueKind::Code)
    }

    pub fn date(field: &'static str) -> Self {
        Self::with_kind(field, ValueKind::Date)
    }

    pub fn label(field: &'static str, label: &'static str) -> Self {
        Self::with_kind(field, ValueKind::Label(label))
    }

    /// Add a pattern with the confidence a match through it earns.
    pub fn pattern(mut self, pattern: &str, confidence: u8) -> Self {
        self.patterns.push((Regex::new(pattern).unwrap(), confidence));
        self
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Shape a raw capture, or reject it.
    fn accept(&self, raw: &str) -> Option<String> {
        if raw.contains(REDACTION_MARKER) {
            return None;
        }
        match self.kind {
            ValueKind::Text => {
                let value = clean_value(raw);
                let len = value.chars().count();
                let plausible = (2..=self.max_len).contains(&len)
                    && value.chars().any(|c| c.is_alphabetic());
                plausible.then_some(value)
            }
            ValueKind::Code => {
                let value = raw.trim().trim_end_matches(['.', ',', ':']).to_string();
                let plausible = value.len() <= self.max_len
                    && value.chars().any(|c| c.is_ascii_digit())
                    && !STOP_WORDS.is_match(&value);
                plausible.then_some(value)
            }
            ValueKind::Date => Some(raw.trim().to_string()),
            ValueKind::Label(label) => Some(label.to_string()),
        }
    }
}

impl FieldExtractor for FieldRule {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for (pattern, confidence) in &self.patterns {
            for caps in pattern.captures_iter(text) {
                let full_match = caps.get(0).unwrap();
                let raw = caps.name("value").map_or(full_match.as_str(), |m| m.as_str());

                if let Some(value) = self.accept(raw) {
                    results.push(
                        ExtractionMatch::new(value, *confidence, full_match.as_str())
                            .with_position(full_match.start(), full_match.end()),
                    );
                }
            }
        }

        results
    }
}

/// Run a rule table over text, keeping the first plausible match per field.
pub fn apply_rules(
    rules: &[FieldRule],
    text: &str,
    dates: &DateNormalizer,
) -> BTreeMap<String, FieldValue> {
    let mut fields = BTreeMap::new();

    for rule in rules {
        if fields.contains_key(rule.field) {
            continue;
        }

        let found = rule.extract_all(text).into_iter().find_map(|m| {
            let value = match rule.kind {
                ValueKind::Date => dates.normalize(&m.value, None)?,
                _ => m.value,
            };
            Some(FieldValue::new(value, m.confidence))
        });

        if let Some(value) = found {
            fields.insert(rule.field.to_string(), value);
        }
    }

    fields
}

/// Trim a free-text capture to the value itself.
///
/// Cuts at the first stop word, strips label punctuation and collapses
/// whitespace.
pub fn clean_value(raw: &str) -> String {
    let cut = STOP_WORDS.find(raw).map_or(raw, |m| &raw[..m.start()]);
    let collapsed = cut.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| {
            matches!(c, ':' | '-' | '|' | ',' | ';' | '.' | '(' | '/') || c.is_whitespace()
        })
        .to_string()
}
