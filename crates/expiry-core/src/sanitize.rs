//! PII redaction applied before any extraction.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use tracing::debug;

use crate::extraction::rules::patterns::{
    AADHAAR_NUMBER, EMAIL, NEXT_LABEL, PAN_NUMBER, PASSPORT_NUMBER, PERSONAL_LABEL_INLINE,
    PERSONAL_LABEL_LINE, PHONE, REDACTION_MARKER,
};

/// Upper bound on redaction rounds.
const MAX_ROUNDS: usize = 8;

/// Words that make a following `Name:`/`Address:` describe a product or a
/// business rather than a person.
const NON_PERSONAL_QUALIFIERS: &[&str] = &[
    "product",
    "model",
    "brand",
    "item",
    "equipment",
    "appliance",
    "machine",
    "unit",
    "manufacturer",
    "company",
    "seller",
    "dealer",
    "shop",
    "store",
    "vendor",
    "provider",
    "partner",
    "insurer",
    "hospital",
    "clinic",
    "service",
    "centre",
    "center",
    "office",
    "plan",
    "scheme",
    "subscription",
    "platform",
    "app",
    "medicine",
    "drug",
    "generic",
];

/// Kinds of personal data the sanitizer removes, in the order applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PiiKind {
    Pan,
    Aadhaar,
    Phone,
    Email,
    Passport,
    LabelledLine,
}

impl PiiKind {
    pub const ORDER: [PiiKind; 6] = [
        PiiKind::Pan,
        PiiKind::Aadhaar,
        PiiKind::Phone,
        PiiKind::Email,
        PiiKind::Passport,
        PiiKind::LabelledLine,
    ];

    fn pattern(&self) -> &'static Regex {
        match self {
            Self::Pan => &PAN_NUMBER,
            Self::Aadhaar => &AADHAAR_NUMBER,
            Self::Phone => &PHONE,
            Self::Email => &EMAIL,
            Self::Passport => &PASSPORT_NUMBER,
            Self::LabelledLine => &PERSONAL_LABEL_LINE,
        }
    }

    /// Redact every match of this kind, returning the new text and the count.
    fn redact(&self, text: &str) -> (String, usize) {
        let pattern = self.pattern();
        let mut count = pattern.find_iter(text).count();
        let mut redacted = if count > 0 {
            pattern.replace_all(text, REDACTION_MARKER).into_owned()
        } else {
            text.to_string()
        };

        if *self == Self::LabelledLine {
            let (inline, inline_count) = redact_inline_labels(&redacted);
            redacted = inline;
            count += inline_count;
        }

        (redacted, count)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pan => "pan",
            Self::Aadhaar => "aadhaar",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Passport => "passport",
            Self::LabelledLine => "labelled_line",
        }
    }
}

impl fmt::Display for PiiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Redacted text plus what was removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub text: String,
    pub redactions: BTreeMap<PiiKind, usize>,
}

impl SanitizeReport {
    pub fn total(&self) -> usize {
        self.redactions.values().sum()
    }
}

/// Strips personally identifiable substrings from OCR text.
///
/// Whitespace is collapsed before and after redaction, and redaction rounds
/// repeat until stable, so a second pass never finds anything new.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiiSanitizer;

impl PiiSanitizer {
    pub fn new() -> Self {
        Self
    }

    pub fn sanitize(&self, text: &str) -> String {
        self.sanitize_with_report(text).text
    }

    pub fn sanitize_with_report(&self, text: &str) -> SanitizeReport {
        let mut current = collapse_whitespace(text);
        let mut redactions = BTreeMap::new();

        // A redaction can open a word boundary an earlier kind needed
        // (`a@b.com1234 5678 9012`), so rounds repeat until nothing changes.
        for _ in 0..MAX_ROUNDS {
            let mut changed = false;
            for kind in PiiKind::ORDER {
                let (redacted, count) = kind.redact(&current);
                if count > 0 {
                    current = redacted;
                    *redactions.entry(kind).or_insert(0) += count;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let report = SanitizeReport {
            text: collapse_whitespace(&current),
            redactions,
        };
        debug!("Sanitized {} chars: {} redactions", text.len(), report.total());
        report
    }
}

/// Redact PII with the default sanitizer.
pub fn sanitize(text: &str) -> String {
    PiiSanitizer::new().sanitize(text)
}

/// Redact personal labels that sit mid-line, as in OCR text flattened to a
/// single line. The value runs to the next `Label:` or the end of the line.
/// A bare label preceded by a product or business word is left alone.
fn redact_inline_labels(text: &str) -> (String, usize) {
    let mut spans: Vec<(usize, usize)> = Vec::new();

    for caps in PERSONAL_LABEL_INLINE.captures_iter(text) {
        let (Some(label), Some(whole)) = (caps.name("label"), caps.get(0)) else {
            continue;
        };
        let qualified = caps.name("owner").is_none()
            && caps.name("lead").is_some_and(|lead| is_qualifier(lead.as_str()));
        if qualified {
            continue;
        }

        let rest = &text[whole.end()..];
        let line_len = rest.find('\n').unwrap_or(rest.len());
        let value_len = value_end(&rest[..line_len]);

        let (start, end) = (label.start(), whole.end() + value_len);
        match spans.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => spans.push((start, end)),
        }
    }

    if spans.is_empty() {
        return (text.to_string(), 0);
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for &(start, end) in &spans {
        out.push_str(&text[cursor..start]);
        out.push_str(REDACTION_MARKER);
        // Keep a separator before whatever label follows
        if end < text.len() && !text[end..].starts_with(char::is_whitespace) {
            out.push(' ');
        }
        cursor = end;
    }
    out.push_str(&text[cursor..]);

    (out, spans.len())
}

/// Length of a label's value: up to the next `Label:` on the line, or the
/// `Product Name:` style label it starts with.
fn value_end(line: &str) -> usize {
    let Some(next) = NEXT_LABEL.find(line) else {
        return line.len();
    };
    let before = line[..next.start()].trim_end();
    match before.rsplit(char::is_whitespace).next() {
        Some(word) if is_qualifier(word) => before.len() - word.len(),
        _ => next.start(),
    }
}

fn is_qualifier(word: &str) -> bool {
    NON_PERSONAL_QUALIFIERS.contains(&word.to_lowercase().as_str())
}

/// Collapse runs of whitespace within each line and drop blank lines.
/// Line breaks are kept: label redaction and date search rely on them.
fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_aadhaar_and_name_removed() {
        let text = "Name: John Doe\nAadhaar 1234 5678 9012\nValid till 12/2026";
        let sanitized = sanitize(text);

        assert!(!sanitized.contains("1234 5678 9012"));
        assert!(!sanitized.contains("John Doe"));
        assert!(sanitized.contains("Valid till 12/2026"));
    }

    #[test]
    fn test_each_kind_redacted() {
        let text = "PAN ABCDE1234F call +91 9876543210 mail a.b@example.com passport J8369854";
        let report = PiiSanitizer::new().sanitize_with_report(text);

        assert_eq!(
            report.text,
            "PAN [REDACTED] call [REDACTED] mail [REDACTED] passport [REDACTED]"
        );
        assert_eq!(report.total(), 4);
        assert_eq!(report.redactions.get(&PiiKind::Phone), Some(&1));
    }

    #[test]
    fn test_labelled_lines_redacted_whole() {
        let text = "WARRANTY CARD\nAddress: 12 MG Road, Pune\nD.O.B.: 01/01/1990\nProduct Name: Mixer";
        let sanitized = sanitize(text);
        assert_eq!(sanitized, "WARRANTY CARD\n[REDACTED]\n[REDACTED]\nProduct Name: Mixer");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(sanitize("  EXP   12/2026 \n\n\n  BATCH  A1 "), "EXP 12/2026\nBATCH A1");
    }

    #[test]
    fn test_clean_text_unchanged() {
        let text = "Paracetamol 500mg EXP: 31/12/2024 BATCH: ABC123";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "   ",
            "Name: John Doe\n1234  5678 9012",
            "ABCDE1234F@gmail.com",
            "Phone 98765  43210 and 9876543210",
            "1234 5678 9012 3456 card",
            "Blood Group: O+\nPolicy No: P/1/2",
            "a@b.com1234 5678 9012",
            "x@y.in9876543210 and ABCDE1234F",
            "Aadhaar 1234 5678 9012 Name: John Doe Brand: Sony",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_redaction_exposing_boundary() {
        let report = PiiSanitizer::new().sanitize_with_report("a@b.com1234 5678 9012");

        assert_eq!(report.text, "[REDACTED][REDACTED]");
        assert_eq!(report.redactions.get(&PiiKind::Email), Some(&1));
        assert_eq!(report.redactions.get(&PiiKind::Aadhaar), Some(&1));
    }

    #[test]
    fn test_flattened_card_labels() {
        let sanitized = sanitize("Aadhaar 1234 5678 9012 Name: John Doe");
        assert_eq!(sanitized, "Aadhaar [REDACTED] [REDACTED]");

        let text = "WARRANTY CARD Customer Name: John Doe Brand: Sony DOB: 01/01/1990";
        let sanitized = sanitize(text);
        assert!(!sanitized.contains("John Doe"));
        assert!(!sanitized.contains("1990"));
        assert!(sanitized.contains("Brand: Sony"));
    }

    #[test]
    fn test_product_labels_kept_inline() {
        let text = "Warranty Card Product Name: Mixer Dealer Address: MG Road";
        assert_eq!(sanitize(text), text);

        let sanitized = sanitize("Policy Holder Name: Jane Roe Plan Name: Gold");
        assert_eq!(sanitized, "Policy [REDACTED] Plan Name: Gold");
    }

    #[test]
    fn test_empty_input() {
        let report = PiiSanitizer::new().sanitize_with_report("");
        assert_eq!(report, SanitizeReport::default());
    }
}
