//! Common regex patterns for expiry-document extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// English month names and abbreviations, without a capture group.
pub const MONTH_NAMES: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

/// Date separator: one of `/ . -`, optionally padded by a single whitespace
/// character (which may be a line break from a split OCR line).
const SEP: &str = r"\s?[/.\-]\s?";

/// Replacement written over every redacted span.
pub const REDACTION_MARKER: &str = "[REDACTED]";

lazy_static! {
    // Date shapes, in normalizer priority order
    pub static ref DATE_DMY: Regex = Regex::new(&format!(
        r"\b(\d{{1,2}}){SEP}(\d{{1,2}}){SEP}(\d{{4}})\b"
    )).unwrap();

    pub static ref DATE_DMY_SHORT: Regex = Regex::new(&format!(
        r"\b(\d{{1,2}}){SEP}(\d{{1,2}}){SEP}(\d{{2}})\b"
    )).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[/.\-](\d{1,2})[/.\-](\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?[\s\-/.,]*({MONTH_NAMES})\.?[\s\-/.,']*(\d{{4}})\b"
    )).unwrap();

    pub static ref DATE_MONTH_NAME_YEAR: Regex = Regex::new(&format!(
        r"(?i)\b({MONTH_NAMES})\.?[\s\-/.,]*(?:(\d{{4}})|'\s?(\d{{2}}))\b"
    )).unwrap();

    pub static ref DATE_MY: Regex = Regex::new(&format!(
        r"\b(\d{{1,2}}){SEP}(\d{{4}})\b"
    )).unwrap();

    // No '.' separator: "5.00" is a price far more often than a date
    pub static ref DATE_MY_SHORT: Regex = Regex::new(
        r"\b(\d{1,2})\s?[/\-]\s?(\d{2})\b"
    ).unwrap();

    pub static ref DATE_YEAR: Regex = Regex::new(
        r"\b((?:19|20)\d{2})\b"
    ).unwrap();

    // PII patterns, applied in this order
    pub static ref PAN_NUMBER: Regex = Regex::new(
        r"\b[A-Z]{5}\d{4}[A-Z]\b"
    ).unwrap();

    pub static ref AADHAAR_NUMBER: Regex = Regex::new(
        r"\b\d{4}[ \-]?\d{4}[ \-]?\d{4}\b"
    ).unwrap();

    pub static ref PHONE: Regex = Regex::new(
        r"(?:\+91[ \-]?)?\b\d{10}\b"
    ).unwrap();

    pub static ref EMAIL: Regex = Regex::new(
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"
    ).unwrap();

    pub static ref PASSPORT_NUMBER: Regex = Regex::new(
        r"\b[A-Z]\d{7}\b"
    ).unwrap();

    // Whole lines introduced by a personal-data label
    pub static ref PERSONAL_LABEL_LINE: Regex = Regex::new(
        r"(?im)^[ \t|*:\-]*(?:(?:(?:customer|card\s*holder|holder|owner|patient|member|insured)'?s?|father'?s|mother'?s|spouse)\s+)?(?:name|d\.?o\.?b\.?|date\s+of\s+birth|address|licen[cs]e\s+no\.?|d\.?\s?l\.?\s+no\.?|passport\s+no\.?|blood\s+group)\b[^\n]*"
    ).unwrap();

    // A personal-data label inside a flattened line, with the word before it
    pub static ref PERSONAL_LABEL_INLINE: Regex = Regex::new(
        r"(?i)(?:\b(?P<lead>[a-z]+)[ \t]+)?\b(?P<label>(?P<owner>(?:(?:customer|card\s*holder|holder|owner|patient|member|insured)'?s?|father'?s|mother'?s|spouse)\s+)?(?:name|d\.?o\.?b\.?|date\s+of\s+birth|address|licen[cs]e\s+no\.?|d\.?\s?l\.?\s+no\.?|passport\s+no\.?|blood\s+group))[ \t]*:"
    ).unwrap();

    // Start of the next `Label:` on the same line
    pub static ref NEXT_LABEL: Regex = Regex::new(
        r"\b[A-Za-z][A-Za-z.']*[ \t]*:"
    ).unwrap();

    // Values that must never leave the engine
    pub static ref GSTIN: Regex = Regex::new(
        r"(?i)\b\d{2}[A-Z]{5}\d{4}[A-Z][1-9A-Z]Z[0-9A-Z]\b"
    ).unwrap();

    pub static ref CARD_NUMBER: Regex = Regex::new(
        r"\b(?:\d[ \-]?){12,18}\d\b"
    ).unwrap();

    pub static ref UPI_ID: Regex = Regex::new(
        r"(?i)\b[a-z0-9.\-_]{2,}@[a-z]{2,}\b"
    ).unwrap();

    pub static ref IFSC_CODE: Regex = Regex::new(
        r"(?i)\b[A-Z]{4}0[A-Z0-9]{6}\b"
    ).unwrap();

    pub static ref LONG_DIGIT_RUN: Regex = Regex::new(
        r"\d{6,}"
    ).unwrap();
}

/// Month number (1-12) for an English month name or abbreviation.
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.trim().trim_end_matches('.').to_lowercase();
    let prefix = lower.get(..3)?;
    let month = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
