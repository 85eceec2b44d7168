//! Per-document-type heuristics.
//!
//! These catch layouts the generic keyword search reads poorly: insurance
//! and AMC period ranges, compact medicine packaging stamps, and warranties
//! or subscriptions that only state a duration from a start date.

use chrono::{Duration, Months, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::EXPIRY_FIELD;
use super::rules::dates::format_iso;
use super::rules::{
    DATE_TEXT, DateNormalizer, DatePrecision, ExpiryFieldExtractor, has_expiry_keyword,
};
use crate::models::config::ExpiryConfig;
use crate::models::document::{CandidateSource, Category, ExtractionCandidate, FieldValue};

lazy_static! {
    static ref PERIOD_FROM_TO: Regex = Regex::new(&format!(
        r"(?i)\bfrom\s*[:\-]?\s*(?P<start>{d})\s*(?:to|till|until|upto|up\s+to)\s*[:\-]?\s*(?P<end>{d})",
        d = DATE_TEXT
    )).unwrap();

    static ref PERIOD_LABELLED: Regex = Regex::new(&format!(
        r"(?i)\b(?:policy|insurance|contract|amc|coverage|cover)\s+period\s*[:\-]?\s*(?P<start>{d})\s*(?:to|till|until|-)\s*(?P<end>{d})",
        d = DATE_TEXT
    )).unwrap();

    static ref EXPIRY_STAMP: Regex = Regex::new(&format!(
        r"(?im)(?:\bexp\.?\s*dt\.?\s*[:.\-]?|(?:^|\s)e\s*:)\s*(?P<value>{})",
        DATE_TEXT
    )).unwrap();

    static ref MFG_STAMP: Regex = Regex::new(&format!(
        r"(?im)(?:\bmfg\.?\s*dt\.?\s*[:.\-]?|(?:^|\s)m\s*:)\s*(?P<value>{})",
        DATE_TEXT
    )).unwrap();

    static ref BATCH_STAMP: Regex = Regex::new(
        r"(?im)(?:^|\s)b\s*:\s*(?P<value>[A-Z0-9][A-Z0-9\-/]{2,19})\b"
    ).unwrap();

    static ref DURATION_PHRASE: Regex = Regex::new(
        r"(?i)\b(?P<n>\d{1,2})\s*(?P<unit>years?|yrs?|months?|mths?|days?)\s+(?:of\s+)?(?:limited\s+|standard\s+|extended\s+|comprehensive\s+)?(?:warranty|guarantee|subscription|membership|plan|pack)\b"
    ).unwrap();

    static ref DURATION_LABEL: Regex = Regex::new(
        r"(?i)\b(?:warranty|guarantee|valid\s+for|subscription\s+period|plan\s+duration|duration)\s*(?:period|of)?\s*[:\-]?\s*(?P<n>\d{1,2})\s*(?P<unit>years?|yrs?|months?|mths?|days?)\b"
    ).unwrap();

    static ref START_DATE: Regex = Regex::new(&format!(
        r"(?i)\b(?:date\s+of\s+purchase|purchase\s+date|purchased\s+on|invoice\s+date|bill\s+date|date\s+of\s+sale|sale\s+date|start\s+date|started\s+on|activation\s+date|activated\s+on|subscribed\s+on|subscription\s+date|member\s+since|order\s+date|billing\s+date)\s*[:\-]?\s*(?P<value>{})",
        DATE_TEXT
    )).unwrap();
}

/// A validity duration in calendar units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Validity {
    Months(u32),
    Days(u32),
}

impl Validity {
    fn parse(n: &str, unit: &str) -> Option<Self> {
        let n: u32 = n.parse().ok().filter(|n| *n > 0)?;
        let unit = unit.to_lowercase();
        if unit.starts_with('y') {
            Some(Self::Months(n * 12))
        } else if unit.starts_with('m') {
            Some(Self::Months(n))
        } else {
            Some(Self::Days(n))
        }
    }

    /// Last day covered when validity starts on `start`.
    fn last_day_from(&self, start: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Self::Months(m) => start.checked_add_months(Months::new(m))?.pred_opt(),
            Self::Days(d) => start.checked_add_signed(Duration::days(i64::from(d) - 1)),
        }
    }
}

/// The tier-1 candidate pass.
pub struct HeuristicPass {
    dates: DateNormalizer,
    expiry: ExpiryFieldExtractor,
}

impl HeuristicPass {
    pub fn new(config: ExpiryConfig, today: NaiveDate) -> Self {
        Self {
            dates: DateNormalizer::new(today),
            expiry: ExpiryFieldExtractor::new(config, today),
        }
    }

    pub fn candidate(&self, text: &str, category: Category) -> ExtractionCandidate {
        let mut candidate = ExtractionCandidate::new(CandidateSource::Heuristic, category);

        match category {
            Category::Insurance | Category::Amc => {
                if let Some(expiry) = self.period_end(text) {
                    candidate.insert(EXPIRY_FIELD, expiry);
                }
            }
            Category::Medicine => self.packaging_stamps(text, &mut candidate),
            Category::Warranty | Category::Subscription => {
                if let Some(expiry) = self.duration_end(text) {
                    candidate.insert(EXPIRY_FIELD, expiry);
                }
            }
            Category::Other => {}
        }

        debug!("Heuristics for {}: {} fields", category, candidate.fields.len());
        candidate
    }

    /// Score by precision; returns `None` for implausible dates.
    fn expiry_value(
        &self,
        date: NaiveDate,
        precision: DatePrecision,
        source: &str,
    ) -> Option<FieldValue> {
        let score = match precision {
            DatePrecision::Day => 92,
            DatePrecision::Month => 80,
            DatePrecision::Year => return None,
        };
        self.expiry
            .accepts(date, score)
            .then(|| FieldValue::new(format_iso(date), score).with_source(source))
    }

    /// End of an insurance or contract period range.
    fn period_end(&self, text: &str) -> Option<FieldValue> {
        PERIOD_LABELLED
            .captures_iter(text)
            .chain(PERIOD_FROM_TO.captures_iter(text))
            .find_map(|caps| {
                let end = self.dates.resolve(&caps["end"], None)?;
                let start = self.dates.resolve(&caps["start"], None);
                if start.is_some_and(|s| s.date >= end.date) {
                    return None;
                }
                self.expiry_value(end.date, end.precision(), "period")
            })
    }

    fn packaging_stamps(&self, text: &str, candidate: &mut ExtractionCandidate) {
        let expiry = EXPIRY_STAMP.captures_iter(text).find_map(|caps| {
            let resolved = self.dates.resolve(&caps["value"], None)?;
            self.expiry_value(resolved.date, resolved.precision(), "stamp")
        });
        if let Some(expiry) = expiry {
            candidate.insert(EXPIRY_FIELD, expiry);
        }

        let manufactured = MFG_STAMP
            .captures_iter(text)
            .find_map(|caps| self.dates.normalize(&caps["value"], None));
        if let Some(date) = manufactured {
            candidate.insert("manufacturingDate", FieldValue::new(date, 85));
        }

        let batch = BATCH_STAMP
            .captures_iter(text)
            .map(|caps| caps["value"].to_string())
            .find(|value| value.chars().any(|c| c.is_ascii_digit()));
        if let Some(batch) = batch {
            candidate.insert("batchNumber", FieldValue::new(batch, 88));
        }
    }

    /// Start date plus stated duration, when no expiry is printed.
    fn duration_end(&self, text: &str) -> Option<FieldValue> {
        if has_expiry_keyword(text) {
            return None;
        }

        let caps = DURATION_LABEL
            .captures(text)
            .or_else(|| DURATION_PHRASE.captures(text))?;
        let validity = Validity::parse(&caps["n"], &caps["unit"])?;

        let start = START_DATE.captures_iter(text).find_map(|caps| {
            self.dates
                .resolve(&caps["value"], None)
                .filter(|r| r.precision() == DatePrecision::Day)
        })?;

        let end = validity.last_day_from(start.date)?;
        debug!("Computed expiry from start date and {:?}", validity);

        // Computed, not printed: medium confidence at most
        let score = 80;
        self.expiry
            .accepts(end, score)
            .then(|| FieldValue::new(format_iso(end), score).with_source("duration"))
    }
}
