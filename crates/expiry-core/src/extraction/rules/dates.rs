//! Date normalization and date-token scanning.
//!
//! Every recognized token is canonicalized to a calendar date. Invalid
//! day/month combinations are rejected rather than guessed at.

use chrono::{Datelike, NaiveDate};
use regex::{Captures, Regex};
use tracing::trace;

use super::patterns::{
    month_from_name, DATE_DAY_MONTH_NAME, DATE_DMY, DATE_DMY_SHORT, DATE_MONTH_NAME_YEAR,
    DATE_MY, DATE_MY_SHORT, DATE_YEAR, DATE_YMD,
};
use super::{ExtractionMatch, FieldExtractor};
use crate::error::ExtractionError;

/// Two-digit years resolving further back than this roll into the next century.
const TWO_DIGIT_YEAR_PAST_LIMIT: i32 = 10;

/// Token shapes, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateShape {
    /// `DD/MM/YYYY`, `DD-MM-YYYY`, `DD.MM.YYYY`
    DayMonthYear,
    /// `DD/MM/YY`
    DayMonthShortYear,
    /// `YYYY-MM-DD`
    YearMonthDay,
    /// `DD MMM YYYY`
    DayMonthNameYear,
    /// `MMM YYYY`, `MMM'YY`
    MonthNameYear,
    /// `MM/YYYY`
    MonthYear,
    /// `MM/YY`
    MonthShortYear,
    /// `YYYY`
    Year,
}

impl DateShape {
    pub const PRIORITY: [DateShape; 8] = [
        DateShape::DayMonthYear,
        DateShape::DayMonthShortYear,
        DateShape::YearMonthDay,
        DateShape::DayMonthNameYear,
        DateShape::MonthNameYear,
        DateShape::MonthYear,
        DateShape::MonthShortYear,
        DateShape::Year,
    ];

    fn pattern(&self) -> &'static Regex {
        match self {
            Self::DayMonthYear => &DATE_DMY,
            Self::DayMonthShortYear => &DATE_DMY_SHORT,
            Self::YearMonthDay => &DATE_YMD,
            Self::DayMonthNameYear => &DATE_DAY_MONTH_NAME,
            Self::MonthNameYear => &DATE_MONTH_NAME_YEAR,
            Self::MonthYear => &DATE_MY,
            Self::MonthShortYear => &DATE_MY_SHORT,
            Self::Year => &DATE_YEAR,
        }
    }

    /// The hint family this shape belongs to.
    pub fn hint(&self) -> DateHint {
        match self {
            Self::DayMonthYear | Self::DayMonthShortYear | Self::DayMonthNameYear => {
                DateHint::DayMonthYear
            }
            Self::YearMonthDay => DateHint::YearMonthDay,
            Self::MonthNameYear | Self::MonthYear | Self::MonthShortYear => DateHint::MonthYear,
            Self::Year => DateHint::Year,
        }
    }

    pub fn precision(&self) -> DatePrecision {
        match self.hint() {
            DateHint::DayMonthYear | DateHint::YearMonthDay => DatePrecision::Day,
            DateHint::MonthYear => DatePrecision::Month,
            DateHint::Year => DatePrecision::Year,
        }
    }
}

/// Restricts normalization to one family of shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateHint {
    DayMonthYear,
    YearMonthDay,
    MonthYear,
    Year,
}

/// How much of the date the token actually stated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// A calendar date resolved from a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub shape: DateShape,
}

impl ResolvedDate {
    pub fn precision(&self) -> DatePrecision {
        self.shape.precision()
    }

    /// ISO `YYYY-MM-DD`.
    pub fn iso(&self) -> String {
        format_iso(self.date)
    }
}

/// Format a date as ISO `YYYY-MM-DD`.
pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Canonicalizes date tokens relative to a fixed "today".
#[derive(Debug, Clone, Copy)]
pub struct DateNormalizer {
    today: NaiveDate,
}

impl DateNormalizer {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Normalize a single token to ISO `YYYY-MM-DD`, or `None`.
    pub fn normalize(&self, token: &str, hint: Option<DateHint>) -> Option<String> {
        self.resolve(token, hint).map(|r| r.iso())
    }

    /// Resolve a single token. The whole token must be one date.
    ///
    /// The first shape that matches the token decides; if its values fail
    /// calendar validation the token is rejected outright.
    pub fn resolve(&self, token: &str, hint: Option<DateHint>) -> Option<ResolvedDate> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        for shape in DateShape::PRIORITY {
            if hint.is_some_and(|h| h != shape.hint()) {
                continue;
            }
            let Some(caps) = shape.pattern().captures(token) else {
                continue;
            };
            let whole = caps.get(0)?;
            if whole.start() != 0 || whole.end() != token.len() {
                continue;
            }
            return self.resolve_captures(shape, &caps);
        }

        None
    }

    fn resolve_captures(&self, shape: DateShape, caps: &Captures<'_>) -> Option<ResolvedDate> {
        let token = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        match self.build(shape, caps, token) {
            Ok(date) => Some(ResolvedDate { date, shape }),
            Err(e) => {
                trace!("{}", e);
                None
            }
        }
    }

    fn build(
        &self,
        shape: DateShape,
        caps: &Captures<'_>,
        token: &str,
    ) -> Result<NaiveDate, ExtractionError> {
        let num = |i: usize| -> u32 {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };

        match shape {
            DateShape::DayMonthYear => calendar_date(num(3) as i32, num(2), num(1), token),
            DateShape::DayMonthShortYear => {
                let year = self.expand_year(num(3) as i32);
                calendar_date(year, num(2), num(1), token)
            }
            DateShape::YearMonthDay => calendar_date(num(1) as i32, num(2), num(3), token),
            DateShape::DayMonthNameYear => {
                let month = caps
                    .get(2)
                    .and_then(|m| month_from_name(m.as_str()))
                    .unwrap_or(0);
                calendar_date(num(3) as i32, month, num(1), token)
            }
            DateShape::MonthNameYear => {
                let month = caps
                    .get(1)
                    .and_then(|m| month_from_name(m.as_str()))
                    .unwrap_or(0);
                let year = if caps.get(2).is_some() {
                    num(2) as i32
                } else {
                    self.expand_year(num(3) as i32)
                };
                end_of_month(year, month, token)
            }
            DateShape::MonthYear => end_of_month(num(2) as i32, sentinel_month(num(1)), token),
            DateShape::MonthShortYear => {
                let year = self.expand_year(num(2) as i32);
                end_of_month(year, sentinel_month(num(1)), token)
            }
            DateShape::Year => calendar_date(num(1) as i32, 12, 31, token),
        }
    }

    /// Expand a two-digit year into the current century, rolling forward a
    /// century when the result would lie too far in the past.
    pub fn expand_year(&self, yy: i32) -> i32 {
        let current = self.today.year();
        let year = current / 100 * 100 + yy;
        if current - year > TWO_DIGIT_YEAR_PAST_LIMIT {
            year + 100
        } else {
            year
        }
    }

    /// Every date token in `text`, in text order.
    ///
    /// Shapes are tried in priority order and a span claimed by one shape is
    /// never re-read by a lower-priority one, even when the claimed token is
    /// invalid. `31/02/2024` is dropped whole instead of degrading to
    /// `02/2024`.
    pub fn scan(&self, text: &str) -> Vec<DateToken> {
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut tokens = Vec::new();

        for shape in DateShape::PRIORITY {
            for caps in shape.pattern().captures_iter(text) {
                let Some(m) = caps.get(0) else { continue };
                let (start, end) = (m.start(), m.end());
                if claimed.iter().any(|&(s, e)| start < e && s < end) {
                    continue;
                }
                claimed.push((start, end));

                if let Some(resolved) = self.resolve_captures(shape, &caps) {
                    tokens.push(DateToken {
                        start,
                        end,
                        text: m.as_str().to_string(),
                        resolved,
                    });
                }
            }
        }

        tokens.sort_by_key(|t| t.start);
        tokens
    }
}

/// A resolved date token found in a larger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateToken {
    /// Byte offset of the token start.
    pub start: usize,
    /// Byte offset one past the token end.
    pub end: usize,
    /// Token text as it appeared.
    pub text: String,
    pub resolved: ResolvedDate,
}

impl DateToken {
    pub fn date(&self) -> NaiveDate {
        self.resolved.date
    }
}

/// Convenience wrapper around [`DateNormalizer::normalize`].
pub fn normalize_date(token: &str, hint: Option<DateHint>, today: NaiveDate) -> Option<String> {
    DateNormalizer::new(today).normalize(token, hint)
}

/// Convenience wrapper around [`DateNormalizer::scan`].
pub fn scan_date_tokens(text: &str, today: NaiveDate) -> Vec<DateToken> {
    DateNormalizer::new(today).scan(text)
}

/// Month `00` is December on some packaging.
fn sentinel_month(month: u32) -> u32 {
    if month == 0 { 12 } else { month }
}

/// Number of days in a month, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|d| d.day())
}

fn calendar_date(
    year: i32,
    month: u32,
    day: u32,
    token: &str,
) -> Result<NaiveDate, ExtractionError> {
    if !(1..=12).contains(&month) {
        return Err(ExtractionError::invalid_date(
            token,
            format!("month {} out of range", month),
        ));
    }
    let max_day = days_in_month(year, month)
        .ok_or_else(|| {
            ExtractionError::invalid_date(token, format!("year {} out of range", year))
        })?;
    if day == 0 || day > max_day {
        return Err(ExtractionError::invalid_date(
            token,
            format!("day {} exceeds {} days in month", day, max_day),
        ));
    }
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ExtractionError::invalid_date(token, "not a calendar date"))
}

fn end_of_month(year: i32, month: u32, token: &str) -> Result<NaiveDate, ExtractionError> {
    if !(1..=12).contains(&month) {
        return Err(ExtractionError::invalid_date(
            token,
            format!("month {} out of range", month),
        ));
    }
    let last = days_in_month(year, month)
        .ok_or_else(|| {
            ExtractionError::invalid_date(token, format!("year {} out of range", year))
        })?;
    calendar_date(year, month, last, token)
}

/// Date-token extractor over free text.
pub struct DateExtractor {
    normalizer: DateNormalizer,
}

impl DateExtractor {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            normalizer: DateNormalizer::new(today),
        }
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<ResolvedDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.normalizer
            .scan(text)
            .into_iter()
            .map(|token| {
                let score = match token.resolved.precision() {
                    DatePrecision::Day => 90,
                    DatePrecision::Month => 75,
                    DatePrecision::Year => 60,
                };
                ExtractionMatch::new(token.resolved, score, token.text)
                    .with_position(token.start, token.end)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn norm(token: &str) -> Option<String> {
        normalize_date(token, None, today())
    }

    #[test]
    fn test_day_month_year_separators() {
        assert_eq!(norm("31/12/2024"), Some("2024-12-31".to_string()));
        assert_eq!(norm("31-12-2024"), Some("2024-12-31".to_string()));
        assert_eq!(norm("31.12.2024"), Some("2024-12-31".to_string()));
        assert_eq!(norm("1/2/2025"), Some("2025-02-01".to_string()));
    }

    #[test]
    fn test_two_digit_year_century() {
        assert_eq!(norm("27-08-38"), Some("2038-08-27".to_string()));
        assert_eq!(norm("15.01.24"), Some("2024-01-15".to_string()));
        // 2013 would be eleven years back, so it rolls forward
        assert_eq!(norm("01/01/13"), Some("2113-01-01".to_string()));
        assert_eq!(norm("01/01/14"), Some("2014-01-01".to_string()));
    }

    #[test]
    fn test_year_month_day() {
        assert_eq!(norm("2026-03-09"), Some("2026-03-09".to_string()));
        assert_eq!(norm("2026/3/9"), Some("2026-03-09".to_string()));
    }

    #[test]
    fn test_month_names() {
        assert_eq!(norm("15 Mar 2027"), Some("2027-03-15".to_string()));
        assert_eq!(norm("1st January 2026"), Some("2026-01-01".to_string()));
        assert_eq!(norm("09-SEP-2025"), Some("2025-09-09".to_string()));
        assert_eq!(norm("AUG 2026"), Some("2026-08-31".to_string()));
        assert_eq!(norm("february 2028"), Some("2028-02-29".to_string()));
        assert_eq!(norm("Jan'27"), Some("2027-01-31".to_string()));
    }

    #[test]
    fn test_month_only_uses_last_day() {
        assert_eq!(norm("08/26"), Some("2026-08-31".to_string()));
        assert_eq!(norm("02/2025"), Some("2025-02-28".to_string()));
        assert_eq!(norm("02/2024"), Some("2024-02-29".to_string()));
        assert_eq!(norm("11/2030"), Some("2030-11-30".to_string()));
    }

    #[test]
    fn test_sentinel_month() {
        assert_eq!(norm("00/2028"), Some("2028-12-31".to_string()));
        assert_eq!(norm("00/28"), Some("2028-12-31".to_string()));
    }

    #[test]
    fn test_year_only() {
        assert_eq!(norm("2030"), Some("2030-12-31".to_string()));
    }

    #[test]
    fn test_invalid_dates_rejected() {
        assert_eq!(norm("31/02/2024"), None);
        assert_eq!(norm("30/02/2024"), None);
        assert_eq!(norm("29/02/2023"), None);
        assert_eq!(norm("00/05/2024"), None);
        assert_eq!(norm("12/13/2024"), None);
        assert_eq!(norm("13/2026"), None);
        assert_eq!(norm("not a date"), None);
        assert_eq!(norm(""), None);
    }

    #[test]
    fn test_leap_day_accepted() {
        assert_eq!(norm("29/02/2024"), Some("2024-02-29".to_string()));
    }

    #[test]
    fn test_output_is_iso() {
        let tokens = [
            "31/12/2024", "27-08-38", "2024-12-31", "15 Mar 2027", "Mar 2027",
            "08/2026", "08/26", "2030", "31/02/2024", "00/2028",
        ];
        for token in tokens {
            if let Some(iso) = norm(token) {
                assert_eq!(iso.len(), 10, "{token} -> {iso}");
                assert!(NaiveDate::parse_from_str(&iso, "%Y-%m-%d").is_ok(), "{token} -> {iso}");
            }
        }
    }

    #[test]
    fn test_hint_restricts_shapes() {
        let normalizer = DateNormalizer::new(today());
        assert_eq!(
            normalizer.normalize("08/26", Some(DateHint::MonthYear)),
            Some("2026-08-31".to_string())
        );
        assert_eq!(normalizer.normalize("08/26", Some(DateHint::DayMonthYear)), None);
        assert_eq!(normalizer.normalize("2030", Some(DateHint::MonthYear)), None);
    }

    #[test]
    fn test_scan_finds_tokens_in_order() {
        let normalizer = DateNormalizer::new(today());
        let tokens = normalizer.scan("MFG 01/2024 EXP 12/2026 printed 2024-01-05");

        let dates: Vec<String> = tokens.iter().map(|t| t.resolved.iso()).collect();
        assert_eq!(dates, vec!["2024-01-31", "2026-12-31", "2024-01-05"]);
        assert_eq!(tokens[1].text, "12/2026");
    }

    #[test]
    fn test_scan_invalid_token_not_degraded() {
        let normalizer = DateNormalizer::new(today());
        assert!(normalizer.scan("Valid till 31/02/2024").is_empty());
    }

    #[test]
    fn test_scan_split_line() {
        let normalizer = DateNormalizer::new(today());
        let tokens = normalizer.scan("EXP 12/\n2026");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].resolved.iso(), "2026-12-31");
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2100, 2), Some(28));
        assert_eq!(days_in_month(2024, 12), Some(31));
        assert_eq!(days_in_month(2024, 4), Some(30));
    }

    #[test]
    fn test_date_extractor_scores_by_precision() {
        let extractor = DateExtractor::new(today());
        let matches = extractor.extract_all("22-02-2026 and 03/2027");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].confidence, 90);
        assert_eq!(matches[1].confidence, 75);
        assert_eq!(matches[1].position, Some((15, 22)));
    }
}
