//! Warranty card and invoice-backed warranty fields.

use lazy_static::lazy_static;

use super::FieldRule;

/// A duration such as "2 years" or "18 months".
pub const DURATION: &str = r"\d{1,2}\s*(?:years?|yrs?|months?|mths?)";

lazy_static! {
    pub static ref RULES: Vec<FieldRule> = vec![
        FieldRule::text("productName")
            .pattern(r"(?im)\b(?:product\s+name|model\s+name|product|model|item(?:\s+description)?|description)\s*[:\-]\s*(?P<value>[^\n]+)", 80),
        FieldRule::text("brand")
            .pattern(r"(?im)\bbrand(?:\s+name)?\s*[:\-]\s*(?P<value>[^\n]+)", 85)
            .max_len(40),
        FieldRule::text("companyName")
            .pattern(r"(?im)\b(?:manufacturer|company|sold\s+by|seller|dealer)(?:\s+name)?\s*[:\-]\s*(?P<value>[^\n]+)", 75),
        FieldRule::text("warrantyPeriod")
            .pattern(&format!(r"(?i)\bwarranty\s*(?:period|duration|term)?\s*[:\-]?\s*(?P<value>{})\b", DURATION), 85)
            .pattern(&format!(r"(?i)\b(?P<value>{})\s+(?:of\s+)?(?:limited\s+|standard\s+|extended\s+|comprehensive\s+)?warranty\b", DURATION), 85)
            .max_len(20),
        FieldRule::code("serialNumber")
            .pattern(r"(?i)\b(?:serial\s*(?:no|number|#)|s/n|imei(?:\s*no)?)\.?\s*[:\-]?\s*(?P<value>[A-Z0-9][A-Z0-9\-]{4,24})\b", 90)
            .max_len(25),
    ];
}
