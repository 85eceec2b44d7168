//! Insurance policy fields.

use lazy_static::lazy_static;

use super::FieldRule;

lazy_static! {
    pub static ref RULES: Vec<FieldRule> = vec![
        FieldRule::text("policyType")
            .pattern(r"(?im)\b(?:policy\s+type|type\s+of\s+policy|plan\s+name|product\s+name|cover\s+type)\s*[:\-]\s*(?P<value>[^\n]+)", 85)
            .pattern(r"(?i)\b(?P<value>(?:health|motor|car|private\s+car|two[\s\-]wheeler|bike|term|life|travel|home|fire)\s+insurance(?:\s+policy)?)\b", 70),
        FieldRule::text("provider")
            .pattern(r"(?im)\b(?:insurer|insurance\s+company|insurance\s+provider|provider|issued\s+by)(?:\s+name)?\s*[:\-]\s*(?P<value>[^\n]+)", 85)
            .pattern(r"\b(?P<value>(?:[A-Z][A-Za-z&.]*[ \t]+){1,4}(?:General[ \t]+|Life[ \t]+|Health[ \t]+)?(?:Insurance|INSURANCE)(?:[ \t]+Co(?:mpany)?\.?)?(?:[ \t]+(?:Ltd|LTD|Limited|LIMITED)\.?)?)", 70),
        FieldRule::code("policyNumber")
            .pattern(r"(?i)\bpolicy\s*(?:no|number|#)\.?\s*[:\-]?\s*(?P<value>[A-Z0-9][A-Z0-9/\-]{5,29})\b", 90)
            .max_len(30),
    ];
}
