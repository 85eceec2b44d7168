//! Uncategorised documents: licenses, government IDs and the like.
//!
//! Only the document type is ever extracted here. Names, numbers and
//! addresses on these documents stay in the text.

use lazy_static::lazy_static;

use super::FieldRule;

lazy_static! {
    pub static ref RULES: Vec<FieldRule> = vec![
        FieldRule::label("documentType", "Driving License")
            .pattern(r"(?i)\bdriving\s+licen[cs]e\b|\bdl\s+no\b", 90),
        FieldRule::label("documentType", "Passport")
            .pattern(r"(?i)\bpassport\b", 85),
        FieldRule::label("documentType", "Vehicle Registration")
            .pattern(r"(?i)\b(?:certificate\s+of\s+registration|registration\s+certificate|vehicle\s+registration)\b", 85),
        FieldRule::label("documentType", "Pollution Certificate")
            .pattern(r"(?i)\b(?:pollution\s+under\s+control|puc\s+certificate)\b", 85),
        FieldRule::label("documentType", "PAN Card")
            .pattern(r"(?i)\b(?:permanent\s+account\s+number|income\s+tax\s+department)\b", 80),
        FieldRule::label("documentType", "Voter ID")
            .pattern(r"(?i)\b(?:election\s+commission|voter\s+id|elector)\b", 80),
        FieldRule::label("documentType", "Aadhaar Card")
            .pattern(r"(?i)\b(?:aadhaar|unique\s+identification\s+authority)\b", 80),
        FieldRule::label("documentType", "Membership Card")
            .pattern(r"(?i)\bmembership\s+card\b", 70),
        FieldRule::label("documentType", "Certificate")
            .pattern(r"(?i)\bcertificate\b", 60),
    ];
}
