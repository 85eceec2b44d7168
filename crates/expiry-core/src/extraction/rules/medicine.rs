//! Medicine strip and bottle label fields.

use lazy_static::lazy_static;

use super::{FieldRule, DATE_TEXT};

/// Dosage strength following a drug name.
const STRENGTH: &str = r"\d+(?:\.\d+)?\s*(?:mg|mcg|g|ml|iu)";

lazy_static! {
    pub static ref RULES: Vec<FieldRule> = vec![
        FieldRule::text("medicineName")
            .pattern(r"(?im)\b(?:medicine|drug|product)(?:\s+name)?\s*[:\-]\s*(?P<value>[^\n]+)", 85)
            .pattern(&format!(r"(?i)\b(?P<value>[A-Z][A-Z\-]{{2,}}(?:[ \t]+[A-Z][A-Z\-]{{2,}})?[ \t]+{})\b", STRENGTH), 75)
            .max_len(50),
        FieldRule::text("brand")
            .pattern(r"(?im)\bbrand(?:\s+name)?\s*[:\-]\s*(?P<value>[^\n]+)", 85)
            .max_len(40),
        FieldRule::text("manufacturer")
            .pattern(r"(?im)\b(?:manufactured\s+by|mfd\.?\s+by|mfg\.?\s+by|marketed\s+by|mkt\.?\s+by|manufacturer)\s*[:\-]?\s*(?P<value>[^\n]+)", 80),
        FieldRule::code("batchNumber")
            .pattern(r"(?i)\b(?:batch|lot)\s*(?:no|number|#)?\.?\s*[:\-]?\s*(?P<value>[A-Z0-9][A-Z0-9\-/]{2,19})\b", 90)
            .pattern(r"(?i)\bb\.\s?no\.?\s*[:\-]?\s*(?P<value>[A-Z0-9][A-Z0-9\-/]{2,19})\b", 85)
            .max_len(20),
        FieldRule::date("manufacturingDate")
            .pattern(&format!(r"(?i)\b(?:mfg|mfd|manufactured|manufacturing|date\s+of\s+manufacture)\.?\s*(?:date|dt|on)?\.?\s*[:\-]?\s*(?P<value>{})", DATE_TEXT), 85),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::rules::{apply_rules, DateNormalizer};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn extract(
        text: &str,
    ) -> std::collections::BTreeMap<String, crate::models::document::FieldValue> {
        let dates = DateNormalizer::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        apply_rules(&RULES, text, &dates)
    }

    #[test]
    fn test_strip_fields() {
        let fields = extract("Paracetamol 500mg EXP: 31/12/2024 BATCH: ABC123");

        assert_eq!(fields["medicineName"].as_str(), Some("Paracetamol 500mg"));
        assert_eq!(fields["batchNumber"].as_str(), Some("ABC123"));
        assert!(!fields.contains_key("manufacturingDate"));
    }

    #[test]
    fn test_label_fields() {
        let text = "Brand: Crocin\nMfd. by: GSK Pharmaceuticals Ltd.\nB.No. X7781\nMFG. DATE: 05/2024";
        let fields = extract(text);

        assert_eq!(fields["brand"].as_str(), Some("Crocin"));
        assert_eq!(fields["manufacturer"].as_str(), Some("GSK Pharmaceuticals Ltd"));
        assert_eq!(fields["batchNumber"].as_str(), Some("X7781"));
        assert_eq!(fields["manufacturingDate"].as_str(), Some("2024-05-31"));
    }

    #[test]
    fn test_batch_keyword_is_not_a_name() {
        let fields = extract("BATCH NO: 24A11");
        assert_eq!(fields.get("medicineName"), None);
        assert_eq!(fields["batchNumber"].as_str(), Some("24A11"));
    }
}
