//! Annual maintenance contract fields.

use lazy_static::lazy_static;

use super::FieldRule;

lazy_static! {
    pub static ref RULES: Vec<FieldRule> = vec![
        FieldRule::text("serviceProvider")
            .pattern(r"(?im)\b(?:service\s+provider|service\s+partner|provider|vendor|service\s+centre|service\s+center)(?:\s+name)?\s*[:\-]\s*(?P<value>[^\n]+)", 85),
        FieldRule::text("productName")
            .pattern(r"(?im)\b(?:product|equipment|appliance|machine|model|unit)(?:\s+name)?\s*[:\-]\s*(?P<value>[^\n]+)", 80),
        FieldRule::code("contractNumber")
            .pattern(r"(?i)\b(?:contract|amc|agreement)\s*(?:no|number|#|id)\.?\s*[:\-]?\s*(?P<value>[A-Z0-9][A-Z0-9/\-]{3,29})\b", 90)
            .max_len(30),
        FieldRule::text("serviceType")
            .pattern(r"(?im)\b(?:service\s+type|contract\s+type|type\s+of\s+service|amc\s+type)\s*[:\-]\s*(?P<value>[^\n]+)", 85)
            .pattern(r"(?i)\b(?P<value>comprehensive|non[\s\-]comprehensive|labou?r\s+only|preventive\s+maintenance|breakdown\s+maintenance)\b", 65)
            .max_len(40),
    ];
}
