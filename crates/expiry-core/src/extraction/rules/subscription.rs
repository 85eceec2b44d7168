//! Subscription and membership fields.

use lazy_static::lazy_static;

use super::FieldRule;

/// Widely used consumer services, matched when no label is present.
const KNOWN_SERVICES: &str = r"netflix|amazon\s+prime|prime\s+video|spotify(?:\s+premium)?|youtube\s+premium|disney\+?\s*hotstar|hotstar|zee5|sonyliv|jiocinema|apple\s+(?:music|tv\+?|one)|icloud\+?|google\s+one|microsoft\s+365|office\s+365|adobe\s+creative\s+cloud|linkedin\s+premium|audible|kindle\s+unlimited|swiggy\s+one|zomato\s+gold";

lazy_static! {
    pub static ref RULES: Vec<FieldRule> = vec![
        FieldRule::text("serviceName")
            .pattern(r"(?im)\b(?:service|subscription|platform|app)(?:\s+name)?\s*[:\-]\s*(?P<value>[^\n]+)", 85)
            .pattern(&format!(r"(?i)\b(?P<value>{})", KNOWN_SERVICES), 80)
            .max_len(40),
        FieldRule::text("plan")
            .pattern(r"(?im)\b(?:plan(?:\s+name)?|membership|tier|package|pack)\s*[:\-]\s*(?P<value>[^\n]+)", 85)
            .max_len(40),
        FieldRule::text("planType")
            .pattern(r"(?im)\bbilling\s+(?:cycle|period|frequency)\s*[:\-]\s*(?P<value>[^\n]+)", 85)
            .pattern(r"(?i)\b(?P<value>monthly|quarterly|half[\s\-]yearly|annual|yearly|weekly)\s+(?:plan|subscription|billing|membership|pack)\b", 80)
            .max_len(20),
        FieldRule::code("subscriptionId")
            .pattern(r"(?i)\b(?:subscription|membership|account|order|customer)\s*(?:id|no|number|#)\.?\s*[:\-]?\s*(?P<value>[A-Z0-9][A-Z0-9\-]{3,29})\b", 85)
            .max_len(30),
    ];
}
