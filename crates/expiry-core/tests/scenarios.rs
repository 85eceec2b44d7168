//! End-to-end extraction scenarios.

use chrono::NaiveDate;
use expiry_core::{
    normalize_date, sanitize, CandidateSource, Category, ConfidenceLevel, EngineConfig,
    ExpiryFieldExtractor, ExtractionCandidate, ExtractionEngine, ExtractionInput, FieldValue,
    StaticEnrichment,
};
use pretty_assertions::assert_eq;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn engine() -> ExtractionEngine {
    let config = EngineConfig {
        reference_date: Some(today()),
        ..EngineConfig::default()
    };
    ExtractionEngine::new(config)
}

fn extract(text: &str) -> expiry_core::ExtractionResult {
    engine().extract(&ExtractionInput::new(text))
}

#[test]
fn test_medicine_strip() {
    let result = extract("Paracetamol 500mg EXP: 31/12/2024 BATCH: ABC123");

    assert_eq!(result.category, Category::Medicine);
    assert_eq!(result.expiry(), Some("2024-12-31"));
    assert_eq!(result.expiry_date.confidence_level, ConfidenceLevel::High);
    assert_eq!(result.field("batchNumber").and_then(|f| f.as_str()), Some("ABC123"));
}

#[test]
fn test_stale_warranty_card() {
    let result = extract("Warranty Card Valid up to Date: 22-02-2022");

    assert_eq!(result.category, Category::Warranty);
    assert_eq!(result.expiry(), Some("2022-02-22"));
    assert_eq!(result.warnings, vec!["expiry date 2022-02-22 is in the past".to_string()]);
}

#[test]
fn test_empty_text() {
    let result = extract("");

    assert_eq!(result.category, Category::Other);
    assert_eq!(result.expiry_date.value, None);
    assert_eq!(result.expiry_date.confidence_level, ConfidenceLevel::Low);
    assert_eq!(result.category_confidence.level, ConfidenceLevel::Low);
    assert!(result.fields.is_empty());
    assert!(result.warnings.is_empty());

    let json = serde_json::to_value(&result).unwrap();
    for key in ["category", "categoryConfidence", "expiryDate", "fields", "warnings"] {
        assert!(json.get(key).is_some(), "missing top-level key {}", key);
    }
    assert!(json["expiryDate"]["value"].is_null());
    assert!(json["expiryDate"]["sourceKeyword"].is_null());
    assert!(json["expiryDate"].get("sourceKeyword").is_some());
}

#[test]
fn test_aadhaar_and_name_redacted() {
    let text = "Name: John Doe\nAadhaar: 1234 5678 9012\nMembership valid till 31/12/2026";
    let sanitized = sanitize(text);

    assert!(!sanitized.contains("1234 5678 9012"));
    assert!(!sanitized.contains("123456789012"));
    assert!(!sanitized.contains("John Doe"));

    let json = serde_json::to_string(&extract(text)).unwrap();
    assert!(!json.contains("John Doe"));
    assert!(!json.contains("1234 5678 9012"));
}

#[test]
fn test_license_beats_subscription_wording() {
    let text = "DRIVING LICENCE\nDL No MH12 20110012345\nName: John Doe\nSubscription valid till 09/03/2041";
    let result = extract(text);

    assert_eq!(result.category, Category::Other);
    assert_eq!(result.expiry(), Some("2041-03-09"));
    assert!(result.fields.keys().all(|k| k == "documentType"));
}

#[test]
fn test_birth_date_never_expiry() {
    let extractor = ExpiryFieldExtractor::new(Default::default(), today());
    assert_eq!(extractor.extract_expiry("Date of Birth: 14/08/2025").value, None);

    let result = extract("Gym membership card issued to member, date of birth 14/08/2025");
    assert_eq!(result.expiry_date.value, None);
    assert!(result.warnings.contains(&"required field 'expiryDate' not found".to_string()));
}

#[test]
fn test_insurance_period_range() {
    let text = "Motor Insurance Policy\nPolicy Period: 01/04/2024 to 31/03/2025\nPolicy No: OG-24-1234";
    let result = extract(text);

    assert_eq!(result.category, Category::Insurance);
    assert_eq!(result.expiry(), Some("2025-03-31"));
    assert_eq!(result.expiry_date.source_keyword.as_deref(), Some("period"));
}

#[test]
fn test_warranty_from_duration() {
    let text = "Warranty Card\nBrand: Philips\nDate of Purchase: 10/01/2024\n2 Years Warranty";
    let result = extract(text);

    assert_eq!(result.category, Category::Warranty);
    assert_eq!(result.expiry(), Some("2026-01-09"));
    assert_eq!(result.expiry_date.confidence_level, ConfidenceLevel::Medium);
    assert_eq!(result.field("brand").and_then(|f| f.as_str()), Some("Philips"));
}

#[tokio::test]
async fn test_other_never_leaks_enrichment_fields() {
    let candidate = ExtractionCandidate::new(CandidateSource::Ai, Category::Subscription)
        .with_field("holderName", FieldValue::new("John Doe", 99))
        .with_field("licenseNumber", FieldValue::new("MH12 20110012345", 99))
        .with_field("plan", FieldValue::new("Premium", 99))
        .with_field("documentType", FieldValue::new("Driving License", 90));
    let provider = StaticEnrichment::new(candidate);

    let text = "DRIVING LICENCE\nDL No MH12 20110012345\nValid till 09/03/2041";
    let input = ExtractionInput::new(text).with_category_hint(Category::Subscription);
    let result = engine().extract_enriched(&input, &provider).await;

    assert_eq!(result.category, Category::Other);
    assert_eq!(result.fields.keys().collect::<Vec<_>>(), vec!["documentType"]);
}

#[test]
fn test_single_line_card_redacted() {
    let text = "Aadhaar 1234 5678 9012 Name: John Doe";
    let sanitized = sanitize(text);

    assert!(!sanitized.contains("1234 5678 9012"));
    assert!(!sanitized.contains("John Doe"));
    assert_eq!(sanitize(&sanitized), sanitized);
}

#[test]
fn test_sanitize_idempotent() {
    let inputs = [
        "Paracetamol 500mg EXP: 31/12/2024 BATCH: ABC123",
        "Name: John Doe\nAadhaar 1234 5678 9012",
        "Call 080-2345 6789 or +91 98450 12345, mail care@brand.in",
        "PAN: ABCDE1234F\n\n  Passport   K1234567  ",
        "Customer Name:\tJane Roe\nAddress: 4 Park St",
        "a@b.com1234 5678 9012",
        "Aadhaar 1234 5678 9012 Name: John Doe Membership valid till 31/12/2026",
    ];
    for text in inputs {
        let once = sanitize(text);
        assert_eq!(sanitize(&once), once);
    }
}

#[test]
fn test_date_properties() {
    let norm = |token: &str| normalize_date(token, None, today());

    assert_eq!(norm("08/26").as_deref(), Some("2026-08-31"));
    assert_eq!(norm("27-08-38").as_deref(), Some("2038-08-27"));
    assert_eq!(norm("00/2028").as_deref(), Some("2028-12-31"));
    assert_eq!(norm("31/02/2024"), None);
    assert_eq!(norm("29/02/2024").as_deref(), Some("2024-02-29"));

    for token in ["31/12/2024", "12/2026", "15 Mar 2027", "Mar'27", "2030-01-05", "garbage", ""] {
        if let Some(iso) = norm(token) {
            assert!(NaiveDate::parse_from_str(&iso, "%Y-%m-%d").is_ok(), "{} -> {}", token, iso);
            assert_eq!(iso.len(), 10);
        }
    }
}
