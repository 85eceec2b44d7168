//! Process command - extract fields from a single OCR text file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use tracing::{debug, info};

use expiry_core::{Category, ExtractionEngine, ExtractionInput, ExtractionResult, StaticEnrichment};

use super::{load_config, read_input};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input text file, or `-` for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Category hint (warranty, insurance, amc, subscription, medicine, other)
    #[arg(long)]
    category: Option<Category>,

    /// OCR engine confidence for the text (0..1 or 0..100)
    #[arg(long)]
    ocr_confidence: Option<f32>,

    /// JSON file with a stored enrichment candidate to merge
    #[arg(long)]
    enrichment: Option<PathBuf>,

    /// Evaluate dates as if today were this day (YYYY-MM-DD)
    #[arg(long)]
    reference_date: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(date) = args.reference_date {
        config.reference_date = Some(date);
    }

    let text = read_input(&args.input)?;
    info!("Processing {} ({} bytes)", args.input.display(), text.len());

    let mut input = ExtractionInput::new(text);
    input.category_hint = args.category;
    input.ocr_confidence = args.ocr_confidence;

    let engine = ExtractionEngine::new(config);
    let result = match &args.enrichment {
        Some(path) => {
            let provider = StaticEnrichment::from_file(path)?;
            engine.extract_enriched(&input, &provider).await
        }
        None => engine.extract(&input),
    };

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

/// `name=value` pairs joined with `;`.
pub fn joined_fields(result: &ExtractionResult) -> String {
    result
        .fields
        .iter()
        .filter_map(|(name, field)| field.as_str().map(|v| format!("{}={}", name, v)))
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "category",
        "category_confidence",
        "expiry_date",
        "expiry_confidence",
        "source_keyword",
        "fields",
        "warnings",
    ])?;

    wtr.write_record([
        result.category.to_string(),
        result.category_confidence.percentage.to_string(),
        result.expiry().unwrap_or_default().to_string(),
        result.expiry_date.confidence_level.to_string(),
        result.expiry_date.source_keyword.clone().unwrap_or_default(),
        joined_fields(result),
        result.warnings.join("; "),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Category: {} ({}, {}%)\n",
        result.category, result.category_confidence.level, result.category_confidence.percentage
    ));

    match result.expiry() {
        Some(date) => {
            output.push_str(&format!(
                "Expiry:   {} ({}",
                date, result.expiry_date.confidence_level
            ));
            if let Some(keyword) = &result.expiry_date.source_keyword {
                output.push_str(&format!(", via '{}'", keyword));
            }
            output.push_str(")\n");
        }
        None => output.push_str("Expiry:   not found\n"),
    }

    if !result.fields.is_empty() {
        output.push('\n');
        output.push_str("Fields:\n");
        for (name, field) in &result.fields {
            if let Some(value) = field.as_str() {
                output.push_str(&format!("  {}: {} ({})\n", name, value, field.confidence_level));
            }
        }
    }

    if !result.warnings.is_empty() {
        output.push('\n');
        output.push_str("Warnings:\n");
        for warning in &result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
