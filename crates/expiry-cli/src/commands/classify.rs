//! Classify command - show the predicted category and keyword scores.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde_json::json;

use expiry_core::{CategoryPrediction, CategoryPredictor};

use super::{load_config, read_input};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Input text file, or `-` for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ClassifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let text = read_input(&args.input)?;

    let prediction = CategoryPredictor::new(config.classifier).predict_detailed(&text);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prediction_json(&prediction))?);
    } else {
        print_table(&prediction);
    }

    Ok(())
}

fn prediction_json(prediction: &CategoryPrediction) -> serde_json::Value {
    let scores: serde_json::Map<String, serde_json::Value> = prediction
        .scores
        .iter()
        .map(|(category, score)| (category.to_string(), json!(score)))
        .collect();

    json!({
        "category": prediction.category,
        "confidence": prediction.confidence,
        "reason": prediction.reason.as_str(),
        "licenseIndicators": prediction.license_indicators,
        "scores": scores,
    })
}

fn print_table(prediction: &CategoryPrediction) {
    println!(
        "Category: {} ({}%)",
        style(prediction.category).bold(),
        prediction.confidence
    );
    println!("Reason:   {}", prediction.reason.as_str());
    println!("License indicators: {}", prediction.license_indicators);

    if !prediction.scores.is_empty() {
        println!();
        println!("Scores:");
        for (category, score) in &prediction.scores {
            let line = format!("  {:<14} {:>3}", category.as_str(), score);
            if *category == prediction.category {
                println!("{}", style(line).green());
            } else {
                println!("{}", line);
            }
        }
    }
}
