//! Sanitize command - print OCR text with personal data redacted.

use std::path::PathBuf;

use clap::Args;
use console::style;

use expiry_core::PiiSanitizer;

use super::read_input;

/// Arguments for the sanitize command.
#[derive(Args)]
pub struct SanitizeArgs {
    /// Input text file, or `-` for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Print redaction counts to stderr
    #[arg(long)]
    report: bool,
}

pub async fn run(args: SanitizeArgs) -> anyhow::Result<()> {
    let text = read_input(&args.input)?;
    let report = PiiSanitizer::new().sanitize_with_report(&text);

    println!("{}", report.text);

    if args.report {
        eprintln!();
        eprintln!("{} {} redactions", style("ℹ").blue(), report.total());
        for (kind, count) in &report.redactions {
            eprintln!("  {:<14} {}", kind.as_str(), count);
        }
    }

    Ok(())
}
