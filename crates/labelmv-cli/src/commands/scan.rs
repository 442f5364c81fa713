//! Scan command - show what a label says without renaming anything.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use labelmv_core::label::{decide, LabelExtractor, RuleExtractor};
use labelmv_core::models::label::{LabelFields, ObservationSet, RenameDecision};
use labelmv_core::ocr::LabelImage;

use super::{build_recognizer, load_config, styled_confidences};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Label image
    #[arg(required = true)]
    image: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Read recognition results from a transcript instead of running OCR
    #[arg(short, long)]
    transcript: Option<PathBuf>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text summary
    Text,
    /// JSON output
    Json,
}

#[derive(Serialize)]
struct ScanReport {
    image: PathBuf,
    observations: ObservationSet,
    fields: Option<LabelFields>,
    decision: Option<RenameDecision>,
    error: Option<String>,
}

pub fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.image.is_file() {
        anyhow::bail!("Label image not found: {}", args.image.display());
    }

    let recognizer = build_recognizer(
        &config,
        args.transcript.as_deref(),
        args.model_dir.as_deref(),
    )?;

    let label = LabelImage::open(&args.image)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", args.image.display(), e))?;
    let observations = recognizer
        .recognize(&label)
        .map_err(|e| anyhow::anyhow!("Recognition failed: {}", e))?;

    let (fields, error) = match RuleExtractor::new().extract(&observations) {
        Ok(fields) => (Some(fields), None),
        Err(e) => (None, Some(e.to_string())),
    };
    let report = ScanReport {
        image: args.image,
        decision: fields.as_ref().map(decide),
        observations,
        fields,
        error,
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&report),
    }

    Ok(())
}

fn print_text(report: &ScanReport) {
    println!("{}", style(report.image.display()).bold());
    println!("Recognized text:");
    println!("{}", report.observations.describe());

    match (&report.fields, &report.decision) {
        (Some(fields), Some(decision)) => {
            println!();
            println!("  SampleID: {}", fields.sample_id.value);
            println!("  Marker:   {}", fields.marker.value);
            println!("  CaseID:   {}", fields.case_id.value);
            println!();
            println!("Suggested name: {}", style(&decision.suggested_name).cyan());
            println!("Confidences:    {}", styled_confidences(decision));
            if decision.low_confidence {
                println!("{} Low confidence", style("⚠").yellow());
            }
        }
        _ => {
            println!();
            println!(
                "{} {}",
                style("✗").red(),
                report.error.as_deref().unwrap_or("extraction failed")
            );
        }
    }
}
