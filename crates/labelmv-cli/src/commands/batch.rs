//! Batch command - rename every scan in a directory from its label image.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use labelmv_core::audit::Outcome;
use labelmv_core::batch::{discover_labels, BatchOrchestrator};
use labelmv_core::mapping::RenameMapping;

use super::{build_recognizer, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Directory of label images
    #[arg(required = true)]
    label_dir: PathBuf,

    /// Directory of scan files (.mrxs)
    #[arg(required = true)]
    target_dir: PathBuf,

    /// Read recognition results from a transcript instead of running OCR
    #[arg(short, long)]
    transcript: Option<PathBuf>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Write a JSON mapping of original to new file names
    #[arg(long)]
    mapping: Option<PathBuf>,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.label_dir.is_dir() {
        anyhow::bail!("Label directory not found: {}", args.label_dir.display());
    }
    if !args.target_dir.is_dir() {
        anyhow::bail!("Target directory not found: {}", args.target_dir.display());
    }

    let total = discover_labels(&args.label_dir, &config.batch)?.len();
    if total == 0 {
        println!(
            "{} No label images found in {}",
            style("ℹ").blue(),
            args.label_dir.display()
        );
    } else {
        println!("{} Found {} label images to process", style("ℹ").blue(), total);
    }

    let recognizer = build_recognizer(
        &config,
        args.transcript.as_deref(),
        args.model_dir.as_deref(),
    )?;
    let orchestrator = BatchOrchestrator::new(recognizer.as_ref(), &config);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let summary = orchestrator.run(&args.label_dir, &args.target_dir, |record| {
        pb.set_message(record.label_file.clone());
        if record.outcome != Outcome::Renamed {
            let detail = record
                .error_detail
                .as_deref()
                .map(|d| format!(" ({})", d))
                .unwrap_or_default();
            pb.suspend(|| {
                println!(
                    "{} {}: {}{}",
                    style("✗").red(),
                    record.label_file,
                    record.outcome,
                    detail
                )
            });
        }
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    if let Some(path) = &args.mapping {
        RenameMapping::from_summary(&args.label_dir, &args.target_dir, &summary).save(path)?;
        println!(
            "{} Rename mapping written to {}",
            style("✓").green(),
            path.display()
        );
    }

    debug!("Batch took {}ms", start.elapsed().as_millis());

    println!();
    println!("{}", style("Batch Summary").bold());
    println!("  Total:  {}", summary.total);
    println!("  Failed: {}", summary.failures());
    for (outcome, count) in summary.counts() {
        let label = format!("{}:", outcome);
        let line = format!("  {:<20} {}", label, count);
        if outcome == Outcome::Renamed {
            println!("{}", style(line).green());
        } else {
            println!("{}", style(line).red());
        }
    }
    println!("  Log:    {}", summary.log_path.display());
    println!("  Time:   {:.2}s", start.elapsed().as_secs_f64());

    if summary.unlogged > 0 {
        println!(
            "{} {} record(s) could not be written to the log",
            style("⚠").yellow(),
            summary.unlogged
        );
    }

    println!();
    let outliers = summary.outlier_sample_ids();
    if outliers.is_empty() {
        println!("{} No SampleID outliers detected", style("✓").green());
    } else {
        println!(
            "{} Found {} potential outlier SampleID(s):",
            style("⚠").yellow(),
            outliers.len()
        );
        for (sample_id, label_file) in outliers {
            println!("  - SampleID '{}' only found in {}", sample_id, label_file);
        }
    }

    Ok(())
}
