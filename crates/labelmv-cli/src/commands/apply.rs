//! Apply command - rename scans from a CSV rename sheet or a saved JSON mapping.

use std::path::PathBuf;

use clap::Args;
use console::style;

use labelmv_core::mapping::{apply_mapping, read_sheet, RenameMapping};
use labelmv_core::rename::RenameExecutor;

use super::load_config;

/// Arguments for the apply command.
#[derive(Args)]
pub struct ApplyArgs {
    /// CSV sheet with "Original File Name" and "New File Name" columns,
    /// or a .json mapping written by `batch --mapping`
    #[arg(required = true)]
    sheet: PathBuf,

    /// Directory holding the files to rename
    #[arg(required = true)]
    target_dir: PathBuf,
}

pub fn run(args: ApplyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.sheet.is_file() {
        anyhow::bail!("Sheet not found: {}", args.sheet.display());
    }
    if !args.target_dir.is_dir() {
        anyhow::bail!("Target directory not found: {}", args.target_dir.display());
    }

    let is_json = args
        .sheet
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let entries = if is_json {
        RenameMapping::from_file(&args.sheet)?.entries()
    } else {
        read_sheet(&args.sheet)?
    };
    println!(
        "{} {} rows in {}",
        style("ℹ").blue(),
        entries.len(),
        args.sheet.display()
    );

    let executor = RenameExecutor::new(config.rename.clone());
    let rows = apply_mapping(&entries, &args.target_dir, &executor);

    let mut renamed = 0;
    for row in &rows {
        match &row.result {
            Ok(paths) if paths.unchanged => {
                println!("{} {} unchanged", style("-").dim(), row.entry.original);
            }
            Ok(_) => {
                renamed += 1;
                println!(
                    "{} {} → {}",
                    style("✓").green(),
                    row.entry.original,
                    row.entry.renamed
                );
            }
            Err(e) => {
                println!("{} {}: {}", style("✗").red(), row.entry.original, e);
            }
        }
    }

    println!();
    println!("Renamed {} of {} files", renamed, rows.len());

    Ok(())
}
