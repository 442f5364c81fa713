//! Rename command - rename one scan from its label image.

use std::io::BufRead;
use std::path::PathBuf;

use clap::Args;
use console::{style, Term};

use labelmv_core::models::label::{ObservationSet, RenameDecision};
use labelmv_core::rename::RenameExecutor;
use labelmv_core::workflow::{ItemOutcome, ItemReport, Mode, Prompt, Workflow, SKIP_TOKEN};

use super::{build_recognizer, load_config, styled_confidences};

/// Arguments for the rename command.
#[derive(Args)]
pub struct RenameArgs {
    /// Label image
    #[arg(required = true)]
    image: PathBuf,

    /// Scan file to rename (.mrxs)
    #[arg(required = true)]
    target: PathBuf,

    /// Rename without asking when every field is confident
    #[arg(long)]
    auto: bool,

    /// Read recognition results from a transcript instead of running OCR
    #[arg(short, long)]
    transcript: Option<PathBuf>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Terminal prompt: writes to stderr, reads a line from stdin.
struct TermPrompt {
    term: Term,
    shown: bool,
}

impl TermPrompt {
    fn new() -> Self {
        Self {
            term: Term::stderr(),
            shown: false,
        }
    }
}

impl Prompt for TermPrompt {
    fn ask(
        &mut self,
        observations: &ObservationSet,
        decision: &RenameDecision,
    ) -> std::io::Result<Option<String>> {
        self.shown = true;
        self.term.write_line("Recognized text:")?;
        self.term.write_line(&observations.describe())?;
        self.term.write_line(&format!(
            "Suggested name: {}",
            style(&decision.suggested_name).cyan().bold()
        ))?;
        self.term.write_line(&format!(
            "Confidences (SampleID;Marker;CaseID): {}",
            styled_confidences(decision)
        ))?;
        if decision.low_confidence {
            self.term.write_line(&format!(
                "{} Low confidence, please check the label",
                style("⚠").yellow()
            ))?;
        }
        self.term.write_str(&format!(
            "Press Enter to accept, type a new name (without extension), or '{}': ",
            SKIP_TOKEN
        ))?;
        self.term.flush()?;

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            self.term.write_line("")?;
            return Ok(None);
        }
        Ok(Some(line))
    }
}

pub fn run(args: RenameArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.image.is_file() {
        anyhow::bail!("Label image not found: {}", args.image.display());
    }
    if !args.target.exists() {
        anyhow::bail!("Target file not found: {}", args.target.display());
    }

    let recognizer = build_recognizer(
        &config,
        args.transcript.as_deref(),
        args.model_dir.as_deref(),
    )?;
    let workflow = Workflow::new(recognizer.as_ref(), RenameExecutor::new(config.rename.clone()));

    let mut prompt = TermPrompt::new();
    let mode = if args.auto {
        Mode::Auto(&mut prompt)
    } else {
        Mode::Interactive(&mut prompt)
    };

    let report = workflow.process(&args.image, &args.target, mode);

    if !prompt.shown {
        println!("Recognized text:");
        println!("{}", report.observations_report());
    }
    print_outcome(&report);

    if report.is_failure() {
        anyhow::bail!("{}: {}", args.image.display(), report.outcome);
    }
    Ok(())
}

fn print_outcome(report: &ItemReport) {
    match &report.outcome {
        ItemOutcome::Renamed(paths) => {
            let from = report
                .target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let to = report.final_name.as_deref().unwrap_or_default();
            if paths.unchanged {
                println!("{} {} already has that name", style("✓").green(), from);
            } else {
                println!("{} Renamed {} → {}", style("✓").green(), from, to);
            }
            if let Some(dir) = &paths.companion_dir {
                println!("  data directory moved to {}", dir.display());
            }
        }
        ItemOutcome::Skipped => {
            println!("{} Skipped, {} left unchanged", style("ℹ").blue(), report.target.display());
        }
        failure => {
            println!("{} {}", style("✗").red(), failure);
        }
    }
}
