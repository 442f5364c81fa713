//! Single label/file workflow: load, recognize, extract, decide, rename.
//!
//! [`Workflow::process`] never fails as a whole. Every path ends in an
//! [`ItemOutcome`] carried by an [`ItemReport`] that also holds whatever was
//! recognized, so callers can always show the operator what the label said.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::label::{decide, gate::with_target_extension, LabelExtractor, RuleExtractor};
use crate::models::label::{LabelFields, ObservationSet, RenameDecision};
use crate::ocr::{LabelImage, Recognizer};
use crate::rename::{RenameExecutor, RenamedPaths};

/// Reply that abandons a rename.
pub const SKIP_TOKEN: &str = "skip";

/// Operator prompt used to confirm or override a suggested name.
pub trait Prompt {
    /// Show the recognized lines and the decision, then read one line.
    /// `None` means end of input.
    fn ask(
        &mut self,
        observations: &ObservationSet,
        decision: &RenameDecision,
    ) -> std::io::Result<Option<String>>;
}

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Use the suggested name.
    Accept,
    /// Leave the file alone.
    Skip,
    /// Use this base name (extension is appended).
    Custom(String),
}

impl Reply {
    /// Empty input accepts, `skip` (any case) skips, anything else is a base name.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Reply::Accept
        } else if line.eq_ignore_ascii_case(SKIP_TOKEN) {
            Reply::Skip
        } else {
            Reply::Custom(line.to_string())
        }
    }
}

/// How the rename gets confirmed.
pub enum Mode<'p> {
    /// Always ask.
    Interactive(&'p mut dyn Prompt),
    /// Rename high-confidence labels directly, ask for the rest.
    Auto(&'p mut dyn Prompt),
    /// Never ask; rename whatever the gate says. Used by batch runs.
    Unattended,
}

/// Terminal state of one item.
#[derive(Debug)]
pub enum ItemOutcome {
    Renamed(RenamedPaths),
    Skipped,
    LoadFailed(String),
    RecognitionFailed(String),
    ExtractionFailed(ExtractionError),
    RenameFailed(String),
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, ItemOutcome::Renamed(_) | ItemOutcome::Skipped)
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemOutcome::Renamed(paths) if paths.unchanged => {
                write!(f, "already named {}", file_name(&paths.file))
            }
            ItemOutcome::Renamed(paths) => write!(f, "renamed to {}", file_name(&paths.file)),
            ItemOutcome::Skipped => write!(f, "skipped"),
            ItemOutcome::LoadFailed(e) => write!(f, "failed to load image: {}", e),
            ItemOutcome::RecognitionFailed(e) => write!(f, "recognition failed: {}", e),
            ItemOutcome::ExtractionFailed(e) => write!(f, "extraction failed: {}", e),
            ItemOutcome::RenameFailed(e) => write!(f, "rename failed: {}", e),
        }
    }
}

/// Everything known about one processed item.
#[derive(Debug)]
pub struct ItemReport {
    pub label: PathBuf,
    pub target: PathBuf,
    /// Recognized lines; `None` if recognition never completed.
    pub observations: Option<ObservationSet>,
    pub fields: Option<LabelFields>,
    pub decision: Option<RenameDecision>,
    /// Name the file was (or would have been) renamed to.
    pub final_name: Option<String>,
    pub outcome: ItemOutcome,
}

impl ItemReport {
    fn new(label: &Path, target: &Path, outcome: ItemOutcome) -> Self {
        Self {
            label: label.to_path_buf(),
            target: target.to_path_buf(),
            observations: None,
            fields: None,
            decision: None,
            final_name: None,
            outcome,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome.is_failure()
    }

    /// Human-readable listing of every recognized line.
    pub fn observations_report(&self) -> String {
        match &self.observations {
            Some(observations) => observations.describe(),
            None => "  (no recognition results)".to_string(),
        }
    }
}

/// Runs one label/file pair through the pipeline.
pub struct Workflow<'a> {
    recognizer: &'a dyn Recognizer,
    extractor: RuleExtractor,
    executor: RenameExecutor,
}

impl<'a> Workflow<'a> {
    pub fn new(recognizer: &'a dyn Recognizer, executor: RenameExecutor) -> Self {
        Self {
            recognizer,
            extractor: RuleExtractor::new(),
            executor,
        }
    }

    /// Process `label` and rename `target` (within its own directory).
    pub fn process(&self, label: &Path, target: &Path, mode: Mode<'_>) -> ItemReport {
        debug!("Processing {} -> {}", label.display(), target.display());

        let image = match LabelImage::open(label) {
            Ok(image) => image,
            Err(e) => {
                warn!("Failed to load {}: {}", label.display(), e);
                return ItemReport::new(label, target, ItemOutcome::LoadFailed(e.to_string()));
            }
        };

        let observations = match self.recognizer.recognize(&image) {
            Ok(observations) => observations,
            Err(e) => {
                warn!(
                    "Recognition ({}) failed for {}: {}",
                    self.recognizer.name(),
                    label.display(),
                    e
                );
                return ItemReport::new(
                    label,
                    target,
                    ItemOutcome::RecognitionFailed(e.to_string()),
                );
            }
        };
        debug!("Recognized {} lines", observations.len());

        let mut report = ItemReport::new(label, target, ItemOutcome::Skipped);

        let fields = match self.extractor.extract(&observations) {
            Ok(fields) => fields,
            Err(e) => {
                warn!("Could not extract fields from {}: {}", label.display(), e);
                report.observations = Some(observations);
                report.outcome = ItemOutcome::ExtractionFailed(e);
                return report;
            }
        };

        let decision = decide(&fields);
        let chosen = self.confirm(&observations, &decision, mode);
        report.observations = Some(observations);
        report.fields = Some(fields);
        report.decision = Some(decision);

        let Some(new_name) = chosen else {
            info!("Skipped {}", target.display());
            return report;
        };

        report.outcome = match self.executor.rename(target_dir(target), target, &new_name) {
            Ok(paths) => ItemOutcome::Renamed(paths),
            Err(e) => {
                warn!("Rename of {} failed: {}", target.display(), e);
                ItemOutcome::RenameFailed(e.to_string())
            }
        };
        report.final_name = Some(new_name);
        report
    }

    /// Final file name to use, or `None` to skip.
    fn confirm(
        &self,
        observations: &ObservationSet,
        decision: &RenameDecision,
        mode: Mode<'_>,
    ) -> Option<String> {
        let prompt = match mode {
            Mode::Unattended => {
                if decision.low_confidence {
                    warn!(
                        "Low confidence ({}) for {}, renaming anyway",
                        decision.confidences_str(),
                        decision.suggested_name
                    );
                }
                return Some(decision.suggested_name.clone());
            }
            Mode::Auto(_) if !decision.low_confidence => {
                return Some(decision.suggested_name.clone());
            }
            Mode::Auto(prompt) => {
                debug!("Low confidence, falling back to confirmation");
                prompt
            }
            Mode::Interactive(prompt) => prompt,
        };

        let reply = match prompt.ask(observations, decision) {
            Ok(Some(line)) => Reply::parse(&line),
            Ok(None) => {
                debug!("No reply (end of input)");
                Reply::Skip
            }
            Err(e) => {
                warn!("Failed to read reply: {}", e);
                Reply::Skip
            }
        };

        match reply {
            Reply::Accept => Some(decision.suggested_name.clone()),
            Reply::Skip => None,
            Reply::Custom(basename) => Some(with_target_extension(&basename)),
        }
    }
}

fn target_dir(target: &Path) -> &Path {
    target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
