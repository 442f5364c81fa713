//! Unattended batch runs over a directory of label images.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use tracing::{debug, info, warn};

use crate::audit::{AuditLog, BatchRecord, Outcome};
use crate::error::{LabelmvError, Result};
use crate::label::TARGET_EXTENSION;
use crate::models::config::{BatchConfig, LabelmvConfig};
use crate::ocr::Recognizer;
use crate::rename::RenameExecutor;
use crate::workflow::{ItemOutcome, ItemReport, Mode, Workflow};

/// Label images in `label_dir` with a configured extension, in path order.
pub fn discover_labels(label_dir: &Path, config: &BatchConfig) -> Result<Vec<PathBuf>> {
    if !label_dir.is_dir() {
        return Err(LabelmvError::NotADirectory(label_dir.to_path_buf()));
    }

    let dir = label_dir.to_str().ok_or_else(|| {
        LabelmvError::Config(format!("non UTF-8 path: {}", label_dir.display()))
    })?;
    let pattern = format!("{}/*", Pattern::escape(dir));

    let mut labels: Vec<PathBuf> = glob(&pattern)
        .map_err(|e| LabelmvError::Config(format!("bad discovery pattern: {}", e)))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|p| p.is_file() && config.is_label_image(p))
        .collect();

    labels.sort();
    Ok(labels)
}

/// The `.mrxs` file in `target_dir` that belongs to `label`.
///
/// Tries `<stem>.mrxs`, then the stem with the label suffix removed.
pub fn find_counterpart(label: &Path, target_dir: &Path, config: &BatchConfig) -> Option<PathBuf> {
    let stem = label.file_stem()?.to_str()?;

    let direct = target_dir.join(format!("{}.{}", stem, TARGET_EXTENSION));
    if direct.is_file() {
        return Some(direct);
    }

    let suffix = config.label_suffix.as_deref().filter(|s| !s.is_empty())?;
    let stripped = stem.strip_suffix(suffix).filter(|s| !s.is_empty())?;
    let fallback = target_dir.join(format!("{}.{}", stripped, TARGET_EXTENSION));
    fallback.is_file().then_some(fallback)
}

/// One successful rename, by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedFile {
    pub original: String,
    pub renamed: String,
}

/// Totals for a finished run.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub total: usize,
    counts: [usize; 6],
    pub renames: Vec<RenamedFile>,
    /// Label files per extracted SampleID.
    pub sample_ids: BTreeMap<String, Vec<String>>,
    /// Records that could not be written to the audit log.
    pub unlogged: usize,
    pub log_path: PathBuf,
}

impl BatchSummary {
    fn new(log_path: PathBuf) -> Self {
        Self {
            total: 0,
            counts: [0; 6],
            renames: Vec::new(),
            sample_ids: BTreeMap::new(),
            unlogged: 0,
            log_path,
        }
    }

    fn add(&mut self, record: &BatchRecord) {
        self.total += 1;
        self.counts[Self::index(record.outcome)] += 1;
        if let Some(sample_id) = &record.sample_id {
            self.sample_ids
                .entry(sample_id.clone())
                .or_default()
                .push(record.label_file.clone());
        }
    }

    fn index(outcome: Outcome) -> usize {
        Outcome::ALL
            .iter()
            .position(|o| *o == outcome)
            .unwrap_or_default()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.counts[Self::index(outcome)]
    }

    /// Non-zero counts, in declaration order.
    pub fn counts(&self) -> Vec<(Outcome, usize)> {
        Outcome::ALL
            .into_iter()
            .map(|o| (o, self.count(o)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.total - self.count(Outcome::Renamed)
    }

    /// SampleIDs read from exactly one label, with that label's file name.
    ///
    /// Every sample is expected on several slides, so a lone SampleID
    /// usually means a misread.
    pub fn outlier_sample_ids(&self) -> Vec<(&str, &str)> {
        self.sample_ids
            .iter()
            .filter_map(|(id, labels)| match labels.as_slice() {
                [only] => Some((id.as_str(), only.as_str())),
                _ => None,
            })
            .collect()
    }
}

/// Processes every label in a directory against a target directory.
pub struct BatchOrchestrator<'a> {
    workflow: Workflow<'a>,
    config: BatchConfig,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(recognizer: &'a dyn Recognizer, config: &LabelmvConfig) -> Self {
        Self {
            workflow: Workflow::new(recognizer, RenameExecutor::new(config.rename.clone())),
            config: config.batch.clone(),
        }
    }

    /// Path of the audit log for a label directory.
    pub fn log_path(&self, label_dir: &Path) -> PathBuf {
        label_dir.join(&self.config.log_file_name)
    }

    /// Run the batch, calling `on_record` after each record is logged.
    ///
    /// Only setup problems (missing directories, log creation) are errors.
    /// Per-item failures end up in the log, and a record the log cannot
    /// take is counted in [`BatchSummary::unlogged`].
    pub fn run<F>(&self, label_dir: &Path, target_dir: &Path, on_record: F) -> Result<BatchSummary>
    where
        F: FnMut(&BatchRecord),
    {
        if !target_dir.is_dir() {
            return Err(LabelmvError::NotADirectory(target_dir.to_path_buf()));
        }

        let labels = discover_labels(label_dir, &self.config)?;
        info!("Found {} label images in {}", labels.len(), label_dir.display());

        let log_path = self.log_path(label_dir);
        let mut log = AuditLog::create(&log_path)?;
        let mut summary = BatchSummary::new(log_path);

        self.process(&labels, target_dir, &mut log, &mut summary, on_record);

        info!(
            "Batch finished: {} of {} renamed, log at {}",
            summary.count(Outcome::Renamed),
            summary.total,
            summary.log_path.display()
        );

        Ok(summary)
    }

    fn process<W, F>(
        &self,
        labels: &[PathBuf],
        target_dir: &Path,
        log: &mut AuditLog<W>,
        summary: &mut BatchSummary,
        mut on_record: F,
    ) where
        W: Write,
        F: FnMut(&BatchRecord),
    {
        for label in labels {
            let label_file = file_name(label);

            let record = match find_counterpart(label, target_dir, &self.config) {
                None => {
                    warn!("No .{} file for {}", TARGET_EXTENSION, label_file);
                    BatchRecord::new(&label_file, Outcome::MissingCounterpart)
                }
                Some(target) => {
                    debug!("{} -> {}", label_file, target.display());
                    let report = self.workflow.process(label, &target, Mode::Unattended);
                    if let ItemOutcome::Renamed(paths) = &report.outcome {
                        if !paths.unchanged {
                            summary.renames.push(RenamedFile {
                                original: file_name(&target),
                                renamed: file_name(&paths.file),
                            });
                        }
                    }
                    record_for(label_file, &report)
                }
            };

            // The file may already have moved; keep going and report it
            if let Err(e) = log.append(&record) {
                warn!("Audit log write failed for {}: {}", record.label_file, e);
                summary.unlogged += 1;
            }
            summary.add(&record);
            on_record(&record);
        }
    }
}

/// Audit record for a processed item.
fn record_for(label_file: String, report: &ItemReport) -> BatchRecord {
    let (outcome, detail) = match &report.outcome {
        ItemOutcome::Renamed(_) => (Outcome::Renamed, None),
        ItemOutcome::LoadFailed(e) => (Outcome::LoadFailed, Some(e.clone())),
        ItemOutcome::RecognitionFailed(e) => (Outcome::RecognitionFailed, Some(e.clone())),
        ItemOutcome::ExtractionFailed(e) => {
            let lines = report
                .observations
                .as_ref()
                .map(|o| o.compact())
                .unwrap_or_default();
            let detail = if lines.is_empty() { e.to_string() } else { lines };
            (Outcome::ExtractionFailed, Some(detail))
        }
        ItemOutcome::RenameFailed(e) => (Outcome::RenameFailed, Some(e.clone())),
        // Unattended runs never prompt
        ItemOutcome::Skipped => (Outcome::RenameFailed, Some("skipped".to_string())),
    };

    let mut record = BatchRecord::new(label_file, outcome);
    if let Some(fields) = &report.fields {
        record.sample_id = Some(fields.sample_id.value.clone());
        record.marker = Some(fields.marker.value.clone());
        record.case_id = Some(fields.case_id.value.clone());
    }
    if outcome == Outcome::Renamed {
        record.confidences = report.decision.as_ref().map(|d| d.confidences);
    }

    match detail {
        Some(detail) => record.with_error(detail),
        None => record,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
