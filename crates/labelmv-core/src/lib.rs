//! Core library for renaming slide scans from their label images.
//!
//! This crate provides:
//! - Text recognition collaborators (ONNX OCR, recognition transcripts)
//! - SampleID / Marker / CaseID extraction and the confidence gate
//! - Safe renaming of `.mrxs` files and their data directories
//! - Single-item workflow and unattended batch runs with a CSV audit log
//! - Rename mapping export and application

pub mod audit;
pub mod batch;
pub mod error;
pub mod label;
pub mod mapping;
pub mod models;
pub mod ocr;
pub mod rename;
pub mod workflow;

pub use audit::{AuditLog, BatchRecord, Outcome};
pub use batch::{BatchOrchestrator, BatchSummary};
pub use error::{LabelmvError, Result};
pub use label::{decide, LabelExtractor, RuleExtractor, CONFIDENCE_THRESHOLD, TARGET_EXTENSION};
pub use mapping::{MappingEntry, RenameMapping};
pub use models::config::LabelmvConfig;
pub use models::label::{FieldMatch, FieldRole, LabelFields, Observation, ObservationSet, RenameDecision};
pub use ocr::{LabelImage, Recognizer, TranscriptRecognizer, UnavailableRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use rename::{RenameExecutor, RenamedPaths};
pub use workflow::{ItemOutcome, ItemReport, Mode, Prompt, Reply, Workflow};
