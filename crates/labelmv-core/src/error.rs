//! Error types for the labelmv-core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::label::FieldRole;

/// Main error type for the labelmv library.
#[derive(Error, Debug)]
pub enum LabelmvError {
    /// Label image could not be read or decoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Text recognition error.
    #[error("recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Rename error.
    #[error("rename error: {0}")]
    Rename(#[from] RenameError),

    /// Audit log error.
    #[error("audit log error: {0}")]
    Audit(#[from] AuditError),

    /// CSV error outside the audit log (mapping sheets).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required directory is missing.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Errors raised by a recognition collaborator.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The engine ran but failed.
    #[error("text recognition failed: {0}")]
    Engine(String),

    /// No engine is available; carries the reason it could not be created.
    #[error("recognizer unavailable: {0}")]
    Unavailable(String),

    /// Transcript file could not be read or parsed.
    #[error("invalid transcript: {0}")]
    Transcript(String),

    /// Transcript has no section for the requested image.
    #[error("no transcript entry for {0}")]
    NotInTranscript(String),
}

/// Errors related to label field extraction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// One or more required fields had no matching observation.
    #[error("missing required fields: {}", format_roles(.0))]
    MissingFields(Vec<FieldRole>),
}

fn format_roles(roles: &[FieldRole]) -> String {
    roles
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while moving a target file.
#[derive(Error, Debug)]
pub enum RenameError {
    /// Requested name is not a bare file name.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    /// The file to rename does not exist.
    #[error("source not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// Something already lives at the destination.
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// The filesystem move failed.
    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data directory move failed and the file could not be moved back.
    #[error("data directory move failed and {} could not be restored: {source}", .file.display())]
    PartialMove {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to the audit log.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Underlying CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error while creating or flushing the log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be turned back into a record.
    #[error("malformed row {row}: {reason}")]
    Malformed { row: usize, reason: String },
}

/// Result type for the labelmv library.
pub type Result<T> = std::result::Result<T, LabelmvError>;
