//! Label field extraction and the confidence gate.

mod extractor;
pub mod gate;
pub mod rules;

pub use extractor::RuleExtractor;
pub use gate::{decide, CONFIDENCE_THRESHOLD, TARGET_EXTENSION};

use crate::error::ExtractionError;
use crate::models::label::{LabelFields, ObservationSet};

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for label field extractors.
pub trait LabelExtractor {
    /// Resolve all three label fields, or report which are missing.
    fn extract(&self, observations: &ObservationSet) -> Result<LabelFields>;
}
