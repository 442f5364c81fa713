//! Confidence gate: suggested file name and the accept/defer decision.

use crate::models::label::{LabelFields, RenameDecision};

/// Minimum per-field confidence for a rename to go ahead without a human.
pub const CONFIDENCE_THRESHOLD: f32 = 0.85;

/// Extension of the scan container files being renamed.
pub const TARGET_EXTENSION: &str = "mrxs";

/// Build the rename decision for a fully extracted label.
pub fn decide(fields: &LabelFields) -> RenameDecision {
    let confidences = fields.confidences();
    let low_confidence = confidences.iter().any(|c| *c < CONFIDENCE_THRESHOLD);

    RenameDecision {
        suggested_name: suggested_name(fields),
        confidences,
        low_confidence,
    }
}

/// `{sample}_{marker}_{case}.mrxs`.
pub fn suggested_name(fields: &LabelFields) -> String {
    format!(
        "{}_{}_{}.{}",
        fields.sample_id.value, fields.marker.value, fields.case_id.value, TARGET_EXTENSION
    )
}

/// Append the container extension to an operator-supplied base name.
pub fn with_target_extension(basename: &str) -> String {
    format!("{}.{}", basename, TARGET_EXTENSION)
}
