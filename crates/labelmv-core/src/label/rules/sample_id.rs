//! Sample number (`NN-NNN`) matching.

use super::patterns::SAMPLE_ID;
use super::FieldRule;
use crate::models::label::FieldRole;

/// Matches a sample number at the very start of a line.
///
/// Only the `NN-NNN` prefix becomes the value; anything after it on the
/// line (dates, initials) is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleIdRule;

impl FieldRule for SampleIdRule {
    fn role(&self) -> FieldRole {
        FieldRole::SampleId
    }

    fn match_line<'t>(&self, text: &'t str) -> Option<&'t str> {
        SAMPLE_ID.find(text).map(|m| m.as_str())
    }
}
