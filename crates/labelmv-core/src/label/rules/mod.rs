//! Rule-based field matchers for slide labels.

pub mod case_id;
pub mod marker;
pub mod patterns;
pub mod sample_id;

pub use case_id::CaseIdRule;
pub use marker::MarkerRule;
pub use patterns::*;
pub use sample_id::SampleIdRule;

use crate::models::label::{FieldMatch, FieldRole, ObservationSet};

/// Trait for single-field matchers.
///
/// A rule only looks at one line at a time; ordering policy lives in
/// [`FieldRule::find`], which takes the first matching observation.
pub trait FieldRule {
    /// The field this rule produces.
    fn role(&self) -> FieldRole;

    /// The part of `text` that forms the field value, if the line matches.
    fn match_line<'t>(&self, text: &'t str) -> Option<&'t str>;

    /// First observation (in recognizer order) that matches.
    fn find(&self, observations: &ObservationSet) -> Option<FieldMatch> {
        observations.iter().find_map(|o| {
            self.match_line(&o.text)
                .map(|value| FieldMatch::new(self.role(), value, o.confidence))
        })
    }
}
