//! Case number (`NP-<digits>`) matching.

use super::patterns::CASE_ID;
use super::FieldRule;
use crate::models::label::FieldRole;

/// Matches `NP-` followed by digits anywhere in a line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseIdRule;

impl FieldRule for CaseIdRule {
    fn role(&self) -> FieldRole {
        FieldRole::CaseId
    }

    fn match_line<'t>(&self, text: &'t str) -> Option<&'t str> {
        CASE_ID.find(text).map(|m| m.as_str())
    }
}
