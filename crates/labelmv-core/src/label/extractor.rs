//! Combines the three field rules into a label extraction.

use tracing::debug;

use crate::error::ExtractionError;
use crate::models::label::{FieldRole, LabelFields, ObservationSet};

use super::rules::{CaseIdRule, FieldRule, MarkerRule, SampleIdRule};
use super::{LabelExtractor, Result};

/// Rule-based extractor: every field must resolve, or the label fails as a whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleExtractor {
    sample_id: SampleIdRule,
    marker: MarkerRule,
    case_id: CaseIdRule,
}

impl RuleExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LabelExtractor for RuleExtractor {
    fn extract(&self, observations: &ObservationSet) -> Result<LabelFields> {
        let sample_id = self.sample_id.find(observations);
        let marker = self.marker.find(observations);
        let case_id = self.case_id.find(observations);

        match (sample_id, marker, case_id) {
            (Some(sample_id), Some(marker), Some(case_id)) => {
                debug!(
                    "Extracted {} / {} / {}",
                    sample_id.value, marker.value, case_id.value
                );
                Ok(LabelFields {
                    sample_id,
                    marker,
                    case_id,
                })
            }
            (sample_id, marker, case_id) => {
                let missing: Vec<FieldRole> = [
                    (FieldRole::SampleId, sample_id.is_none()),
                    (FieldRole::Marker, marker.is_none()),
                    (FieldRole::CaseId, case_id.is_none()),
                ]
                .into_iter()
                .filter_map(|(role, absent)| absent.then_some(role))
                .collect();

                debug!(
                    "Extraction incomplete over {} lines, missing {:?}",
                    observations.len(),
                    missing
                );
                Err(ExtractionError::MissingFields(missing))
            }
        }
    }
}
