//! Label data model: recognized observations and the fields pulled from them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One recognized line of text and the recognizer's confidence in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Recognized text, already trimmed by the recognizer.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl Observation {
    /// Create an observation. Confidence is clamped into `[0, 1]`; NaN becomes 0.
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Ordered observations for one label image.
///
/// Order is the recognizer's and is significant: field rules take the first
/// matching line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationSet {
    observations: Vec<Observation>,
}

impl ObservationSet {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Multi-line listing of every observation, for terminal reports.
    pub fn describe(&self) -> String {
        if self.observations.is_empty() {
            return "  (no text recognized)".to_string();
        }
        self.observations
            .iter()
            .map(|o| format!("  {} (confidence: {:.2})", o.text, o.confidence))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Single-line `text:conf | text:conf` form used in the audit log.
    pub fn compact(&self) -> String {
        self.observations
            .iter()
            .map(|o| format!("{}:{:.2}", o.text, o.confidence))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl From<Vec<Observation>> for ObservationSet {
    fn from(observations: Vec<Observation>) -> Self {
        Self::new(observations)
    }
}

impl FromIterator<Observation> for ObservationSet {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ObservationSet {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// The three identifier fields printed on a slide label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldRole {
    /// Study sample number, `NN-NNN` at the start of a line.
    SampleId,
    /// Stain or marker name, a whole line of `[A-Za-z0-9-]{3,}`.
    Marker,
    /// Pathology case number, `NP-` followed by digits.
    CaseId,
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRole::SampleId => write!(f, "SampleID"),
            FieldRole::Marker => write!(f, "Marker"),
            FieldRole::CaseId => write!(f, "CaseID"),
        }
    }
}

/// A field value found in one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    /// Matched text.
    pub value: String,
    /// Confidence of the observation it came from.
    pub confidence: f32,
    /// Which field this is.
    pub role: FieldRole,
}

impl FieldMatch {
    pub fn new(role: FieldRole, value: impl Into<String>, confidence: f32) -> Self {
        Self {
            value: value.into(),
            confidence,
            role,
        }
    }
}

/// All three fields, resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelFields {
    pub sample_id: FieldMatch,
    pub marker: FieldMatch,
    pub case_id: FieldMatch,
}

impl LabelFields {
    /// Confidences in SampleID, Marker, CaseID order.
    pub fn confidences(&self) -> [f32; 3] {
        [
            self.sample_id.confidence,
            self.marker.confidence,
            self.case_id.confidence,
        ]
    }
}

/// Suggested name and gate result for one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameDecision {
    /// `{sample}_{marker}_{case}.mrxs`.
    pub suggested_name: String,
    /// SampleID, Marker, CaseID confidences.
    pub confidences: [f32; 3],
    /// True when any confidence is below the threshold.
    pub low_confidence: bool,
}

impl RenameDecision {
    /// Confidences as `0.92;0.88;0.91`.
    pub fn confidences_str(&self) -> String {
        format_confidences(&self.confidences)
    }
}

/// Semicolon-joined, two-decimal rendering of field confidences.
pub fn format_confidences(confidences: &[f32]) -> String {
    confidences
        .iter()
        .map(|c| format!("{:.2}", c))
        .collect::<Vec<_>>()
        .join(";")
}
