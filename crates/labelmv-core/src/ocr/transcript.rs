//! Recognizer that replays a saved recognition transcript.
//!
//! Transcript format:
//!
//! ```text
//! --- slide01_label.png ---
//! [0.92] 12-345
//! [0.88] CD3
//! NP-102
//! ```
//!
//! A header opens a section per image. Every non-empty line below it is one
//! observation; a leading `[confidence]` is optional and lines without one
//! get confidence 0.0.
//!
//! An image without a section of its own matches the first section (by
//! name order) with the same file stem.

use std::collections::BTreeMap;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::RecognitionError;
use crate::models::label::{Observation, ObservationSet};

use super::{LabelImage, Recognizer};

lazy_static! {
    static ref SECTION_HEADER: Regex = Regex::new(r"^--- (.+?) ---$").unwrap();
    static ref SCORED_LINE: Regex = Regex::new(r"^\[([0-9]*\.?[0-9]+)\]\s*(.*)$").unwrap();
}

/// Recognizer backed by a transcript file instead of an OCR model.
#[derive(Debug, Clone, Default)]
pub struct TranscriptRecognizer {
    sections: BTreeMap<String, Vec<Observation>>,
}

impl TranscriptRecognizer {
    /// Load and parse a transcript file.
    pub fn from_file(path: &Path) -> Result<Self, RecognitionError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecognitionError::Transcript(format!("failed to read {}: {}", path.display(), e))
        })?;
        let recognizer = Self::parse(&content);
        debug!(
            "Loaded transcript {} with {} sections",
            path.display(),
            recognizer.sections.len()
        );
        Ok(recognizer)
    }

    /// Parse transcript text.
    pub fn parse(content: &str) -> Self {
        let mut sections: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(caps) = SECTION_HEADER.captures(line) {
                let name = caps[1].trim().to_string();
                if sections.insert(name.clone(), Vec::new()).is_some() {
                    warn!("Transcript section {} repeated, keeping the last one", name);
                }
                current = Some(name);
                continue;
            }

            let Some(name) = current.as_ref() else {
                continue;
            };

            if let Some(observation) = parse_line(line) {
                sections.entry(name.clone()).or_default().push(observation);
            }
        }

        Self { sections }
    }

    /// True when the transcript has no image sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn lookup(&self, file_name: &str, file_stem: &str) -> Option<&Vec<Observation>> {
        if let Some(observations) = self.sections.get(file_name) {
            return Some(observations);
        }
        self.sections.iter().find_map(|(name, observations)| {
            let stem = Path::new(name)
                .file_stem()
                .map(|s| s.to_string_lossy())
                .unwrap_or_default();
            (name == file_stem || stem == file_stem).then_some(observations)
        })
    }
}

fn parse_line(line: &str) -> Option<Observation> {
    let (text, confidence) = match SCORED_LINE.captures(line) {
        Some(caps) => match caps[1].parse::<f32>() {
            Ok(confidence) => (caps[2].trim().to_string(), confidence),
            Err(_) => (line.to_string(), 0.0),
        },
        None => (line.to_string(), 0.0),
    };
    (!text.is_empty()).then(|| Observation::new(text, confidence))
}

impl Recognizer for TranscriptRecognizer {
    fn name(&self) -> &str {
        "transcript"
    }

    fn recognize(&self, label: &LabelImage) -> Result<ObservationSet, RecognitionError> {
        let file_name = label.file_name();
        self.lookup(&file_name, &label.file_stem())
            .map(|observations| ObservationSet::new(observations.clone()))
            .ok_or(RecognitionError::NotInTranscript(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const TRANSCRIPT: &str = "\
stray line before any header
--- slide01_label.png ---
[0.92] 12-345
[0.88]   CD3

NP-102
--- slide02.png ---
--- slide03 ---
[1] 33-333
";

    fn label(name: &str) -> LabelImage {
        LabelImage {
            path: PathBuf::from("labels").join(name),
            image: DynamicImage::new_rgb8(1, 1),
        }
    }

    #[test]
    fn test_parse_sections() {
        let recognizer = TranscriptRecognizer::parse(TRANSCRIPT);
        assert_eq!(recognizer.sections.len(), 3);

        let observations = recognizer.recognize(&label("slide01_label.png")).unwrap();
        let lines: Vec<_> = observations
            .iter()
            .map(|o| (o.text.as_str(), o.confidence))
            .collect();
        assert_eq!(
            lines,
            vec![("12-345", 0.92), ("CD3", 0.88), ("NP-102", 0.0)]
        );
    }

    #[test]
    fn test_empty_section_is_empty_set() {
        let recognizer = TranscriptRecognizer::parse(TRANSCRIPT);
        let observations = recognizer.recognize(&label("slide02.png")).unwrap();
        assert!(observations.is_empty());
    }

    #[test]
    fn test_lookup_by_stem() {
        let recognizer = TranscriptRecognizer::parse(TRANSCRIPT);

        // Header without extension, image with one
        let observations = recognizer.recognize(&label("slide03.tif")).unwrap();
        assert_eq!(observations.len(), 1);

        // Header with .png, image saved as .jpg
        assert!(recognizer.recognize(&label("slide02.jpg")).is_ok());
    }

    #[test]
    fn test_missing_image() {
        let recognizer = TranscriptRecognizer::parse(TRANSCRIPT);
        let err = recognizer.recognize(&label("other.png")).unwrap_err();
        assert!(matches!(err, RecognitionError::NotInTranscript(name) if name == "other.png"));
    }

    #[test]
    fn test_repeated_section_replaced() {
        let recognizer =
            TranscriptRecognizer::parse("--- a.png ---\n[0.5] old\n--- a.png ---\n[0.9] new\n");
        let observations = recognizer.recognize(&label("a.png")).unwrap();
        assert_eq!(observations.compact(), "new:0.90");
    }

    #[test]
    fn test_stem_fallback_is_deterministic() {
        let recognizer = TranscriptRecognizer::parse(
            "--- a.png ---\n[0.9] from png\n--- a.jpg ---\n[0.9] from jpg\n",
        );
        for _ in 0..8 {
            let observations = recognizer.recognize(&label("a.tif")).unwrap();
            assert_eq!(observations.compact(), "from jpg:0.90");
        }
    }
}
