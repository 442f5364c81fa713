//! Text recognition collaborators.
//!
//! The core never decodes or recognizes text itself. It loads the label
//! image, hands it to a [`Recognizer`], and gets back a complete
//! [`ObservationSet`] in reading order (or a single failure).

#[cfg(feature = "native")]
mod pure_engine;
mod transcript;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;
pub use transcript::TranscriptRecognizer;

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

use crate::error::RecognitionError;
use crate::models::label::{Observation, ObservationSet};

/// A decoded label image and where it came from.
pub struct LabelImage {
    pub path: PathBuf,
    pub image: DynamicImage,
}

impl LabelImage {
    /// Read and decode an image file.
    pub fn open(path: &Path) -> Result<Self, image::ImageError> {
        let image = image::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            image,
        })
    }

    /// File name of the image, e.g. `slide01_label.png`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without extension.
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Trait for text recognition engines.
///
/// Implementations block until recognition completes. Recognizing nothing is
/// a success with an empty set, not an error.
pub trait Recognizer {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognize every text line on the label.
    fn recognize(&self, label: &LabelImage) -> Result<ObservationSet, RecognitionError>;
}

/// Stand-in used when no engine could be created; every call fails with the cause.
#[derive(Debug, Clone)]
pub struct UnavailableRecognizer {
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Recognizer for UnavailableRecognizer {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn recognize(&self, _label: &LabelImage) -> Result<ObservationSet, RecognitionError> {
        Err(RecognitionError::Unavailable(self.reason.clone()))
    }
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Sort boxes by reading order (top-to-bottom, left-to-right).
pub fn sort_by_reading_order(boxes: &mut [TextBox]) {
    boxes.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();

        // Group by approximate vertical position (within 20 pixels)
        let row_a = (ay / 20.0) as i32;
        let row_b = (by / 20.0) as i32;

        if row_a != row_b {
            row_a.cmp(&row_b)
        } else {
            ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
        }
    });
}

/// Turn ordered boxes into observations, trimming text and dropping blank boxes.
pub fn boxes_to_observations(boxes: &[TextBox]) -> ObservationSet {
    boxes
        .iter()
        .filter_map(|b| {
            let text = b.text.trim();
            (!text.is_empty()).then(|| Observation::new(text, b.confidence))
        })
        .collect()
}
