//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::RecognitionError;
use crate::models::config::OcrConfig;
use crate::models::label::ObservationSet;

use super::{boxes_to_observations, sort_by_reading_order, LabelImage, Recognizer, TextBox};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl PureOcrEngine {
    /// Create an engine from the model files named in `config` inside `model_dir`.
    pub fn from_dir(model_dir: &Path, config: &OcrConfig) -> Result<Self, RecognitionError> {
        let [det_path, rec_path, dict_path] = config.model_paths(model_dir);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(RecognitionError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| RecognitionError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self {
            engine,
            keep_unk: config.keep_unk,
        })
    }
}

impl Recognizer for PureOcrEngine {
    fn name(&self) -> &str {
        "pure-onnx-ocr"
    }

    fn recognize(&self, label: &LabelImage) -> Result<ObservationSet, RecognitionError> {
        let start = Instant::now();
        let (width, height) = label.dimensions();

        debug!("Recognizing {} ({}x{})", label.path.display(), width, height);

        let results = self
            .engine
            .run_from_image(&label.image)
            .map_err(|e| RecognitionError::Engine(format!("pure-onnx-ocr: {}", e)))?;

        let mut text_boxes: Vec<TextBox> = results
            .iter()
            .map(|r| {
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                TextBox {
                    bbox: polygon_to_bbox(&r.bounding_box),
                    text,
                    confidence: r.confidence,
                }
            })
            .collect();

        sort_by_reading_order(&mut text_boxes);
        let observations = boxes_to_observations(&text_boxes);

        info!(
            "OCR complete: {} lines in {}ms",
            observations.len(),
            start.elapsed().as_millis()
        );

        Ok(observations)
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
///
/// Extracts the first 4 exterior points (quadrilateral) as
/// `[x1, y1, x2, y2, x3, y3, x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
