//! Subcommands and the setup they share.

pub mod apply;
pub mod batch;
pub mod config;
pub mod rename;
pub mod scan;

use std::path::{Path, PathBuf};

use console::style;
use tracing::{debug, warn};

use labelmv_core::models::config::LabelmvConfig;
use labelmv_core::models::label::RenameDecision;
use labelmv_core::ocr::{PureOcrEngine, Recognizer, TranscriptRecognizer, UnavailableRecognizer};

/// `<config dir>/labelmv/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("labelmv")
        .join("config.json")
}

/// Explicit `--config` file, else the default file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<LabelmvConfig> {
    if let Some(path) = config_path {
        let path = Path::new(path);
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(LabelmvConfig::from_file(path)?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config {}", default_path.display());
        Ok(LabelmvConfig::from_file(&default_path)?)
    } else {
        Ok(LabelmvConfig::default())
    }
}

/// Transcript replay when given, otherwise the ONNX engine.
///
/// An engine that cannot be loaded is replaced by one that fails every
/// item with the load error.
pub fn build_recognizer(
    config: &LabelmvConfig,
    transcript: Option<&Path>,
    model_dir: Option<&Path>,
) -> anyhow::Result<Box<dyn Recognizer>> {
    if let Some(path) = transcript {
        if !path.exists() {
            anyhow::bail!("Transcript not found: {}", path.display());
        }
        let recognizer = TranscriptRecognizer::from_file(path)?;
        if recognizer.is_empty() {
            warn!("Transcript {} has no image sections", path.display());
        }
        return Ok(Box::new(recognizer));
    }

    let model_dir = model_dir.unwrap_or(&config.ocr.model_dir);
    match PureOcrEngine::from_dir(model_dir, &config.ocr) {
        Ok(engine) => Ok(Box::new(engine)),
        Err(e) => {
            warn!("OCR engine unavailable: {}", e);
            Ok(Box::new(UnavailableRecognizer::new(e.to_string())))
        }
    }
}

/// `0.92;0.88;0.91` with anything under the threshold highlighted.
pub fn styled_confidences(decision: &RenameDecision) -> String {
    decision
        .confidences
        .iter()
        .map(|c| {
            let text = format!("{:.2}", c);
            if *c < labelmv_core::CONFIDENCE_THRESHOLD {
                style(text).red().to_string()
            } else {
                style(text).green().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}
