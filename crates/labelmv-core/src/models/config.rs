//! Configuration structures for recognition, batch discovery, and renaming.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::LabelmvError;

/// Main configuration for labelmv.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelmvConfig {
    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Batch discovery and audit log configuration.
    pub batch: BatchConfig,

    /// Rename behaviour.
    pub rename: RenameConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Paths of the detection model, recognition model and dictionary.
    pub fn model_paths(&self, model_dir: &Path) -> [PathBuf; 3] {
        [
            model_dir.join(&self.detection_model),
            model_dir.join(&self.recognition_model),
            model_dir.join(&self.dictionary),
        ]
    }
}

/// Batch discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Label image extensions picked up from the label directory (case-insensitive).
    pub image_extensions: Vec<String>,

    /// Suffix stripped from a label stem when no target matches the full stem.
    pub label_suffix: Option<String>,

    /// Audit log file name, created inside the label directory.
    pub log_file_name: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            image_extensions: ["png", "jpg", "jpeg", "tif", "tiff", "bmp"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            label_suffix: Some("_label".to_string()),
            log_file_name: "ocr_batch_log.csv".to_string(),
        }
    }
}

impl BatchConfig {
    /// Whether a path carries one of the configured image extensions.
    pub fn is_label_image(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        !ext.is_empty() && self.image_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }
}

/// Rename behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Move the `<stem>/` data directory alongside the `.mrxs` file.
    pub move_companion_dir: bool,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            move_companion_dir: true,
        }
    }
}

impl LabelmvConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, LabelmvError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| LabelmvError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), LabelmvError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LabelmvConfig =
            serde_json::from_str(r#"{"batch": {"log_file_name": "run.csv"}}"#).unwrap();

        assert_eq!(config.batch.log_file_name, "run.csv");
        assert_eq!(config.batch.label_suffix.as_deref(), Some("_label"));
        assert_eq!(config.ocr.detection_model, "det.onnx");
        assert!(config.rename.move_companion_dir);
    }

    #[test]
    fn test_is_label_image() {
        let batch = BatchConfig::default();
        assert!(batch.is_label_image(Path::new("a/slide_label.PNG")));
        assert!(batch.is_label_image(Path::new("slide.tiff")));
        assert!(!batch.is_label_image(Path::new("slide.mrxs")));
        assert!(!batch.is_label_image(Path::new("ocr_batch_log.csv")));
        assert!(!batch.is_label_image(Path::new("noext")));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = LabelmvConfig::default();
        config.rename.move_companion_dir = false;
        config.save(&path).unwrap();

        let loaded = LabelmvConfig::from_file(&path).unwrap();
        assert!(!loaded.rename.move_companion_dir);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            LabelmvConfig::from_file(&path),
            Err(LabelmvError::Config(_))
        ));
    }
}
