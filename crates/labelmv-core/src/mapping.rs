//! Rename mappings: JSON export after a batch, CSV sheets applied later.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::batch::BatchSummary;
use crate::error::{RenameError, Result};
use crate::rename::{validate_file_name, RenameExecutor, RenamedPaths};

/// Original file name to new file name for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameMapping {
    pub generated_at: DateTime<Utc>,
    pub label_dir: PathBuf,
    pub target_dir: PathBuf,
    pub renames: BTreeMap<String, String>,
}

impl RenameMapping {
    pub fn from_summary(label_dir: &Path, target_dir: &Path, summary: &BatchSummary) -> Self {
        Self {
            generated_at: Utc::now(),
            label_dir: label_dir.to_path_buf(),
            target_dir: target_dir.to_path_buf(),
            renames: summary
                .renames
                .iter()
                .map(|r| (r.original.clone(), r.renamed.clone()))
                .collect(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Wrote {} renames to {}", self.renames.len(), path.display());
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// The renames as sheet rows, e.g. to replay them on a copy of the scans.
    pub fn entries(&self) -> Vec<MappingEntry> {
        self.renames
            .iter()
            .map(|(original, renamed)| MappingEntry {
                original: original.clone(),
                renamed: renamed.clone(),
            })
            .collect()
    }
}

/// One row of a rename sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(rename = "Original File Name")]
    pub original: String,
    #[serde(rename = "New File Name")]
    pub renamed: String,
}

/// Read a CSV rename sheet. Extra columns are ignored, blank rows dropped.
pub fn read_sheet(path: &Path) -> Result<Vec<MappingEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let mut entries = Vec::new();
    for row in reader.deserialize() {
        let entry: MappingEntry = row?;
        if entry.original.is_empty() || entry.renamed.is_empty() {
            warn!("Skipping incomplete row: {:?}", entry);
            continue;
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Result of applying one sheet row.
#[derive(Debug)]
pub struct AppliedRow {
    pub entry: MappingEntry,
    pub result: std::result::Result<RenamedPaths, RenameError>,
}

/// Rename every entry inside `target_dir`. Failed rows do not stop the rest.
///
/// Both names must be bare file names; rows pointing outside `target_dir`
/// fail with [`RenameError::InvalidName`].
pub fn apply_mapping(
    entries: &[MappingEntry],
    target_dir: &Path,
    executor: &RenameExecutor,
) -> Vec<AppliedRow> {
    entries
        .iter()
        .map(|entry| {
            let result = validate_file_name(&entry.original).and_then(|()| {
                executor.rename(target_dir, &target_dir.join(&entry.original), &entry.renamed)
            });
            if let Err(e) = &result {
                warn!("{} not renamed: {}", entry.original, e);
            }
            AppliedRow {
                entry: entry.clone(),
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::RenamedFile;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_mapping_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mapping.json");

        let mut mapping = RenameMapping {
            generated_at: Utc::now(),
            label_dir: PathBuf::from("labels"),
            target_dir: PathBuf::from("slides"),
            renames: BTreeMap::new(),
        };
        mapping
            .renames
            .insert("a.mrxs".to_string(), "12-345_CD3_NP-102.mrxs".to_string());
        mapping.save(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["renames"]["a.mrxs"], "12-345_CD3_NP-102.mrxs");
        assert_eq!(json["target_dir"], "slides");
        assert!(json["generated_at"].is_string());

        assert_eq!(RenameMapping::from_file(&path).unwrap(), mapping);
    }

    #[test]
    fn test_from_summary_uses_renames() {
        let root = TempDir::new().unwrap();
        let recognizer = crate::ocr::UnavailableRecognizer::new("none");
        let orchestrator =
            crate::batch::BatchOrchestrator::new(&recognizer, &Default::default());
        let mut summary = orchestrator.run(root.path(), root.path(), |_| {}).unwrap();
        summary.renames.push(RenamedFile {
            original: "b.mrxs".to_string(),
            renamed: "x.mrxs".to_string(),
        });

        let mapping = RenameMapping::from_summary(Path::new("l"), Path::new("t"), &summary);
        assert_eq!(mapping.renames.get("b.mrxs").map(String::as_str), Some("x.mrxs"));
    }

    #[test]
    fn test_read_sheet_ignores_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sheet.csv");
        fs::write(
            &path,
            "Original File Name,Label Image,New File Name\n\
             a.mrxs,a_label.png, 12-345_CD3.mrxs \n\
             ,,\n",
        )
        .unwrap();

        let entries = read_sheet(&path).unwrap();
        assert_eq!(
            entries,
            vec![MappingEntry {
                original: "a.mrxs".to_string(),
                renamed: "12-345_CD3.mrxs".to_string(),
            }]
        );
    }

    #[test]
    fn test_apply_mapping_reports_per_row() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.mrxs"), b"a").unwrap();
        fs::write(dir.path().join("b.mrxs"), b"b").unwrap();
        fs::write(dir.path().join("taken.mrxs"), b"t").unwrap();

        let entries = vec![
            MappingEntry {
                original: "a.mrxs".to_string(),
                renamed: "new-a.mrxs".to_string(),
            },
            MappingEntry {
                original: "missing.mrxs".to_string(),
                renamed: "x.mrxs".to_string(),
            },
            MappingEntry {
                original: "b.mrxs".to_string(),
                renamed: "taken.mrxs".to_string(),
            },
        ];

        let rows = apply_mapping(&entries, dir.path(), &RenameExecutor::default());

        assert!(rows[0].result.is_ok());
        assert!(matches!(rows[1].result, Err(RenameError::SourceMissing(_))));
        assert!(matches!(rows[2].result, Err(RenameError::DestinationExists(_))));
        assert!(dir.path().join("new-a.mrxs").exists());
        assert!(dir.path().join("b.mrxs").exists());
    }

    #[test]
    fn test_apply_rejects_paths_outside_target() {
        let root = TempDir::new().unwrap();
        let slides = root.path().join("slides");
        fs::create_dir(&slides).unwrap();
        let outside = root.path().join("outside.mrxs");
        fs::write(&outside, b"o").unwrap();

        let entries = vec![
            MappingEntry {
                original: "../outside.mrxs".to_string(),
                renamed: "stolen.mrxs".to_string(),
            },
            MappingEntry {
                original: outside.to_string_lossy().into_owned(),
                renamed: "stolen.mrxs".to_string(),
            },
        ];

        let rows = apply_mapping(&entries, &slides, &RenameExecutor::default());

        for row in &rows {
            assert!(matches!(row.result, Err(RenameError::InvalidName(_))));
        }
        assert!(outside.exists());
        assert!(!slides.join("stolen.mrxs").exists());
    }

    #[test]
    fn test_saved_mapping_replays_as_entries() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.mrxs"), b"a").unwrap();
        let path = dir.path().join("mapping.json");

        let mapping = RenameMapping {
            generated_at: Utc::now(),
            label_dir: PathBuf::from("labels"),
            target_dir: dir.path().to_path_buf(),
            renames: BTreeMap::from([("a.mrxs".to_string(), "12-345_CD3_NP-102.mrxs".to_string())]),
        };
        mapping.save(&path).unwrap();

        let entries = RenameMapping::from_file(&path).unwrap().entries();
        let rows = apply_mapping(&entries, dir.path(), &RenameExecutor::default());

        assert!(rows[0].result.is_ok());
        assert!(dir.path().join("12-345_CD3_NP-102.mrxs").exists());
    }
}
