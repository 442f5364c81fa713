//! Batch audit log: one CSV row per processed label.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuditError;
use crate::models::label::format_confidences;

/// Column names, in order.
pub const HEADER: [&str; 7] = [
    "LabelImage",
    "SampleID",
    "Marker",
    "CaseID",
    "Confidences",
    "Outcome",
    "ErrorDetail",
];

/// Outcome column values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Renamed,
    MissingCounterpart,
    LoadFailed,
    RecognitionFailed,
    ExtractionFailed,
    RenameFailed,
}

impl Outcome {
    pub const ALL: [Outcome; 6] = [
        Outcome::Renamed,
        Outcome::MissingCounterpart,
        Outcome::LoadFailed,
        Outcome::RecognitionFailed,
        Outcome::ExtractionFailed,
        Outcome::RenameFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Renamed => "Renamed",
            Outcome::MissingCounterpart => "MissingCounterpart",
            Outcome::LoadFailed => "LoadFailed",
            Outcome::RecognitionFailed => "RecognitionFailed",
            Outcome::ExtractionFailed => "ExtractionFailed",
            Outcome::RenameFailed => "RenameFailed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Outcome::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| format!("unknown outcome {:?}", s))
    }
}

/// One audit log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Label image file name.
    pub label_file: String,
    pub sample_id: Option<String>,
    pub marker: Option<String>,
    pub case_id: Option<String>,
    /// SampleID, Marker, CaseID confidences when extraction succeeded.
    pub confidences: Option<[f32; 3]>,
    pub outcome: Outcome,
    pub error_detail: Option<String>,
}

impl BatchRecord {
    /// A record with only the label and outcome filled in.
    pub fn new(label_file: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            label_file: label_file.into(),
            sample_id: None,
            marker: None,
            case_id: None,
            confidences: None,
            outcome,
            error_detail: None,
        }
    }

    pub fn with_error(mut self, detail: impl Into<String>) -> Self {
        self.error_detail = Some(detail.into());
        self
    }

    fn to_row(&self) -> [String; 7] {
        [
            self.label_file.clone(),
            self.sample_id.clone().unwrap_or_default(),
            self.marker.clone().unwrap_or_default(),
            self.case_id.clone().unwrap_or_default(),
            self.confidences
                .map(|c| format_confidences(&c))
                .unwrap_or_default(),
            self.outcome.to_string(),
            self.error_detail.clone().unwrap_or_default(),
        ]
    }

    fn from_row(row: usize, record: &csv::StringRecord) -> Result<Self, AuditError> {
        let malformed = |reason: String| AuditError::Malformed { row, reason };

        if record.len() != HEADER.len() {
            return Err(malformed(format!(
                "expected {} columns, found {}",
                HEADER.len(),
                record.len()
            )));
        }

        let cell = |i: usize| {
            let value = &record[i];
            (!value.is_empty()).then(|| value.to_string())
        };

        let confidences = match cell(4) {
            Some(raw) => Some(parse_confidences(&raw).map_err(malformed)?),
            None => None,
        };

        Ok(Self {
            label_file: record[0].to_string(),
            sample_id: cell(1),
            marker: cell(2),
            case_id: cell(3),
            confidences,
            outcome: record[5].parse().map_err(malformed)?,
            error_detail: cell(6),
        })
    }
}

fn parse_confidences(raw: &str) -> Result<[f32; 3], String> {
    let values = raw
        .split(';')
        .map(|v| v.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("bad confidence in {:?}: {}", raw, e))?;

    <[f32; 3]>::try_from(values)
        .map_err(|v| format!("expected 3 confidences, found {}", v.len()))
}

/// Append-only writer; every record is flushed as soon as it is written.
pub struct AuditLog<W: Write = File> {
    writer: csv::Writer<W>,
}

impl AuditLog<File> {
    /// Create (or truncate) the log file and write the header.
    pub fn create(path: &Path) -> Result<Self, AuditError> {
        let log = Self::from_writer(File::create(path)?)?;
        debug!("Audit log created at {}", path.display());
        Ok(log)
    }
}

impl<W: Write> AuditLog<W> {
    /// Write the header to `inner` and log into it.
    pub fn from_writer(inner: W) -> Result<Self, AuditError> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn append(&mut self, record: &BatchRecord) -> Result<(), AuditError> {
        self.writer.write_record(record.to_row())?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Read a log back into records.
pub fn read_records(path: &Path) -> Result<Vec<BatchRecord>, AuditError> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .records()
        .enumerate()
        .map(|(i, record)| BatchRecord::from_row(i + 1, &record?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn renamed() -> BatchRecord {
        BatchRecord {
            label_file: "slide01_label.png".to_string(),
            sample_id: Some("12-345".to_string()),
            marker: Some("CD3".to_string()),
            case_id: Some("NP-102".to_string()),
            confidences: Some([0.92, 0.88, 0.91]),
            outcome: Outcome::Renamed,
            error_detail: None,
        }
    }

    #[test]
    fn test_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");

        let mut log = AuditLog::create(&path).unwrap();
        log.append(&renamed()).unwrap();
        log.append(&BatchRecord::new("b.png", Outcome::MissingCounterpart))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "LabelImage,SampleID,Marker,CaseID,Confidences,Outcome,ErrorDetail",
                "slide01_label.png,12-345,CD3,NP-102,0.92;0.88;0.91,Renamed,",
                "b.png,,,,,MissingCounterpart,",
            ]
        );
    }

    #[test]
    fn test_round_trip_with_quoting_and_empty_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");

        let records = vec![
            renamed(),
            BatchRecord::new("odd, \"name\".png", Outcome::ExtractionFailed)
                .with_error("missing required fields: Marker, CaseID"),
            BatchRecord::new("c.png", Outcome::RenameFailed)
                .with_error("destination already exists:\nline two"),
        ];

        let mut log = AuditLog::create(&path).unwrap();
        for record in &records {
            log.append(record).unwrap();
        }
        drop(log);

        assert_eq!(read_records(&path).unwrap(), records);
    }

    #[test]
    fn test_create_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "old contents\nmore\n").unwrap();

        AuditLog::create(&path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "LabelImage,SampleID,Marker,CaseID,Confidences,Outcome,ErrorDetail\n"
        );
        assert!(read_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_from_writer() {
        let mut log = AuditLog::from_writer(Vec::new()).unwrap();
        log.append(&BatchRecord::new("b.png", Outcome::MissingCounterpart))
            .unwrap();

        let bytes = log.writer.into_inner().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "LabelImage,SampleID,Marker,CaseID,Confidences,Outcome,ErrorDetail\n\
             b.png,,,,,MissingCounterpart,\n"
        );
    }

    #[test]
    fn test_malformed_outcome() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(
            &path,
            "LabelImage,SampleID,Marker,CaseID,Confidences,Outcome,ErrorDetail\na.png,,,,,Exploded,\n",
        )
        .unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(matches!(err, AuditError::Malformed { row: 1, .. }));
    }

    #[test]
    fn test_outcome_parse() {
        for outcome in Outcome::ALL {
            assert_eq!(outcome.to_string().parse::<Outcome>().unwrap(), outcome);
        }
        assert!("renamed".parse::<Outcome>().is_err());
    }
}
