use crate::package::{DocumentKind, PatchSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Explicit input for one batch: which files, and whether originals are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnprotectRequest {
    pub files: Vec<PathBuf>,
    pub keep_backup: bool,
}

impl UnprotectRequest {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            files: files.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
            keep_backup: false,
        }
    }

    pub fn with_backup(mut self, keep_backup: bool) -> Self {
        self.keep_backup = keep_backup;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub name: String,
    pub kind: DocumentKind,
    pub entries: usize,
    pub removed: PatchSummary,
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
    pub keep_backup: bool,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl BatchReport {
    pub fn files_processed(&self) -> usize {
        self.files.len()
    }

    pub fn elements_removed(&self) -> usize {
        self.files.iter().map(|f| f.removed.total()).sum()
    }

    pub fn backups_written(&self) -> usize {
        self.files.iter().filter(|f| f.backup_path.is_some()).count()
    }

    /// Files that carried no protection element at all.
    pub fn already_unprotected(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.removed.total() == 0)
    }
}

/// Accumulates outcomes while a batch runs.
#[derive(Debug)]
pub(crate) struct BatchProgress {
    started_at: DateTime<Utc>,
    start_time: Instant,
    keep_backup: bool,
    files: Vec<FileOutcome>,
}

impl BatchProgress {
    pub(crate) fn new(keep_backup: bool) -> Self {
        Self {
            started_at: Utc::now(),
            start_time: Instant::now(),
            keep_backup,
            files: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, outcome: FileOutcome) {
        self.files.push(outcome);
    }

    pub(crate) fn finish(self) -> BatchReport {
        BatchReport {
            files: self.files,
            keep_backup: self.keep_backup,
            started_at: self.started_at,
            duration: self.start_time.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, removed: PatchSummary, backup: Option<&str>) -> FileOutcome {
        FileOutcome {
            path: PathBuf::from("/docs").join(name),
            name: name.to_string(),
            kind: DocumentKind::WordProcessing,
            entries: 5,
            removed,
            backup_path: backup.map(PathBuf::from),
        }
    }

    #[test]
    fn test_request_builder() {
        let request = UnprotectRequest::new(["/docs/a.docx", "/docs/b.xlsx"]).with_backup(true);
        assert_eq!(request.files.len(), 2);
        assert!(request.keep_backup);
    }

    #[test]
    fn test_report_totals() {
        let mut progress = BatchProgress::new(true);
        progress.record(outcome(
            "a.docx",
            PatchSummary {
                doc_security_removed: 1,
                document_protection_removed: 1,
            },
            Some("/docs/a-backup.docx"),
        ));
        progress.record(outcome("b.docx", PatchSummary::default(), None));

        let report = progress.finish();
        assert_eq!(report.files_processed(), 2);
        assert_eq!(report.elements_removed(), 2);
        assert_eq!(report.backups_written(), 1);
        assert_eq!(
            report.already_unprotected().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["b.docx"]
        );
    }

    #[test]
    fn test_report_serializes() {
        let report = BatchProgress::new(false).finish();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["keep_backup"], false);
        assert!(json["files"].as_array().unwrap().is_empty());
    }
}
