use crate::error::{Result, UnprotectError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The OOXML document families the tool knows how to unprotect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    WordProcessing,
    Presentation,
    Spreadsheet,
}

impl DocumentKind {
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] =
        &["docx", "docm", "pptx", "pptm", "xlsx", "xlsm"];

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "docx" | "docm" => Some(DocumentKind::WordProcessing),
            "pptx" | "pptm" => Some(DocumentKind::Presentation),
            "xlsx" | "xlsm" => Some(DocumentKind::Spreadsheet),
            _ => None,
        }
    }

    pub fn is_word_processing(self) -> bool {
        matches!(self, DocumentKind::WordProcessing)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocumentKind::WordProcessing => "document",
            DocumentKind::Presentation => "presentation",
            DocumentKind::Spreadsheet => "workbook",
        };
        f.write_str(label)
    }
}

/// A document selected for processing, with the path pieces every later step needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub name: String,
    pub stem: String,
    pub extension: String,
    pub parent: PathBuf,
}

impl SourceFile {
    /// Split `path` into name, stem, extension and parent directory.
    ///
    /// The extension is the last dot-separated segment of the file name and the stem
    /// is everything before it, so `report.final.docx` has stem `report.final`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: &str| UnprotectError::InvalidPath {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };

        let name = path
            .file_name()
            .ok_or_else(|| invalid("missing file name"))?
            .to_str()
            .ok_or_else(|| invalid("file name is not valid UTF-8"))?
            .to_string();

        let (stem, extension) = name
            .rsplit_once('.')
            .ok_or_else(|| invalid("missing file extension"))?;

        if extension.is_empty() {
            return Err(invalid("missing file extension"));
        }
        if stem.is_empty() {
            return Err(invalid("missing file name before the extension"));
        }

        let parent = match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
            Some(parent) => parent.to_path_buf(),
            None => return Err(invalid("no parent directory")),
        };

        Ok(Self {
            path: path.to_path_buf(),
            stem: stem.to_string(),
            extension: extension.to_string(),
            name,
            parent,
        })
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_extension(&self.extension)
    }

    /// `<parent>/<stem><suffix>.<extension>`, where a retained backup is written.
    pub fn backup_path(&self, suffix: &str) -> PathBuf {
        self.parent
            .join(format!("{}{}.{}", self.stem, suffix, self.extension))
    }
}
