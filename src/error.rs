use thiserror::Error;
use zip::result::ZipError;

/// Prefix shown ahead of any failure that halts a batch.
pub const BATCH_FAILURE_PREFIX: &str = "An error occurred while trying to unprotect the files.";

#[derive(Error, Debug)]
pub enum UnprotectError {
    #[error("Invalid file path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Unsupported document format '{extension}': {path}")]
    UnsupportedFormat { path: String, extension: String },

    #[error("Failed to extract {path}: {source}")]
    Extraction {
        path: String,
        #[source]
        source: ZipError,
    },

    #[error("Failed to patch {path}: {source}")]
    Patch {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to repackage {path}: {source}")]
    Repack {
        path: String,
        #[source]
        source: ZipError,
    },

    #[error("Failed to save {path}: {message}")]
    Swap {
        path: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for UnprotectError {
    fn user_message(&self) -> String {
        format!("{}\n{}", BATCH_FAILURE_PREFIX, self)
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            UnprotectError::InvalidPath { .. } => Some(
                "Pass the full path of each document, including its extension (e.g., ~/Documents/report.docx).".to_string()
            ),
            UnprotectError::UnsupportedFormat { .. } => Some(
                "Only .docx, .docm, .pptx, .pptm, .xlsx and .xlsm files are supported. Check the [formats] section of your configuration.".to_string()
            ),
            UnprotectError::Extraction { .. } => Some(
                "The file is not a readable Office Open XML package. Legacy .doc/.xls/.ppt files and encrypted documents cannot be processed.".to_string()
            ),
            UnprotectError::Patch { .. } => Some(
                "The document does not contain the expected parts. It may have been produced by an unsupported application.".to_string()
            ),
            UnprotectError::Repack { .. } => Some(
                "Ensure the temporary directory is writable and has enough free space, or choose another with --temp-dir.".to_string()
            ),
            UnprotectError::Swap { .. } => Some(
                "Close the document in any application that has it open and check write permissions for its folder.".to_string()
            ),
            UnprotectError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            UnprotectError::Io(_) => None,
        }
    }
}

impl From<toml::de::Error> for UnprotectError {
    fn from(error: toml::de::Error) -> Self {
        UnprotectError::Config {
            message: error.to_string(),
        }
    }
}

impl From<regex::Error> for UnprotectError {
    fn from(error: regex::Error) -> Self {
        UnprotectError::Config {
            message: format!("Invalid protection pattern: {}", error),
        }
    }
}

pub type Result<T> = std::result::Result<T, UnprotectError>;
