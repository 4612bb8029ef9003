use crate::error::{Result, UnprotectError};
use crate::package::SourceFile;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::result::ZipError;

/// Per-file scratch directory holding the extracted package tree, the repacked
/// archive and, when no backup is kept, the displaced original.
///
/// The directory is removed when the value is dropped, so an aborted batch never
/// leaves a working tree behind.
pub struct ScratchSpace {
    dir: Option<TempDir>,
    extraction_root: PathBuf,
    extension: String,
}

impl ScratchSpace {
    /// Create `<scratch_root>/<timestamp>-<random>/` and reserve `<stem>` inside it.
    pub fn create(scratch_root: &Path, source: &SourceFile) -> Result<Self> {
        let creation_error = |e: std::io::Error| UnprotectError::Extraction {
            path: source.path.display().to_string(),
            source: ZipError::Io(e),
        };

        fs::create_dir_all(scratch_root).map_err(creation_error)?;

        let token = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", token))
            .tempdir_in(scratch_root)
            .map_err(creation_error)?;

        let extraction_root = dir.path().join(&source.stem);

        Ok(Self {
            dir: Some(dir),
            extraction_root,
            extension: source.extension.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        self.extraction_root
            .parent()
            .unwrap_or(&self.extraction_root)
    }

    pub fn extraction_root(&self) -> &Path {
        &self.extraction_root
    }

    /// `<extraction-root>.<extension>`
    pub fn repacked_archive_path(&self) -> PathBuf {
        self.sibling_of_root(&self.extension)
    }

    /// `<extraction-root>.backup`, deleted together with the scratch directory.
    pub fn discarded_backup_path(&self) -> PathBuf {
        self.sibling_of_root("backup")
    }

    fn sibling_of_root(&self, extension: &str) -> PathBuf {
        let mut path = OsString::from(self.extraction_root.as_os_str());
        path.push(".");
        path.push(extension);
        PathBuf::from(path)
    }

    /// Recursively delete the scratch directory.
    pub fn cleanup(mut self) -> Result<()> {
        if let Some(dir) = self.dir.take() {
            dir.close()?;
        }
        Ok(())
    }

    /// Keep the scratch directory on disk and return its location.
    pub fn retain(mut self) -> PathBuf {
        match self.dir.take() {
            Some(dir) => dir.keep(),
            None => self.path().to_path_buf(),
        }
    }
}
