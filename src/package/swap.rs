use crate::error::{Result, UnprotectError};
use std::fs;
use std::io;
use std::path::Path;

/// Replace `original` with `replacement`, moving the original to `backup` first.
///
/// Any file already at `backup` is removed. When the replacement cannot be moved
/// into place the original is moved back, so a failed swap leaves the document
/// where it started whenever the filesystem allows it.
pub fn swap_into_place(original: &Path, replacement: &Path, backup: &Path) -> Result<()> {
    match fs::remove_file(backup) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(swap_error(backup, "could not remove the previous backup", e));
        }
    }

    move_file(original, backup).map_err(|e| {
        swap_error(original, "could not move the original to its backup location", e)
    })?;

    if let Err(e) = move_file(replacement, original) {
        let message = match move_file(backup, original) {
            Ok(()) => "could not write the unprotected file; the original was restored".to_string(),
            Err(restore_error) => format!(
                "could not write the unprotected file and restoring the original failed ({}); the original is at {}",
                restore_error,
                backup.display()
            ),
        };
        return Err(UnprotectError::Swap {
            path: original.display().to_string(),
            message,
            source: e,
        });
    }

    Ok(())
}

/// Rename `from` to `to`, falling back to copy-and-delete across filesystems.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}

fn is_cross_device(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::CrossesDevices
}

fn swap_error(path: &Path, message: &str, source: io::Error) -> UnprotectError {
    UnprotectError::Swap {
        path: path.display().to_string(),
        message: message.to_string(),
        source,
    }
}
