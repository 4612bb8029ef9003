//! Unpacking an OOXML container into a directory tree and packing it back.

use crate::error::{Result, UnprotectError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Part that OOXML consumers expect as the first entry of a package.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Extract every entry of the zip at `source` into `destination`.
///
/// Returns the number of entries written.
pub fn extract_package(source: &Path, destination: &Path) -> Result<usize> {
    extract_entries(source, destination).map_err(|e| UnprotectError::Extraction {
        path: source.display().to_string(),
        source: e,
    })
}

fn extract_entries(source: &Path, destination: &Path) -> std::result::Result<usize, ZipError> {
    let file = File::open(source)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    fs::create_dir_all(destination)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        // Entries that would land outside the extraction root are refused outright
        let relative = entry.enclosed_name().ok_or_else(|| {
            ZipError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsafe entry path in archive: {}", entry.name()),
            ))
        })?;
        let out_path = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out_file = BufWriter::new(File::create(&out_path)?);
        io::copy(&mut entry, &mut out_file)?;
        out_file.flush()?;
    }

    Ok(archive.len())
}

/// Build a new zip at `destination` from every file under `root`.
///
/// Fails if `destination` already exists. Returns the number of entries written.
pub fn repack_package(root: &Path, destination: &Path) -> Result<usize> {
    repack_entries(root, destination).map_err(|e| UnprotectError::Repack {
        path: destination.display().to_string(),
        source: e,
    })
}

fn repack_entries(root: &Path, destination: &Path) -> std::result::Result<usize, ZipError> {
    let entries = collect_entries(root)?;

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    for entry in &entries {
        let options = FileOptions::<'_, ()>::default()
            .compression_method(CompressionMethod::Deflated);

        if entry.is_dir {
            writer.add_directory(entry.name.clone(), options)?;
            continue;
        }

        writer.start_file(entry.name.clone(), options)?;
        let mut source = BufReader::new(File::open(&entry.path)?);
        io::copy(&mut source, &mut writer)?;
    }

    writer.finish()?.flush()?;

    Ok(entries.len())
}

#[derive(Debug)]
struct PackageEntry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Walk `root` and list its files and empty directories as zip entries,
/// `[Content_Types].xml` first and the rest in path order.
fn collect_entries(root: &Path) -> io::Result<Vec<PackageEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let mut name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let is_dir = entry.file_type().is_dir();
        if is_dir {
            // Non-empty directories are implied by the files they contain
            if fs::read_dir(entry.path())?.next().is_some() {
                continue;
            }
            name.push('/');
        }

        entries.push(PackageEntry {
            name,
            path: entry.path().to_path_buf(),
            is_dir,
        });
    }

    entries.sort_by(|a, b| {
        (a.name != CONTENT_TYPES_PART, &a.name).cmp(&(b.name != CONTENT_TYPES_PART, &b.name))
    });

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{read_package, write_package};
    use tempfile::TempDir;

    const ENTRIES: &[(&str, &str)] = &[
        ("_rels/.rels", "<Relationships/>"),
        ("[Content_Types].xml", "<Types/>"),
        ("docProps/app.xml", "<Properties><DocSecurity>2</DocSecurity></Properties>"),
        ("word/document.xml", "<w:document/>"),
        ("word/settings.xml", "<w:settings/>"),
    ];

    #[test]
    fn test_round_trip_preserves_entries() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("report.docx");
        write_package(&source, ENTRIES).unwrap();

        let extracted = temp_dir.path().join("work").join("report");
        assert_eq!(extract_package(&source, &extracted).unwrap(), ENTRIES.len());
        assert!(extracted.join("word").join("settings.xml").is_file());

        let repacked = temp_dir.path().join("work").join("report.docx");
        assert_eq!(repack_package(&extracted, &repacked).unwrap(), ENTRIES.len());

        assert_eq!(read_package(&source).unwrap(), read_package(&repacked).unwrap());
    }

    #[test]
    fn test_content_types_is_first_entry() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("book.xlsx");
        write_package(&source, ENTRIES).unwrap();

        let extracted = temp_dir.path().join("book");
        extract_package(&source, &extracted).unwrap();
        let repacked = temp_dir.path().join("book.repacked.xlsx");
        repack_package(&extracted, &repacked).unwrap();

        let mut archive = ZipArchive::new(File::open(&repacked).unwrap()).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), CONTENT_TYPES_PART);
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("fake.docx");
        fs::write(&source, "definitely not a zip archive").unwrap();

        let result = extract_package(&source, &temp_dir.path().join("fake"));
        assert!(matches!(result, Err(UnprotectError::Extraction { .. })));
    }

    #[test]
    fn test_extract_rejects_entry_outside_root() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("crafted.docx");
        write_package(
            &source,
            &[(CONTENT_TYPES_PART, "<Types/>"), ("../escape.txt", "outside")],
        )
        .unwrap();

        let destination = temp_dir.path().join("a").join("b");
        let result = extract_package(&source, &destination);

        assert!(matches!(result, Err(UnprotectError::Extraction { .. })));
        assert!(!temp_dir.path().join("a").join("escape.txt").exists());
        assert!(!temp_dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_extract_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let result = extract_package(
            &temp_dir.path().join("missing.docx"),
            &temp_dir.path().join("missing"),
        );
        assert!(matches!(result, Err(UnprotectError::Extraction { .. })));
    }

    #[test]
    fn test_repack_refuses_existing_destination() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("tree");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join(CONTENT_TYPES_PART), "<Types/>").unwrap();

        let destination = temp_dir.path().join("tree.docx");
        fs::write(&destination, "existing").unwrap();

        let result = repack_package(&root, &destination);
        assert!(matches!(result, Err(UnprotectError::Repack { .. })));
        assert_eq!(fs::read_to_string(&destination).unwrap(), "existing");
    }

    #[test]
    fn test_empty_directories_are_kept() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("tree");
        fs::create_dir_all(root.join("customXml")).unwrap();
        fs::write(root.join(CONTENT_TYPES_PART), "<Types/>").unwrap();

        let entries = collect_entries(&root).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![CONTENT_TYPES_PART, "customXml/"]);
    }
}
