//! Helpers for building small OOXML packages in tests.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const WORD_ENTRIES: &[(&str, &str)] = &[
    ("[Content_Types].xml", "<Types/>"),
    ("_rels/.rels", "<Relationships/>"),
    (
        "docProps/app.xml",
        "<Properties><Template>Normal.dotm</Template><DocSecurity>2</DocSecurity><Pages>1</Pages></Properties>",
    ),
    ("word/document.xml", "<w:document><w:body/></w:document>"),
    (
        "word/settings.xml",
        r#"<w:settings><w:zoom w:percent="100"/><w:documentProtection w:edit="readOnly" w:enforcement="1"/></w:settings>"#,
    ),
];

pub const WORKBOOK_ENTRIES: &[(&str, &str)] = &[
    ("[Content_Types].xml", "<Types/>"),
    (
        "docProps/app.xml",
        "<Properties><Application>Microsoft Excel</Application><DocSecurity>4</DocSecurity></Properties>",
    ),
    ("xl/workbook.xml", "<workbook/>"),
];

pub fn write_package(path: &Path, entries: &[(&str, &str)]) -> zip::result::ZipResult<()> {
    let mut writer = ZipWriter::new(File::create(path)?);

    for (name, contents) in entries {
        let options =
            FileOptions::<'_, ()>::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(name.to_string(), options)?;
        writer.write_all(contents.as_bytes())?;
    }

    writer.finish()?;
    Ok(())
}

/// File entries of the package at `path`, keyed by entry name.
pub fn read_package(path: &Path) -> zip::result::ZipResult<BTreeMap<String, Vec<u8>>> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut entries = BTreeMap::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        entries.insert(entry.name().to_string(), contents);
    }

    Ok(entries)
}

pub fn read_part(path: &Path, part: &str) -> zip::result::ZipResult<String> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut contents = String::new();
    archive.by_name(part)?.read_to_string(&mut contents)?;
    Ok(contents)
}
