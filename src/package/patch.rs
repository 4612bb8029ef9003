use crate::error::{Result, UnprotectError};
use crate::package::DocumentKind;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

pub const APP_PROPERTIES_PART: &str = "docProps/app.xml";
pub const WORD_SETTINGS_PART: &str = "word/settings.xml";

// The element body is a plain number, so it can never contain markup.
const DOC_SECURITY_PATTERN: &str = r"<DocSecurity>[^<]*</DocSecurity>";

// Attribute values may hold `>` or `/>` inside quotes; both the self-closing and the
// explicitly closed empty forms are matched.
const DOCUMENT_PROTECTION_PATTERN: &str = concat!(
    r#"<(?:[A-Za-z_][\w.\-]*:)?documentProtection\b"#,
    r#"(?:[^>"']|"[^"]*"|'[^']*')*?"#,
    r#"(?:/>|>\s*</(?:[A-Za-z_][\w.\-]*:)?documentProtection\s*>)"#,
);

/// A package part and the pattern whose matches are cut out of it.
#[derive(Debug, Clone)]
pub struct PatchTarget {
    pub part: &'static str,
    pub element: &'static str,
    pattern: Regex,
}

impl PatchTarget {
    fn new(part: &'static str, element: &'static str, pattern: &str) -> Result<Self> {
        Ok(Self {
            part,
            element,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

/// How many protection elements were removed from one package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSummary {
    pub doc_security_removed: usize,
    pub document_protection_removed: usize,
}

impl PatchSummary {
    pub fn total(&self) -> usize {
        self.doc_security_removed + self.document_protection_removed
    }
}

pub struct ProtectionPatcher {
    doc_security: PatchTarget,
    document_protection: PatchTarget,
}

impl ProtectionPatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            doc_security: PatchTarget::new(
                APP_PROPERTIES_PART,
                "DocSecurity",
                DOC_SECURITY_PATTERN,
            )?,
            document_protection: PatchTarget::new(
                WORD_SETTINGS_PART,
                "w:documentProtection",
                DOCUMENT_PROTECTION_PATTERN,
            )?,
        })
    }

    /// The parts touched for a document of `kind`, in the order they are patched.
    pub fn targets_for(&self, kind: DocumentKind) -> Vec<&PatchTarget> {
        let mut targets = vec![&self.doc_security];
        if kind.is_word_processing() {
            targets.push(&self.document_protection);
        }
        targets
    }

    /// Strip protection elements from the package extracted at `root`.
    pub fn unprotect(&self, root: &Path, kind: DocumentKind) -> Result<PatchSummary> {
        let mut summary = PatchSummary {
            doc_security_removed: patch_part(root, &self.doc_security)?,
            ..PatchSummary::default()
        };

        if kind.is_word_processing() {
            summary.document_protection_removed = patch_part(root, &self.document_protection)?;
        }

        Ok(summary)
    }
}

fn patch_part(root: &Path, target: &PatchTarget) -> Result<usize> {
    let path = target
        .part
        .split('/')
        .fold(root.to_path_buf(), |path, segment| path.join(segment));

    remove_from_file(&path, &target.pattern)
}

/// Delete every match of `pattern` from the text file at `path`, rewriting it in place.
pub fn remove_from_file(path: &Path, pattern: &Regex) -> Result<usize> {
    let patch_error = |e: std::io::Error| UnprotectError::Patch {
        path: path.display().to_string(),
        source: e,
    };

    let bytes = fs::read(path).map_err(patch_error)?;
    let part = TextPart::decode(&bytes).map_err(patch_error)?;
    let (patched, removed) = remove_matches(&part.text, pattern);
    fs::write(path, part.encode(&patched)).map_err(patch_error)?;

    Ok(removed)
}

/// Text of a package part together with the byte-order mark it was stored with.
struct TextPart<'b> {
    bom: &'b [u8],
    encoding: &'static Encoding,
    text: String,
}

impl<'b> TextPart<'b> {
    /// Decode by BOM when one is present, otherwise as strict UTF-8.
    fn decode(bytes: &'b [u8]) -> io::Result<Self> {
        let Some((encoding, bom_len)) = Encoding::for_bom(bytes) else {
            let text = String::from_utf8(bytes.to_vec())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            return Ok(Self {
                bom: &[],
                encoding: encoding_rs::UTF_8,
                text,
            });
        };

        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("part is not valid {}", encoding.name()),
            ));
        }

        Ok(Self {
            bom: &bytes[..bom_len],
            encoding,
            text: text.into_owned(),
        })
    }

    /// Re-encode `text` the way this part was stored, BOM included.
    fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = self.bom.to_vec();
        if self.encoding == UTF_16LE {
            out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        } else if self.encoding == UTF_16BE {
            out.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        } else {
            out.extend_from_slice(text.as_bytes());
        }
        out
    }
}

/// Remove every match of `pattern` from `text`, leaving everything else untouched.
pub fn remove_matches<'t>(text: &'t str, pattern: &Regex) -> (Cow<'t, str>, usize) {
    let removed = pattern.find_iter(text).count();
    if removed == 0 {
        return (Cow::Borrowed(text), 0);
    }
    (pattern.replace_all(text, ""), removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn patcher() -> ProtectionPatcher {
        ProtectionPatcher::new().unwrap()
    }

    fn write_part(root: &Path, part: &str, contents: &str) {
        let path = root.join(part);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_doc_security_removed() {
        let patcher = patcher();
        let text = "<Properties><Template>Normal</Template><DocSecurity>2</DocSecurity><Lines>1</Lines></Properties>";

        let (patched, removed) = remove_matches(text, patcher.doc_security.pattern());
        assert_eq!(removed, 1);
        assert_eq!(
            patched,
            "<Properties><Template>Normal</Template><Lines>1</Lines></Properties>"
        );
        assert!(!patched.contains("DocSecurity"));
    }

    #[test]
    fn test_removal_is_noop_without_element() {
        let patcher = patcher();
        let text = "<Properties>\r\n  <Pages>3</Pages>\r\n</Properties>";

        let (patched, removed) = remove_matches(text, patcher.doc_security.pattern());
        assert_eq!(removed, 0);
        assert!(matches!(patched, Cow::Borrowed(_)));
        assert_eq!(patched, text);
    }

    #[test]
    fn test_doc_security_does_not_span_elements() {
        let patcher = patcher();
        let text = "<DocSecurity><Broken/></DocSecurity><Company>Acme</Company>";

        let (patched, removed) = remove_matches(text, patcher.doc_security.pattern());
        assert_eq!(removed, 0);
        assert_eq!(patched, text);
    }

    #[test]
    fn test_document_protection_variants() {
        let patcher = patcher();
        let pattern = patcher.document_protection.pattern();

        let cases = [
            r#"<w:documentProtection w:enforcement="1"/>"#,
            r#"<w:documentProtection w:edit="readOnly" w:enforcement="1" w:cryptProviderType="rsaAES" w:hash="a/b>c==" w:salt="x"/>"#,
            "<w:documentProtection\n    w:edit=\"forms\"\n    w:enforcement=\"true\" />",
            r#"<w:documentProtection w:edit='comments' w:enforcement='1'></w:documentProtection>"#,
            r#"<w15:documentProtection w:enforcement="1"/>"#,
        ];

        for case in &cases {
            let text = format!("<w:settings><w:zoom w:percent=\"100\"/>{}<w:defaultTabStop w:val=\"720\"/></w:settings>", case);
            let (patched, removed) = remove_matches(&text, pattern);
            assert_eq!(removed, 1, "Should match: {}", case);
            assert_eq!(
                patched,
                "<w:settings><w:zoom w:percent=\"100\"/><w:defaultTabStop w:val=\"720\"/></w:settings>"
            );
        }
    }

    #[test]
    fn test_document_protection_leaves_similar_elements() {
        let patcher = patcher();
        let text = r#"<w:documentProtectionExtra w:val="1"/><w:writeProtection w:recommended="1"/>"#;

        let (_, removed) = remove_matches(text, patcher.document_protection.pattern());
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_unprotect_word_document() {
        let temp_dir = TempDir::new().unwrap();
        write_part(
            temp_dir.path(),
            APP_PROPERTIES_PART,
            "<Properties><DocSecurity>8</DocSecurity></Properties>",
        );
        write_part(
            temp_dir.path(),
            WORD_SETTINGS_PART,
            r#"<w:settings><w:documentProtection w:enforcement="1"/></w:settings>"#,
        );

        let summary = patcher()
            .unprotect(temp_dir.path(), DocumentKind::WordProcessing)
            .unwrap();

        assert_eq!(summary.doc_security_removed, 1);
        assert_eq!(summary.document_protection_removed, 1);
        assert_eq!(summary.total(), 2);

        let settings = fs::read_to_string(temp_dir.path().join(WORD_SETTINGS_PART)).unwrap();
        assert_eq!(settings, "<w:settings></w:settings>");
    }

    #[test]
    fn test_spreadsheet_ignores_word_settings() {
        let temp_dir = TempDir::new().unwrap();
        write_part(
            temp_dir.path(),
            APP_PROPERTIES_PART,
            "<Properties><DocSecurity>2</DocSecurity></Properties>",
        );

        let summary = patcher()
            .unprotect(temp_dir.path(), DocumentKind::Spreadsheet)
            .unwrap();

        assert_eq!(summary.doc_security_removed, 1);
        assert_eq!(summary.document_protection_removed, 0);
        assert!(!temp_dir.path().join("word").exists());
    }

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        bytes
    }

    #[test]
    fn test_utf16_part_keeps_its_encoding() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.xml");
        fs::write(
            &path,
            utf16le_with_bom("<Properties><DocSecurity>2</DocSecurity><Pages>1</Pages></Properties>"),
        )
        .unwrap();

        let removed = remove_from_file(&path, patcher().doc_security.pattern()).unwrap();

        assert_eq!(removed, 1);
        assert_eq!(
            fs::read(&path).unwrap(),
            utf16le_with_bom("<Properties><Pages>1</Pages></Properties>")
        );
    }

    #[test]
    fn test_utf8_bom_is_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.xml");
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<Properties><DocSecurity>4</DocSecurity></Properties>");
        fs::write(&path, bytes).unwrap();

        remove_from_file(&path, patcher().doc_security.pattern()).unwrap();

        let mut expected = vec![0xEF, 0xBB, 0xBF];
        expected.extend_from_slice(b"<Properties></Properties>");
        assert_eq!(fs::read(&path).unwrap(), expected);
    }

    #[test]
    fn test_invalid_utf8_is_patch_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.xml");
        fs::write(&path, [b'<', 0xC3, 0x28, b'>']).unwrap();

        let result = remove_from_file(&path, patcher().doc_security.pattern());
        assert!(matches!(result, Err(UnprotectError::Patch { .. })));
    }

    #[test]
    fn test_missing_part_is_patch_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = patcher().unprotect(temp_dir.path(), DocumentKind::Presentation);

        match result {
            Err(UnprotectError::Patch { path, .. }) => assert!(path.contains("app.xml")),
            other => panic!("expected patch error, got {:?}", other),
        }
    }

    #[test]
    fn test_targets_for_kind() {
        let patcher = patcher();
        let parts: Vec<&str> = patcher
            .targets_for(DocumentKind::WordProcessing)
            .iter()
            .map(|t| t.part)
            .collect();
        assert_eq!(parts, vec![APP_PROPERTIES_PART, WORD_SETTINGS_PART]);
        assert_eq!(patcher.targets_for(DocumentKind::Presentation).len(), 1);
    }
}
