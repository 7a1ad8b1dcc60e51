//! File type detection and upload validation.
//!
//! Detection is purely extension based. The table below is the single source of
//! truth for which extensions reach which text extractor:
//!
//! | extensions | [`FileType`] |
//! |---|---|
//! | `txt` | `Text` |
//! | `pdf` | `Pdf` |
//! | `docx`, `doc` | `Docx` |
//! | `xlsx`, `xls` | `Xlsx` |
//! | `png`, `jpg`, `jpeg`, `gif`, `bmp`, `tiff` | `Image` |
//!
//! # Example
//!
//! ```rust
//! use doclex::core::formats::{FileType, detect_file_type};
//!
//! assert_eq!(detect_file_type("Report.PDF"), FileType::Pdf);
//! assert_eq!(detect_file_type("notes"), FileType::Unknown);
//! ```

use crate::core::config::Settings;
use crate::{DoclexError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Category of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Text,
    Pdf,
    Docx,
    Xlsx,
    Image,
    Unknown,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Text => "text",
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Xlsx => "xlsx",
            FileType::Image => "image",
            FileType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static EXT_TO_FILE_TYPE: Lazy<HashMap<&'static str, FileType>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("txt", FileType::Text);

    m.insert("pdf", FileType::Pdf);

    m.insert("docx", FileType::Docx);
    m.insert("doc", FileType::Docx);

    m.insert("xlsx", FileType::Xlsx);
    m.insert("xls", FileType::Xlsx);

    m.insert("png", FileType::Image);
    m.insert("jpg", FileType::Image);
    m.insert("jpeg", FileType::Image);
    m.insert("gif", FileType::Image);
    m.insert("bmp", FileType::Image);
    m.insert("tiff", FileType::Image);

    m
});

/// Lower-cased extension of `filename` without the dot, or `""` when it has none.
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

/// Map a filename to its [`FileType`] by (case-insensitive) extension.
pub fn detect_file_type(filename: &str) -> FileType {
    EXT_TO_FILE_TYPE
        .get(file_extension(filename).as_str())
        .copied()
        .unwrap_or(FileType::Unknown)
}

/// Check an upload against the size ceiling, the known types and the allow-list.
///
/// Checks run in that order and the first failure is reported.
///
/// # Errors
///
/// Returns `DoclexError::Validation` carrying one of:
/// - `File size exceeds {N}MB limit`
/// - `Unsupported file type: .{ext}`
/// - `File type '{ext}' not allowed. Allowed types: {list}`
pub fn validate_file(filename: &str, content: &[u8], settings: &Settings) -> Result<()> {
    if content.len() > settings.max_file_size_bytes() {
        return Err(DoclexError::validation(format!(
            "File size exceeds {}MB limit",
            settings.max_file_size_mb
        )));
    }

    let extension = file_extension(filename);

    if detect_file_type(filename) == FileType::Unknown {
        let shown = if extension.is_empty() {
            String::new()
        } else {
            format!(".{}", extension)
        };
        return Err(DoclexError::validation(format!("Unsupported file type: {}", shown)));
    }

    if !settings.allowed_file_types_list().contains(&extension) {
        return Err(DoclexError::validation(format!(
            "File type '{}' not allowed. Allowed types: {}",
            extension, settings.allowed_file_types
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_supported_extensions() {
        let cases = [
            ("a.txt", FileType::Text),
            ("a.pdf", FileType::Pdf),
            ("a.docx", FileType::Docx),
            ("a.doc", FileType::Docx),
            ("a.xlsx", FileType::Xlsx),
            ("a.xls", FileType::Xlsx),
            ("a.png", FileType::Image),
            ("a.jpg", FileType::Image),
            ("a.jpeg", FileType::Image),
            ("a.gif", FileType::Image),
            ("a.bmp", FileType::Image),
            ("a.tiff", FileType::Image),
        ];
        for (name, expected) in cases {
            assert_eq!(detect_file_type(name), expected, "{}", name);
        }
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(detect_file_type("SCAN.JPEG"), FileType::Image);
        assert_eq!(detect_file_type("Budget.XlSx"), FileType::Xlsx);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_file_type("archive.zip"), FileType::Unknown);
        assert_eq!(detect_file_type("README"), FileType::Unknown);
        assert_eq!(detect_file_type("image.webp"), FileType::Unknown);
    }

    #[test]
    fn test_file_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FileType::Docx).unwrap(), "\"docx\"");
        assert_eq!(FileType::Text.to_string(), "text");
    }

    #[test]
    fn test_validate_accepts_allowed_file() {
        let settings = Settings::default();
        assert!(validate_file("notes.txt", b"hello", &settings).is_ok());
    }

    #[test]
    fn test_validate_oversized_fails_first() {
        let settings = Settings {
            max_file_size_mb: 1,
            ..Default::default()
        };
        let content = vec![0u8; 1024 * 1024 + 1];
        let err = validate_file("archive.zip", &content, &settings).unwrap_err();
        assert_eq!(err.reason(), "File size exceeds 1MB limit");
    }

    #[test]
    fn test_validate_size_boundary_is_inclusive() {
        let settings = Settings {
            max_file_size_mb: 1,
            ..Default::default()
        };
        let content = vec![b'a'; 1024 * 1024];
        assert!(validate_file("exact.txt", &content, &settings).is_ok());
    }

    #[test]
    fn test_validate_unknown_type() {
        let err = validate_file("archive.zip", b"PK", &Settings::default()).unwrap_err();
        assert!(matches!(err, DoclexError::Validation { .. }));
        assert_eq!(err.reason(), "Unsupported file type: .zip");
    }

    #[test]
    fn test_validate_known_but_not_allowed() {
        let err = validate_file("legacy.doc", b"data", &Settings::default()).unwrap_err();
        assert_eq!(
            err.reason(),
            "File type 'doc' not allowed. Allowed types: txt,pdf,docx,xlsx,png,jpg,jpeg"
        );
    }
}
