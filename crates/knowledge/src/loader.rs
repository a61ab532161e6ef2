//! Source document loading and page extraction.

use crate::types::Page;
use std::fs;
use std::path::Path;
use std::process::Command;
use tutor_core::{AppError, AppResult};

/// Page separator emitted by `pdftotext` and honored in plain-text sources.
const FORM_FEED: char = '\u{c}';

/// Source format, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    PlainText,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => Self::Pdf,
            _ => Self::PlainText,
        }
    }
}

/// Load the source document as a list of pages.
///
/// PDFs go through the `pdftotext` binary (poppler); every other file is read
/// as UTF-8 text. In both cases pages are separated by form feeds.
pub fn load_document(path: &Path) -> AppResult<Vec<Page>> {
    if !path.is_file() {
        return Err(AppError::Document(format!(
            "Source document not found: {:?}",
            path
        )));
    }

    let format = SourceFormat::from_path(path);
    tracing::info!("Loading {:?} as {:?}", path, format);

    let text = match format {
        SourceFormat::Pdf => extract_pdf_text(path)?,
        SourceFormat::PlainText => fs::read_to_string(path)
            .map_err(|e| AppError::Document(format!("Failed to read {:?}: {}", path, e)))?,
    };

    let pages = split_pages(&text);

    if pages.iter().all(|p| p.text.trim().is_empty()) {
        return Err(AppError::Document(format!(
            "No text could be extracted from {:?}",
            path
        )));
    }

    tracing::info!("Loaded {} pages from {:?}", pages.len(), path);
    Ok(pages)
}

/// Split extracted text into pages on form feeds.
///
/// A trailing form feed does not produce an extra empty page.
pub fn split_pages(text: &str) -> Vec<Page> {
    let mut segments: Vec<&str> = text.split(FORM_FEED).collect();

    if segments.len() > 1 && segments.last().is_some_and(|s| s.trim().is_empty()) {
        segments.pop();
    }

    segments
        .into_iter()
        .enumerate()
        .map(|(number, text)| Page {
            number,
            text: text.to_string(),
        })
        .collect()
}

fn extract_pdf_text(path: &Path) -> AppResult<String> {
    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| {
            AppError::Document(format!(
                "Failed to run pdftotext: {} (is poppler installed?)",
                e
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!("pdftotext failed for {:?}: {}", path, stderr.trim());
        return Err(AppError::Document(format!(
            "pdftotext failed for {:?}: {}",
            path,
            stderr.trim()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    tracing::debug!("pdftotext extracted {} characters", text.chars().count());

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_path(Path::new("jesc101.pdf")), SourceFormat::Pdf);
        assert_eq!(SourceFormat::from_path(Path::new("BOOK.PDF")), SourceFormat::Pdf);
        assert_eq!(SourceFormat::from_path(Path::new("notes.txt")), SourceFormat::PlainText);
        assert_eq!(SourceFormat::from_path(Path::new("notes")), SourceFormat::PlainText);
    }

    #[test]
    fn test_split_pages_on_form_feed() {
        let pages = split_pages("first page\u{c}second page\u{c}");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 0);
        assert_eq!(pages[1].text, "second page");
    }

    #[test]
    fn test_text_without_form_feed_is_one_page() {
        let pages = split_pages("just one page");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, "just one page");
    }

    #[test]
    fn test_load_text_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.txt");
        fs::write(&path, "Chemical reactions\u{c}Acids and bases").unwrap();

        let pages = load_document(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].text, "Acids and bases");
    }

    #[test]
    fn test_missing_document() {
        let dir = TempDir::new().unwrap();
        let err = load_document(&dir.path().join("missing.pdf")).unwrap_err();
        assert!(matches!(err, AppError::Document(_)));
    }

    #[test]
    fn test_blank_document_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blank.txt");
        fs::write(&path, "  \n\u{c}\n").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(err.to_string().contains("No text"));
    }
}
