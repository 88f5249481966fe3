use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(super) enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    pub(super) fn from_path(path: &Path) -> Self {
        let is_text = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);

        if is_text { Self::Text } else { Self::Pdf }
    }

    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct ExtractedDocument {
    pub kind: DocumentKind,
    pub pages: Vec<String>,
}

impl ExtractedDocument {
    pub(super) fn empty_page_count(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| page.trim().is_empty())
            .count()
    }
}

pub(super) fn extract_document(
    path: &Path,
    max_pages: Option<usize>,
) -> Result<ExtractedDocument> {
    let kind = DocumentKind::from_path(path);
    let pages = match kind {
        DocumentKind::Pdf => extract_pages_with_pdftotext(path, max_pages)?,
        DocumentKind::Text => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read text document {}", path.display()))?;
            let mut pages = split_pages(&raw);
            if let Some(max_pages) = max_pages {
                pages.truncate(max_pages);
            }
            pages
        }
    };

    Ok(ExtractedDocument { kind, pages })
}

fn extract_pages_with_pdftotext(pdf_path: &Path, max_pages: Option<usize>) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if let Some(max_pages) = max_pages {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
}

/// Splits extracted text on form feeds, dropping NULs and trailing blank pages.
pub(super) fn split_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

pub(super) fn pdftotext_version() -> Option<String> {
    let output = Command::new("pdftotext").arg("-v").output().ok()?;

    // poppler prints its version banner on stderr
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}
