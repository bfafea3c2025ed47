//! Paper data structures.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Recorded when a detail page has no author block.
pub const NO_AUTHORS: &str = "No authors listed";

/// Recorded when a detail page has no abstract block.
pub const NO_ABSTRACT: &str = "No abstract available";

/// Recorded when a detail page has no PDF link.
pub const NO_PDF: &str = "No PDF found";

/// Longest sanitized title, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Characters that are stripped from titles before they become file names.
const UNSAFE_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Make a title usable as both a dedup key and a file stem.
///
/// Strips the characters `/ \ : * ? " < > |`, caps the result at
/// [`MAX_TITLE_CHARS`] characters and trims surrounding whitespace.
/// Applying it twice yields the same string as applying it once.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .filter(|c| !UNSAFE_CHARS.contains(c))
        .collect();
    let truncated: String = cleaned.trim().chars().take(MAX_TITLE_CHARS).collect();
    truncated.trim_end().to_string()
}

/// A paper entry on a year listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperLink {
    /// Anchor text as displayed on the listing
    pub title: String,

    /// Absolute URL of the paper detail page
    pub url: String,
}

/// Fields extracted from a paper detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperDetail {
    /// Sanitized page title
    pub title: String,
    pub authors: String,
    pub abstract_text: String,

    /// Absolute PDF URL, if the page links one
    pub pdf_url: Option<String>,
}

impl PaperDetail {
    /// Stamp the detail with its conference year.
    pub fn into_metadata(self, year: i32) -> PaperMetadata {
        PaperMetadata {
            year,
            title: self.title,
            authors: self.authors,
            abstract_text: self.abstract_text,
            pdf_url: self.pdf_url.unwrap_or_else(|| NO_PDF.to_string()),
        }
    }
}

/// One persisted metadata record.
///
/// Field order matches the CSV header `year,title,authors,abstract,pdf_url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaperMetadata {
    pub year: i32,
    pub title: String,
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub pdf_url: String,
}

impl PaperMetadata {
    /// Whether the record carries a real PDF link.
    pub fn has_pdf(&self) -> bool {
        self.pdf_url != NO_PDF
    }
}

/// Where the PDF of a paper lives under the output root.
pub fn pdf_path(root: &Path, year: i32, sanitized_title: &str) -> PathBuf {
    root.join(year.to_string())
        .join(format!("{sanitized_title}.pdf"))
}
