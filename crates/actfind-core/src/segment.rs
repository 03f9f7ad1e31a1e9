//! Paragraph segmentation for PDF-extracted text.
//!
//! PDF text layers are noisy: page boundaries and layout artifacts leave gaps of one, two, or
//! many blank lines (often with stray spaces in them). We collapse every such gap into a single
//! `"\n\n"` delimiter, split on it, and keep the non-empty trimmed chunks.
//!
//! This is a whitespace heuristic, not a layout analysis.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const PARAGRAPH_BREAK: &str = "\n\n";

fn gap_pattern() -> &'static Regex {
    static GAP: OnceLock<Regex> = OnceLock::new();
    // A newline, optional whitespace (which may itself hold newlines), then one or more newlines.
    GAP.get_or_init(|| Regex::new(r"\n\s*\n+").expect("paragraph gap pattern is valid"))
}

/// Collapse every blank-line gap into exactly one `"\n\n"`.
///
/// Idempotent: `normalize_gaps(&normalize_gaps(t)) == normalize_gaps(t)`.
pub fn normalize_gaps(text: &str) -> String {
    gap_pattern()
        .replace_all(text, PARAGRAPH_BREAK)
        .into_owned()
}

/// Ordered, non-empty, trimmed paragraphs. A paragraph's index is its identity for the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParagraphSequence(Vec<String>);

impl ParagraphSequence {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.0.get(position).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for ParagraphSequence {
    /// Builds a sequence from arbitrary strings, enforcing the trimmed/non-empty invariant.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

/// Join page texts in order (one newline between pages) and split into paragraphs.
pub fn segment<S: AsRef<str>>(pages: &[S]) -> ParagraphSequence {
    let joined = pages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\n");
    split_paragraphs(&joined)
}

fn split_paragraphs(text: &str) -> ParagraphSequence {
    normalize_gaps(text).split(PARAGRAPH_BREAK).collect()
}
