//! Case-insensitive literal substring matching over paragraphs.

use crate::segment::ParagraphSequence;
use crate::{Error, Result};
use serde::Serialize;

/// A validated search query: trimmed, non-empty, with a precomputed lowercase form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    text: String,
    #[serde(skip)]
    folded: String,
}

impl Query {
    /// Trim `raw` and reject it when nothing is left.
    pub fn parse(raw: &str) -> Result<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(Error::Input("search text cannot be empty".to_string()));
        }
        Ok(Self {
            text: text.to_string(),
            folded: text.to_lowercase(),
        })
    }

    /// The trimmed query as typed.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn matches(&self, paragraph: &str) -> bool {
        paragraph.to_lowercase().contains(&self.folded)
    }
}

/// Ascending positions of every paragraph containing `query`, ignoring case.
///
/// Pure substring test: no word boundaries, no pattern syntax. `"80C"` matches `"80CCD"` too.
pub fn find(paragraphs: &ParagraphSequence, query: &Query) -> Vec<usize> {
    paragraphs
        .iter()
        .enumerate()
        .filter(|(_, p)| query.matches(p))
        .map(|(i, _)| i)
        .collect()
}
