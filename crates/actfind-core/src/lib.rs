use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod locate;
pub mod present;
pub mod segment;

pub use locate::{find, Query};
pub use present::{present, ContextWindow, DisplayGroup, DisplayLine, Label, Presentation};
pub use segment::{normalize_gaps, segment, ParagraphSequence};

/// Source document used when nothing else is configured.
pub const DEFAULT_PDF_URL: &str =
    "https://incometaxindia.gov.in/Documents/income-tax-act-1961-as-amended-by-finance-act-2025.pdf";

/// File name of the cached copy of [`DEFAULT_PDF_URL`].
pub const DEFAULT_PDF_FILE_NAME: &str = "income-tax-act-1961.pdf";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("network/download error: {0}")]
    Retrieval(String),
    #[error("file error: {0}")]
    Io(String),
    #[error("could not read PDF: {0}")]
    Decode(String),
    #[error("invalid input: {0}")]
    Input(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable, machine-friendly error code.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Retrieval(_) => "retrieval",
            Error::Io(_) => "io",
            Error::Decode(_) => "decode",
            Error::Input(_) => "input",
            Error::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Where the source document lives and how it may be fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub url: String,
    pub local_path: PathBuf,
    /// Bounded wait for the single fetch attempt.
    pub timeout_ms: u64,
    /// Hard cap on bytes read from the response body. Larger bodies are rejected, not cached.
    pub max_bytes: u64,
}

impl DocumentConfig {
    pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
    pub const DEFAULT_MAX_BYTES: u64 = 256 * 1024 * 1024;

    pub fn new(url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            local_path: local_path.into(),
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            max_bytes: Self::DEFAULT_MAX_BYTES,
        }
    }

    pub fn fetch_request(&self) -> FetchRequest {
        FetchRequest {
            url: self.url.clone(),
            timeout_ms: Some(self.timeout_ms),
            max_bytes: Some(self.max_bytes),
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PDF_URL, DEFAULT_PDF_FILE_NAME)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub document: DocumentConfig,
    /// Paragraphs shown before and after each match.
    pub context_radius: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            document: DocumentConfig::default(),
            context_radius: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the whole request (connect + body).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
}

impl FetchRequest {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
    /// Wall time of the request, body included.
    pub elapsed_ms: u64,
}

/// Network fetch capability.
///
/// Implementations fail with [`Error::Retrieval`] for connection failures and non-2xx
/// responses alike.
#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

/// Observer for the cosmetic progress side effects of the pipeline.
///
/// Every hook defaults to a no-op so implementors only pick what they render.
pub trait Progress {
    fn already_cached(&self, _path: &Path) {}
    fn download_started(&self, _url: &str) {}
    fn download_finished(&self, _path: &Path, _bytes: usize) {}
    fn extraction_started(&self, _path: &Path) {}
    fn page_extracted(&self, _page_number: usize, _total_pages: usize) {}
    fn extraction_finished(&self, _total_pages: usize) {}
}

/// Progress observer that renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_income_tax_act() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.document.url, DEFAULT_PDF_URL);
        assert_eq!(cfg.document.local_path, PathBuf::from(DEFAULT_PDF_FILE_NAME));
        assert_eq!(cfg.document.timeout_ms, 60_000);
        assert_eq!(cfg.context_radius, 1);
    }

    #[test]
    fn fetch_request_carries_timeout_and_cap() {
        let mut doc = DocumentConfig::new("https://example.com/a.pdf", "/tmp/a.pdf");
        doc.timeout_ms = 1_500;
        doc.max_bytes = 42;
        let req = doc.fetch_request();
        assert_eq!(req.url, "https://example.com/a.pdf");
        assert_eq!(req.timeout(), Some(Duration::from_millis(1_500)));
        assert_eq!(req.max_bytes, Some(42));
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(Error::Retrieval("x".into()).kind(), "retrieval");
        assert_eq!(Error::Io("x".into()).kind(), "io");
        assert_eq!(Error::Decode("x".into()).kind(), "decode");
        assert_eq!(Error::Input("x".into()).kind(), "input");
        assert_eq!(Error::Internal("x".into()).kind(), "internal");
    }
}
