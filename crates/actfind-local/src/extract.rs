//! Per-page text extraction from a cached PDF.
//!
//! `pdf-extract` is the main engine: it lays text out by position, so a vertical gap inside a
//! page comes back as a blank line and survives into paragraph segmentation. lopdf parses the
//! document first (a file it cannot parse is fatal), supplies the page count, and extracts any
//! page `pdf-extract` left empty. A page neither engine can read becomes an empty string.
//!
//! Quality varies by PDF (text layer vs scanned images, font encodings).

use actfind_core::{Error, Progress, Result};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

type EngineResult<T> = std::result::Result<T, String>;

/// Read the file at `path` and extract its pages in page order.
pub fn extract_pages(path: &Path, progress: &dyn Progress) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;
    progress.extraction_started(path);
    extract_pages_from_mem(&bytes, progress)
}

/// Extract one string per page, in page order. Pages without text are empty strings.
///
/// Leading and trailing blank lines of each page are dropped, so joining pages with a single
/// newline keeps a page boundary a plain line break.
pub fn extract_pages_from_mem(bytes: &[u8], progress: &dyn Progress) -> Result<Vec<String>> {
    let doc = guarded(|| lopdf::Document::load_mem(bytes).map_err(|e| e.to_string()))
        .map_err(Error::Decode)?;

    // BTreeMap keys: page numbers in ascending order.
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let laid_out = guarded(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| e.to_string())
    });

    let pages = merge_pages(
        &page_numbers,
        laid_out,
        |n| guarded(|| doc.extract_text(&[n]).map_err(|e| e.to_string())),
        progress,
    );

    let total = pages.len();
    progress.extraction_finished(total);
    tracing::info!(
        pages = total,
        empty_pages = pages.iter().filter(|p| p.is_empty()).count(),
        "text extraction complete"
    );
    Ok(pages)
}

/// Pick each page's text: the laid-out engine output when it is usable, otherwise
/// `per_page(page_number)`.
///
/// The laid-out output is ignored entirely when it failed or disagrees on the page count.
fn merge_pages(
    page_numbers: &[u32],
    laid_out: EngineResult<Vec<String>>,
    mut per_page: impl FnMut(u32) -> EngineResult<String>,
    progress: &dyn Progress,
) -> Vec<String> {
    let total = page_numbers.len();
    let mut laid_out = match laid_out {
        Ok(pages) if pages.len() == total => Some(pages.into_iter()),
        Ok(pages) => {
            tracing::warn!(
                got = pages.len(),
                expected = total,
                "pdf-extract page count mismatch; extracting pages with lopdf"
            );
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "pdf-extract failed; extracting pages with lopdf");
            None
        }
    };

    let mut pages = Vec::with_capacity(total);
    for (i, &page_number) in page_numbers.iter().enumerate() {
        let first = laid_out.as_mut().and_then(Iterator::next).unwrap_or_default();
        let text = if first.trim().is_empty() {
            match per_page(page_number) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(page = page_number, error = %e, "page text extraction failed");
                    String::new()
                }
            }
        } else {
            first
        };
        pages.push(trim_blank_edges(&text).to_string());
        progress.page_extracted(i + 1, total);
    }
    pages
}

/// Drop blank lines at both ends of a page. Indentation of the first text line is kept.
fn trim_blank_edges(text: &str) -> &str {
    let text = text.trim_end();
    let body = text.trim_start();
    let lead = &text[..text.len() - body.len()];
    match lead.rfind('\n') {
        Some(i) => &text[i + 1..],
        None => text,
    }
}

/// Run a decoding step, turning a panic inside the PDF engine into an error.
fn guarded<T>(f: impl FnOnce() -> EngineResult<T>) -> EngineResult<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(r) => r,
        Err(payload) => Err(format!("panicked: {}", panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
