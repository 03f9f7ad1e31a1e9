//! Single-file document cache.
//!
//! The cached file is trusted as-is once present: no freshness or checksum check. Writes go
//! through a sibling temp file that is renamed into place, so a failed or interrupted download
//! never leaves a file that a later run would mistake for a valid cache entry.

use actfind_core::{DocumentConfig, Error, FetchBackend, FetchResponse, Progress, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    AlreadyPresent,
    Downloaded { bytes: usize },
}

pub struct DocumentCache<'a> {
    fetcher: &'a dyn FetchBackend,
    progress: &'a dyn Progress,
}

impl<'a> DocumentCache<'a> {
    pub fn new(fetcher: &'a dyn FetchBackend, progress: &'a dyn Progress) -> Self {
        Self { fetcher, progress }
    }

    /// Make sure `doc.local_path` holds a copy of `doc.url`, fetching it at most once.
    pub async fn ensure(&self, doc: &DocumentConfig) -> Result<CacheOutcome> {
        let path = &doc.local_path;
        if path.is_file() {
            tracing::debug!(path = %path.display(), "document already cached");
            self.progress.already_cached(path);
            return Ok(CacheOutcome::AlreadyPresent);
        }

        self.progress.download_started(&doc.url);
        let resp = self.fetcher.fetch(&doc.fetch_request()).await?;
        check_body(&resp, doc.max_bytes)?;

        let n = resp.bytes.len();
        let (status, elapsed_ms) = (resp.status, resp.elapsed_ms);
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, &resp.bytes))
            .await
            .map_err(|e| Error::Internal(format!("cache write join failed: {e}")))??;

        tracing::info!(
            path = %path.display(),
            bytes = n,
            url = %doc.url,
            status,
            elapsed_ms,
            "document cached"
        );
        self.progress.download_finished(path, n);
        Ok(CacheOutcome::Downloaded { bytes: n })
    }
}

/// Best-effort sniff for PDF bytes: the `%PDF-` marker within the first 1 KiB.
pub fn bytes_look_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

fn check_body(resp: &FetchResponse, max_bytes: u64) -> Result<()> {
    if resp.truncated {
        return Err(Error::Retrieval(format!(
            "response from {} exceeds {} bytes",
            resp.final_url, max_bytes
        )));
    }
    if !bytes_look_like_pdf(&resp.bytes) {
        return Err(Error::Retrieval(format!(
            "response from {} is not a PDF (content-type: {})",
            resp.final_url,
            resp.content_type.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(())
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |p: &Path, e: std::io::Error| Error::Io(format!("{}: {e}", p.display()));

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".actfind-")
        .suffix(".part")
        .tempfile_in(&dir)
        .map_err(|e| io_err(&dir, e))?;
    tmp.write_all(bytes).map_err(|e| io_err(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| io_err(tmp.path(), e))?;
    // On failure the temp file is dropped (and removed) together with the PersistError.
    tmp.persist(path).map_err(|e| io_err(path, e.error))?;
    Ok(())
}
