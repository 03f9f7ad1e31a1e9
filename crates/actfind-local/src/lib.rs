use actfind_core::{
    segment, DocumentConfig, Error, FetchBackend, FetchRequest, FetchResponse, ParagraphSequence,
    Progress, Result,
};
use std::time::Duration;

pub mod cache;
pub mod extract;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use cache::{CacheOutcome, DocumentCache};
pub use extract::{extract_pages, extract_pages_from_mem};

/// Ensure the document is cached, extract its pages, and split them into paragraphs.
///
/// Stages run strictly in order; each consumes the previous stage's complete output.
pub async fn prepare_document(
    doc: &DocumentConfig,
    fetcher: &dyn FetchBackend,
    progress: &dyn Progress,
) -> Result<ParagraphSequence> {
    DocumentCache::new(fetcher, progress).ensure(doc).await?;
    let pages = extract_pages(&doc.local_path, progress)?;
    let paragraphs = segment(&pages);
    tracing::info!(
        pages = pages.len(),
        paragraphs = paragraphs.len(),
        "document segmented"
    );
    Ok(paragraphs)
}

/// reqwest-backed [`FetchBackend`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("actfind/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            // Avoid hanging forever on DNS/TLS stalls; per-request timeouts still apply on top.
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Retrieval(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl FetchBackend for HttpFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let t_req = std::time::Instant::now();
        let url = url::Url::parse(&req.url)
            .map_err(|e| Error::Retrieval(format!("invalid url {:?}: {e}", req.url)))?;

        let mut rb = self.client.get(url);
        if let Some(to) = req.timeout() {
            rb = rb.timeout(to);
        }
        let resp = rb
            .send()
            .await
            .map_err(|e| Error::Retrieval(e.to_string()))?;
        let final_url = resp.url().to_string();
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Retrieval(format!(
                "HTTP {} for {}",
                status.as_u16(),
                final_url
            )));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let max_bytes = req.max_bytes.unwrap_or(u64::MAX) as usize;
        let mut truncated = false;
        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Retrieval(e.to_string()))?;
            if bytes.len().saturating_add(chunk.len()) > max_bytes {
                let can_take = max_bytes.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..can_take]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        let elapsed_ms = u64::try_from(t_req.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(
            url = %req.url,
            %final_url,
            bytes = bytes.len(),
            truncated,
            elapsed_ms,
            "fetched"
        );
        Ok(FetchResponse {
            final_url,
            status: status.as_u16(),
            content_type,
            bytes,
            truncated,
            elapsed_ms,
        })
    }
}
