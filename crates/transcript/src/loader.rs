//! Transcript loaders.
//!
//! Two sources: a local JSON file (an array of records) and a paginated
//! HTTP endpoint serving `{items, total}` envelopes. Both feed the same
//! validation path: required fields present, ids unique, then a stable
//! sort by timestamp so insertion order equals chronological order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use verbatim_core::error::LoadError;
use verbatim_core::{MessageId, Transcript, TranscriptMessage};

/// A raw transcript record as supplied by the ingestion collaborator.
///
/// Fields are optional here so validation can name exactly what is missing
/// instead of surfacing an opaque deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub text: Option<String>,
}

/// The transcript ingestion collaborator boundary.
#[async_trait]
pub trait TranscriptLoader: Send + Sync {
    async fn load(&self) -> Result<Transcript, LoadError>;
}

/// Validate raw records and build the chronological transcript.
pub fn build_transcript(records: Vec<TranscriptRecord>) -> Result<Transcript, LoadError> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut messages = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let id = non_blank(record.id, index, "id")?;
        let author = non_blank(record.author, index, "author")?;
        let timestamp = record
            .timestamp
            .ok_or(LoadError::MissingField { index, field: "timestamp" })?;
        let text = record
            .text
            .ok_or(LoadError::MissingField { index, field: "text" })?;

        if !seen.insert(id.clone()) {
            return Err(LoadError::DuplicateId(id));
        }

        messages.push(TranscriptMessage {
            id: MessageId::new(id),
            author,
            timestamp,
            text,
        });
    }

    // Stable sort keeps arrival order for equal timestamps.
    messages.sort_by_key(|m| m.timestamp);

    Ok(Transcript::new(messages))
}

fn non_blank(
    value: Option<String>,
    index: usize,
    field: &'static str,
) -> Result<String, LoadError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LoadError::MissingField { index, field }),
    }
}

/// Loads a transcript from a local JSON file containing an array of records.
pub struct JsonFileLoader {
    path: std::path::PathBuf,
}

impl JsonFileLoader {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TranscriptLoader for JsonFileLoader {
    async fn load(&self) -> Result<Transcript, LoadError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| LoadError::SourceUnavailable(format!("{}: {e}", self.path.display())))?;

        let records: Vec<TranscriptRecord> =
            serde_json::from_str(&raw).map_err(|e| LoadError::Malformed(e.to_string()))?;

        let transcript = build_transcript(records)?;
        info!(
            path = %self.path.display(),
            messages = transcript.len(),
            "Transcript loaded from file"
        );
        Ok(transcript)
    }
}

/// One page of the paginated ingestion endpoint.
#[derive(Debug, Deserialize)]
struct PageEnvelope {
    #[serde(default)]
    items: Vec<TranscriptRecord>,
    #[serde(default)]
    total: Option<usize>,
}

/// Outcome of fetching one page.
enum PageFetch {
    /// A successful page of records.
    Page(PageEnvelope),
    /// Non-success status: past the last page some endpoints answer 4xx
    /// instead of an empty list. Anything fetched so far stands.
    End,
}

/// Hard cap on pages fetched, so a misbehaving endpoint that keeps
/// returning items cannot stall startup forever.
const MAX_PAGES: usize = 1_000;

/// Drive the pagination loop over a page fetcher.
///
/// Stops on an empty page, when the first reported `total` is reached,
/// when the fetcher signals the end, or at the page cap.
async fn collect_pages<F, Fut>(mut fetch: F) -> Result<Vec<TranscriptRecord>, LoadError>
where
    F: FnMut(usize) -> Fut,
    Fut: std::future::Future<Output = Result<PageFetch, LoadError>>,
{
    let mut records: Vec<TranscriptRecord> = Vec::new();
    let mut reported_total: Option<usize> = None;

    for page in 0..MAX_PAGES {
        let envelope = match fetch(page).await? {
            PageFetch::Page(envelope) => envelope,
            PageFetch::End => {
                debug!(page, "Ingestion endpoint signaled the last page");
                break;
            }
        };

        if envelope.items.is_empty() {
            debug!(page, "Empty ingestion page, stopping");
            break;
        }

        if reported_total.is_none() {
            reported_total = envelope.total;
            if let Some(total) = reported_total {
                debug!(total, "Ingestion endpoint reports total");
            }
        }

        records.extend(envelope.items);

        if let Some(total) = reported_total {
            if records.len() >= total {
                break;
            }
        }
    }

    Ok(records)
}

/// Loads a transcript from a paginated HTTP endpoint.
///
/// Fetches `?page=N&limit=L` until the reported total is reached, an empty
/// page arrives, or the server stops returning 200. Optionally mirrors the
/// fetched transcript to a local JSON file that `JsonFileLoader` can read
/// on the next start.
pub struct HttpLoader {
    url: String,
    page_limit: usize,
    cache_path: Option<std::path::PathBuf>,
    client: reqwest::Client,
}

impl HttpLoader {
    pub fn new(url: impl Into<String>, page_limit: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            url: url.into(),
            page_limit,
            cache_path: None,
            client,
        }
    }

    /// Mirror the fetched transcript to a local JSON file after loading.
    pub fn with_cache(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    async fn fetch_page(&self, page: usize) -> Result<PageFetch, LoadError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("page", page), ("limit", self.page_limit)])
            .send()
            .await
            .map_err(|e| LoadError::SourceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(page, status = status.as_u16(), "Ingestion page fetch ended");
            return Ok(PageFetch::End);
        }

        let envelope: PageEnvelope = response
            .json()
            .await
            .map_err(|e| LoadError::Malformed(e.to_string()))?;

        Ok(PageFetch::Page(envelope))
    }
}

/// Write a transcript to a JSON file in the same array-of-records form the
/// file loader reads. Best effort: callers treat failures as non-fatal.
async fn write_cache(path: &std::path::Path, transcript: &Transcript) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(transcript.messages())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    tokio::fs::write(path, json).await
}

#[async_trait]
impl TranscriptLoader for HttpLoader {
    async fn load(&self) -> Result<Transcript, LoadError> {
        let records = collect_pages(|page| self.fetch_page(page)).await?;

        let transcript = build_transcript(records)?;
        info!(
            url = %self.url,
            messages = transcript.len(),
            "Transcript loaded from HTTP source"
        );

        if let Some(path) = &self.cache_path {
            match write_cache(path, &transcript).await {
                Ok(()) => debug!(path = %path.display(), "Transcript cached"),
                Err(e) => warn!(path = %path.display(), error = %e, "Transcript cache write failed"),
            }
        }

        Ok(transcript)
    }
}
