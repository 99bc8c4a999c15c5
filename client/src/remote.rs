//! Remote source of the quote collection.
//!
//! The remote is an independent, possibly stale copy of the same dataset.
//! It hands back raw items; turning them into quotes is the job of an
//! injected [`ItemMapper`].

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use parking_lot::Mutex;
use quotesync_engine::{quote_from_value, Quote};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// An item as delivered by the remote, before mapping.
pub type RawServerItem = Value;

/// Pure conversion from a raw item to a quote; `None` drops the item.
pub type ItemMapper = Arc<dyn Fn(&RawServerItem) -> Option<Quote> + Send + Sync>;

/// Fetches a full snapshot of the remote collection.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch every item the remote currently holds.
    ///
    /// Network and status failures map to [`SyncError::RemoteUnavailable`].
    async fn fetch_snapshot(&self) -> Result<Vec<RawServerItem>>;
}

/// Maps `{"text", "category"}` objects.
pub fn quote_item_mapper() -> ItemMapper {
    Arc::new(|item: &RawServerItem| quote_from_value(item))
}

/// Category given to items from a posts-style remote.
pub const POST_CATEGORY: &str = "Server";

/// Maps posts-style objects (`{"id", "title", "body"}`): the title becomes
/// the quote text, filed under [`POST_CATEGORY`].
pub fn post_item_mapper() -> ItemMapper {
    Arc::new(|item: &RawServerItem| {
        let title = item.get("title")?.as_str()?;
        Quote::new(title, POST_CATEGORY).ok()
    })
}

/// Remote reached over HTTP; `GET url` must return a JSON array.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    url: String,
}

impl HttpRemote {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::RemoteUnavailable(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch_snapshot(&self) -> Result<Vec<RawServerItem>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| SyncError::RemoteUnavailable(e.to_string()))?;

        let items: Vec<RawServerItem> = response
            .json()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(format!("malformed body: {}", e)))?;

        tracing::debug!(url = %self.url, items = items.len(), "Fetched remote snapshot");
        Ok(items)
    }
}

/// Remote whose contents are set by hand, for tests and offline demos.
#[derive(Debug)]
pub struct FixedRemote {
    items: Mutex<std::result::Result<Vec<RawServerItem>, String>>,
    fetches: AtomicUsize,
}

impl FixedRemote {
    pub fn new(items: Vec<RawServerItem>) -> Self {
        Self {
            items: Mutex::new(Ok(items)),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Serve these quotes from now on.
    pub fn set_quotes(&self, quotes: &[Quote]) {
        let items = quotes
            .iter()
            .map(|q| serde_json::json!({ "text": q.text, "category": q.category }))
            .collect();
        *self.items.lock() = Ok(items);
    }

    /// Fail every fetch with `reason` from now on.
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        *self.items.lock() = Err(reason.into());
    }

    /// Number of fetches so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for FixedRemote {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl RemoteSource for FixedRemote {
    async fn fetch_snapshot(&self) -> Result<Vec<RawServerItem>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.items
            .lock()
            .clone()
            .map_err(SyncError::RemoteUnavailable)
    }
}
