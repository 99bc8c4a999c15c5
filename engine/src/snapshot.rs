//! Snapshot types for persisting and restoring client state.
//!
//! The engine turns state into text and back; where the text lives is up to
//! the caller. Each piece of state is stored under its own key so scalar
//! preferences can be written without rewriting the whole collection.

use crate::{error::Result, CategoryFilter, Error, Quote, QuoteCollection, ResolutionLedger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Storage key of the quote collection.
pub const QUOTES_KEY: &str = "quotes";
/// Storage key of the last applied category filter.
pub const LAST_FILTER_KEY: &str = "lastFilter";
/// Storage key of the last successful sync time.
pub const LAST_SYNC_KEY: &str = "lastSync";
/// Storage key of the remembered conflict decisions.
pub const RESOLUTIONS_KEY: &str = "resolutions";

/// The persisted form of the quote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    /// Quotes in display order
    pub quotes: QuoteCollection,
}

impl QuoteSnapshot {
    pub fn new(quotes: QuoteCollection) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            quotes,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        // Validate format version
        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported snapshot format version: {} (max supported: {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        // Stored quotes went through validation once; reject tampered ones
        for quote in snapshot.quotes.iter() {
            quote.clone().normalized()?;
        }

        Ok(snapshot)
    }
}

/// Scalar preferences that survive across sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    /// Last applied category filter
    pub last_filter: CategoryFilter,
    /// Last successful sync
    pub last_sync: Option<DateTime<Utc>>,
}

impl SyncState {
    /// Restore from the raw stored values; unreadable values fall back to defaults.
    pub fn from_stored(last_filter: Option<&str>, last_sync: Option<&str>) -> Self {
        Self {
            last_filter: last_filter
                .and_then(|f| f.parse().ok())
                .unwrap_or_default(),
            last_sync: last_sync.and_then(|s| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|t| t.with_timezone(&Utc))
            }),
        }
    }

    /// Stored text of the filter.
    pub fn filter_text(&self) -> String {
        self.last_filter.to_string()
    }

    /// Stored text of the sync time.
    pub fn sync_text(&self) -> Option<String> {
        self.last_sync.map(|t| t.to_rfc3339())
    }
}

/// Serialize the remembered decisions.
pub fn ledger_to_json(ledger: &ResolutionLedger) -> Result<String> {
    serde_json::to_string(ledger).map_err(|e| Error::Serialization(e.to_string()))
}

/// Deserialize the remembered decisions.
pub fn ledger_from_json(json: &str) -> Result<ResolutionLedger> {
    serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))
}

/// The collection shown before anything has been stored.
pub fn default_quotes() -> QuoteCollection {
    [
        (
            "The only way to do great work is to love what you do.",
            "Inspiration",
        ),
        (
            "Innovation distinguishes between a leader and a follower.",
            "Technology",
        ),
        (
            "Strive not to be a success, but rather to be of value.",
            "Wisdom",
        ),
        (
            "The mind is everything. What you think you become.",
            "Philosophy",
        ),
        (
            "Your time is limited, so don't waste it living someone else's life.",
            "Life",
        ),
    ]
    .into_iter()
    .map(|(text, category)| Quote {
        text: text.to_string(),
        category: category.to_string(),
    })
    .collect()
}
