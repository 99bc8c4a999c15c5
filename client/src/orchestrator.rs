//! Sync orchestrator - owns the quote collection and drives sync cycles.
//!
//! A cycle fetches the remote snapshot, merges it with the local collection,
//! asks the resolver about each conflict in turn, then swaps the merged
//! collection in and persists it. Readers only ever see a complete
//! collection: the swap is a single pointer replacement done under the
//! write lock, after assembly.

use crate::error::{Result, StorageError, SyncError};
use crate::remote::{quote_item_mapper, ItemMapper, RemoteSource};
use crate::resolver::ConflictResolver;
use crate::storage::LocalStore;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use quotesync_engine::snapshot::{
    ledger_from_json, ledger_to_json, LAST_FILTER_KEY, LAST_SYNC_KEY, QUOTES_KEY,
    RESOLUTIONS_KEY,
};
use quotesync_engine::{
    default_quotes, export_json, merge, parse_import, CategoryFilter, Conflict, Decision, Quote,
    QuoteCollection, QuoteKey, QuoteSnapshot, ResolutionLedger, SyncState,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Summary of a successful sync cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Remote quotes added locally
    pub additions: usize,
    /// Conflicts decided by the resolver in this cycle
    pub conflicts: usize,
    /// Conflicts settled by a previously remembered decision
    pub settled: usize,
    /// Conflicts that ended with the local quote
    pub kept_local: usize,
    /// Conflicts that ended with the server quote
    pub kept_server: usize,
    /// Conflicts that ended with both quotes
    pub kept_both: usize,
    /// Whether the committed collection differs from the one before
    pub changed: bool,
    /// Size of the collection after the cycle
    pub total: usize,
    /// When the cycle committed
    pub synced_at: DateTime<Utc>,
    /// Non-fatal problems, such as failed storage writes
    pub warnings: Vec<String>,
}

impl SyncReport {
    /// True when the cycle left the collection untouched.
    pub fn is_noop(&self) -> bool {
        !self.changed
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "synced: {} added, {} conflicts resolved, {} total",
            self.additions,
            self.conflicts + self.settled,
            self.total
        )?;
        if !self.warnings.is_empty() {
            write!(f, " ({} warnings)", self.warnings.len())?;
        }
        Ok(())
    }
}

/// Result of adding a single quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddReport {
    /// The stored quote
    pub quote: Quote,
    /// Whether an existing quote with the same key was overwritten
    pub replaced: bool,
    pub warnings: Vec<String>,
}

/// Result of a file import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub added: usize,
    pub replaced: usize,
    /// Entries dropped by the shape check
    pub skipped: usize,
    pub warnings: Vec<String>,
}

/// Serialized values captured under the collection lock and written after it
/// is released. Later generations always win over earlier ones.
#[derive(Debug, Default)]
struct Staged {
    generation: u64,
    writes: Vec<(&'static str, String)>,
    warnings: Vec<String>,
}

impl Staged {
    fn push(&mut self, key: &'static str, encoded: quotesync_engine::error::Result<String>) {
        match encoded {
            Ok(value) => self.writes.push((key, value)),
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to serialize");
                self.warnings.push(e.to_string());
            }
        }
    }
}

/// Owns client state and runs sync cycles against a remote.
pub struct SyncOrchestrator {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteSource>,
    resolver: Arc<dyn ConflictResolver>,
    mapper: ItemMapper,
    quotes: RwLock<Arc<QuoteCollection>>,
    state: RwLock<SyncState>,
    ledger: Mutex<ResolutionLedger>,
    cycle: tokio::sync::Mutex<()>,
    /// Bumped under the collection lock for every staged commit
    generation: AtomicU64,
    /// Last generation written per storage key; held while writing
    written: Mutex<HashMap<&'static str, u64>>,
    /// Stored quotes lag behind memory after a failed write
    quotes_dirty: AtomicBool,
}

impl SyncOrchestrator {
    /// Create an orchestrator, restoring any state found in `store`.
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteSource>,
        resolver: Arc<dyn ConflictResolver>,
    ) -> Self {
        let quotes = load_quotes(store.as_ref());
        let state = load_state(store.as_ref());
        let ledger = load_ledger(store.as_ref());

        tracing::info!(
            quotes = quotes.len(),
            filter = %state.last_filter,
            last_sync = ?state.last_sync,
            "Restored local state"
        );

        Self {
            store,
            remote,
            resolver,
            mapper: quote_item_mapper(),
            quotes: RwLock::new(Arc::new(quotes)),
            state: RwLock::new(state),
            ledger: Mutex::new(ledger),
            cycle: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
            written: Mutex::new(HashMap::new()),
            quotes_dirty: AtomicBool::new(false),
        }
    }

    /// Use a different mapping from raw remote items to quotes.
    pub fn with_mapper(mut self, mapper: ItemMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Current collection; a consistent snapshot that later commits do not alter.
    pub fn quotes(&self) -> Arc<QuoteCollection> {
        self.quotes.read().clone()
    }

    /// Current scalar preferences.
    pub fn sync_state(&self) -> SyncState {
        self.state.read().clone()
    }

    /// Remembered conflict decisions.
    pub fn ledger(&self) -> ResolutionLedger {
        self.ledger.lock().clone()
    }

    /// Whether a cycle is running right now.
    pub fn is_syncing(&self) -> bool {
        self.cycle.try_lock().is_err()
    }

    /// Run one full fetch, merge, resolve, commit cycle.
    ///
    /// Fails with [`SyncError::CycleInProgress`] if another cycle is running.
    /// Any failure before the commit leaves memory and storage untouched.
    pub async fn sync_cycle(&self) -> Result<SyncReport> {
        let _cycle = self
            .cycle
            .try_lock()
            .map_err(|_| SyncError::CycleInProgress)?;
        let started = Instant::now();

        let items = self.remote.fetch_snapshot().await.inspect_err(|e| {
            tracing::warn!(error = %e, "Sync aborted: fetch failed");
        })?;

        let remote: Vec<Quote> = items.iter().filter_map(|item| (self.mapper)(item)).collect();
        if remote.len() < items.len() {
            tracing::debug!(
                dropped = items.len() - remote.len(),
                "Dropped unmappable remote items"
            );
        }

        // An empty remote looks exactly like a broken one
        if remote.is_empty() {
            tracing::warn!("Sync aborted: remote snapshot is empty");
            return Err(SyncError::RemoteUnavailable("empty snapshot".into()));
        }

        // Decisions taken by the resolver during this cycle
        let mut fresh: Vec<(Conflict, Decision)> = Vec::new();

        // Local edits may land while we wait on the resolver; re-merge on top
        // of them until the collection we merged against is still current.
        let (mut report, staged) = loop {
            let local = self.quotes();
            let mut ledger = self.ledger.lock().clone();

            // A fresh decision only stands while its local side is untouched
            fresh.retain(|(conflict, _)| local.get(&conflict.key) == Some(&conflict.local));
            for (conflict, decision) in &fresh {
                ledger.record(conflict, *decision);
            }

            let outcome = merge(&local, &remote);

            let mut decisions = Vec::with_capacity(outcome.conflicts().len());
            for conflict in outcome.conflicts() {
                let decision = match ledger.lookup(conflict) {
                    Some(decision) => decision,
                    None => {
                        let decision = self.resolver.resolve(conflict).await.inspect_err(|e| {
                            tracing::warn!(key = %conflict.key, error = %e, "Sync aborted during resolution");
                        })?;
                        ledger.record(conflict, decision);
                        fresh.push((conflict.clone(), decision));
                        decision
                    }
                };
                decisions.push(decision);
            }

            let conflicts = outcome
                .conflicts()
                .iter()
                .filter(|c| fresh.iter().any(|(f, _)| f == *c))
                .count();
            let settled = outcome.conflicts().len() - conflicts;
            let result = outcome.fold(&decisions)?;
            ledger.prune(&result.merged);

            let mut slot = self.quotes.write();
            if !Arc::ptr_eq(&slot, &local) {
                drop(slot);
                tracing::debug!("Local collection changed during sync, merging again");
                continue;
            }

            let mut staged = self.stage();
            let changed = result.merged != **slot;
            if changed {
                *slot = Arc::new(result.merged);
            }
            if changed || self.quotes_dirty.load(Ordering::SeqCst) {
                staged.push(QUOTES_KEY, QuoteSnapshot::new((**slot).clone()).to_json());
            }
            staged.push(RESOLUTIONS_KEY, ledger_to_json(&ledger));
            *self.ledger.lock() = ledger;

            let synced_at = Utc::now();
            let sync_text = {
                let mut state = self.state.write();
                state.last_sync = Some(synced_at);
                state.sync_text()
            };
            if let Some(text) = sync_text {
                staged.writes.push((LAST_SYNC_KEY, text));
            }

            let total = slot.len();
            drop(slot);

            break (
                SyncReport {
                    additions: result.additions,
                    conflicts,
                    settled,
                    kept_local: result.kept_local,
                    kept_server: result.kept_server,
                    kept_both: result.kept_both,
                    changed,
                    total,
                    synced_at,
                    warnings: Vec::new(),
                },
                staged,
            );
        };

        report.warnings = self.flush(staged);

        tracing::info!(
            additions = report.additions,
            conflicts = report.conflicts,
            settled = report.settled,
            total = report.total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Sync cycle complete"
        );

        Ok(report)
    }

    /// Add a quote locally, overwriting any quote with the same key.
    ///
    /// A changed quote makes any remembered decision for its key stale, so
    /// the next conflict on it goes back to the resolver.
    pub fn add_quote(&self, text: &str, category: &str) -> Result<AddReport> {
        let quote = Quote::new(text, category)?;

        let mut slot = self.quotes.write();
        let mut next = (**slot).clone();
        let previous = next.upsert(quote.clone());
        let mut staged = self.stage();
        if previous.as_ref() != Some(&quote) {
            self.forget_decisions([quote.key()], &mut staged);
        }
        staged.push(QUOTES_KEY, QuoteSnapshot::new(next.clone()).to_json());
        *slot = Arc::new(next);
        drop(slot);

        let warnings = self.flush(staged);
        let replaced = previous.is_some();
        tracing::info!(key = %quote.key(), replaced, "Quote added");
        Ok(AddReport {
            quote,
            replaced,
            warnings,
        })
    }

    /// Merge quotes from an import file; later entries win, no conflict prompts.
    pub fn import_json(&self, json: &str) -> Result<ImportReport> {
        let parsed = parse_import(json).inspect_err(|e| {
            tracing::warn!(error = %e, "Import rejected");
        })?;

        let mut slot = self.quotes.write();
        let mut next = (**slot).clone();
        let touched: Vec<QuoteKey> = parsed
            .quotes
            .iter()
            .filter(|q| next.get(&q.key()) != Some(*q))
            .map(Quote::key)
            .collect();
        let summary = next.union_with(parsed.quotes);
        let mut staged = self.stage();
        self.forget_decisions(touched, &mut staged);
        staged.push(QUOTES_KEY, QuoteSnapshot::new(next.clone()).to_json());
        *slot = Arc::new(next);
        drop(slot);

        let warnings = self.flush(staged);
        tracing::info!(
            added = summary.added,
            replaced = summary.replaced,
            skipped = parsed.skipped,
            "Quotes imported"
        );
        Ok(ImportReport {
            added: summary.added,
            replaced: summary.replaced,
            skipped: parsed.skipped,
            warnings,
        })
    }

    /// The collection in the import format.
    pub fn export_json(&self) -> Result<String> {
        Ok(export_json(&self.quotes())?)
    }

    /// Change the category filter and remember it.
    pub fn set_filter(&self, filter: CategoryFilter) -> Vec<String> {
        let text = {
            let mut state = self.state.write();
            state.last_filter = filter;
            state.filter_text()
        };
        self.persist(LAST_FILTER_KEY, &text).into_iter().collect()
    }

    /// The current category filter.
    pub fn filter(&self) -> CategoryFilter {
        self.state.read().last_filter.clone()
    }

    /// Distinct categories in display order.
    pub fn categories(&self) -> Vec<String> {
        self.quotes()
            .categories()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Quotes visible under the current filter.
    pub fn visible_quotes(&self) -> Vec<Quote> {
        let filter = self.filter();
        self.quotes()
            .filtered(&filter)
            .into_iter()
            .cloned()
            .collect()
    }

    /// A random quote under the current filter.
    pub fn random_quote(&self) -> Option<Quote> {
        let filter = self.filter();
        self.quotes()
            .pick(&filter, &mut rand::thread_rng())
            .cloned()
    }

    /// Start a commit. Call with the collection write lock held.
    fn stage(&self) -> Staged {
        Staged {
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            ..Staged::default()
        }
    }

    /// Drop remembered decisions for `keys`, staging the ledger if it changed.
    /// Call with the collection write lock held.
    fn forget_decisions(&self, keys: impl IntoIterator<Item = QuoteKey>, staged: &mut Staged) {
        let mut ledger = self.ledger.lock();
        let mut forgot = false;
        for key in keys {
            if ledger.forget(&key) {
                tracing::debug!(key = %key, "Forgot remembered decision after local edit");
                forgot = true;
            }
        }
        if forgot {
            staged.push(RESOLUTIONS_KEY, ledger_to_json(&ledger));
        }
    }

    /// Write staged values, skipping any key a later commit already wrote.
    fn flush(&self, staged: Staged) -> Vec<String> {
        let mut warnings = staged.warnings;
        let mut written = self.written.lock();

        for (key, value) in staged.writes {
            let last = written.entry(key).or_insert(0);
            if *last > staged.generation {
                tracing::debug!(key, "Skipping write superseded by a later commit");
                continue;
            }
            *last = staged.generation;

            let failed = self.persist(key, &value);
            if key == QUOTES_KEY {
                self.quotes_dirty.store(failed.is_some(), Ordering::SeqCst);
            }
            warnings.extend(failed);
        }

        warnings
    }

    /// Write one value; failures are logged and returned as a warning.
    fn persist(&self, key: &str, value: &str) -> Option<String> {
        match self.store.set(key, value) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Storage write failed, keeping in-memory state");
                Some(SyncError::StorageWrite(e).to_string())
            }
        }
    }
}

impl fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("quotes", &self.quotes.read().len())
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

fn read_logged(store: &dyn LocalStore, key: &str) -> Option<String> {
    store
        .get(key)
        .unwrap_or_else(|e: StorageError| {
            tracing::warn!(key, error = %e, "Storage read failed");
            None
        })
}

fn load_quotes(store: &dyn LocalStore) -> QuoteCollection {
    match read_logged(store, QUOTES_KEY) {
        Some(json) => match QuoteSnapshot::from_json(&json) {
            Ok(snapshot) => snapshot.quotes,
            Err(e) => {
                tracing::warn!(error = %e, "Stored quotes unreadable, starting from defaults");
                default_quotes()
            }
        },
        None => default_quotes(),
    }
}

fn load_state(store: &dyn LocalStore) -> SyncState {
    SyncState::from_stored(
        read_logged(store, LAST_FILTER_KEY).as_deref(),
        read_logged(store, LAST_SYNC_KEY).as_deref(),
    )
}

fn load_ledger(store: &dyn LocalStore) -> ResolutionLedger {
    read_logged(store, RESOLUTIONS_KEY)
        .and_then(|json| {
            ledger_from_json(&json)
                .inspect_err(|e| tracing::warn!(error = %e, "Stored resolutions unreadable"))
                .ok()
        })
        .unwrap_or_default()
}
