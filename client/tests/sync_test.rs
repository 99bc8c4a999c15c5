//! End-to-end sync tests against a live quote server.
//!
//! Each test starts the axum server on an ephemeral port and syncs a
//! file-backed client through `HttpRemote`.

use quotesync_client::{
    AutoResolver, ConflictResolver, FileStore, HttpRemote, LocalStore, PromptResolver,
    SyncError, SyncOrchestrator,
};
use quotesync_engine::snapshot::{LAST_SYNC_KEY, QUOTES_KEY};
use quotesync_engine::{Decision, Quote, QuoteCollection, QuoteSnapshot, ResolutionPolicy};
use quotesync_server::AppState;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn quote(text: &str, category: &str) -> Quote {
    Quote::new(text, category).unwrap()
}

/// Start a server holding `quotes`; returns its base URL and state.
async fn start_server(quotes: Vec<Quote>) -> (String, AppState) {
    let state = AppState::new(QuoteCollection::from_quotes(quotes));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(quotesync_server::serve(listener, state.clone()));
    (format!("http://{}", addr), state)
}

/// A file store in a fresh directory holding `quotes`.
fn seeded_store(quotes: Vec<Quote>) -> (TempDir, Arc<FileStore>) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let json = QuoteSnapshot::new(quotes.into()).to_json().unwrap();
    store.set(QUOTES_KEY, &json).unwrap();
    (dir, store)
}

fn orchestrator(
    store: Arc<FileStore>,
    base_url: &str,
    resolver: Arc<dyn ConflictResolver>,
) -> SyncOrchestrator {
    let remote = HttpRemote::new(format!("{}/quotes", base_url), Duration::from_secs(5)).unwrap();
    SyncOrchestrator::new(store, Arc::new(remote), resolver)
}

// ============================================================================
// Merge outcomes
// ============================================================================

#[tokio::test]
async fn server_wins_on_conflict() {
    let (base, _state) = start_server(vec![quote("be bold", "Courage")]).await;
    let (_dir, store) = seeded_store(vec![quote("Be bold", "Life")]);
    let client = orchestrator(store.clone(), &base, Arc::new(AutoResolver::default()));

    let report = client.sync_cycle().await.unwrap();
    assert_eq!(report.conflicts, 1);
    assert_eq!(report.kept_server, 1);
    assert_eq!(client.quotes().quotes(), &[quote("be bold", "Courage")]);

    // Persisted as well
    let stored = QuoteSnapshot::from_json(&store.get(QUOTES_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored.quotes.quotes(), &[quote("be bold", "Courage")]);
    assert!(store.get(LAST_SYNC_KEY).unwrap().is_some());
}

#[tokio::test]
async fn disjoint_collections_union() {
    let (base, _state) = start_server(vec![quote("B", "Y")]).await;
    let (_dir, store) = seeded_store(vec![quote("A", "X")]);
    let client = orchestrator(store, &base, Arc::new(AutoResolver::default()));

    let report = client.sync_cycle().await.unwrap();
    assert_eq!(report.additions, 1);
    assert_eq!(report.conflicts, 0);
    assert_eq!(client.quotes().quotes(), &[quote("A", "X"), quote("B", "Y")]);
}

#[tokio::test]
async fn keep_both_is_stable_across_cycles() {
    let (base, _state) = start_server(vec![quote("be bold", "Courage")]).await;
    let (_dir, store) = seeded_store(vec![quote("Be bold", "Life")]);
    let client = orchestrator(
        store,
        &base,
        Arc::new(AutoResolver::new(ResolutionPolicy::KeepBoth)),
    );

    let first = client.sync_cycle().await.unwrap();
    assert_eq!(first.kept_both, 1);
    let expected = [quote("Be bold", "Life"), quote("be bold (server)", "Courage")];
    assert_eq!(client.quotes().quotes(), &expected);

    let second = client.sync_cycle().await.unwrap();
    assert_eq!(second.conflicts, 0);
    assert!(second.is_noop());
    assert_eq!(client.quotes().quotes(), &expected);
}

#[tokio::test]
async fn prompt_decision_keeps_local() {
    let (base, _state) = start_server(vec![quote("be bold", "Courage")]).await;
    let (_dir, store) = seeded_store(vec![quote("Be bold", "Life")]);
    let (resolver, mut prompts) = PromptResolver::channel();
    let client = Arc::new(orchestrator(store, &base, Arc::new(resolver)));

    let cycle = tokio::spawn({
        let client = client.clone();
        async move { client.sync_cycle().await }
    });

    let request = prompts.recv().await.unwrap();
    assert_eq!(request.conflict.local, quote("Be bold", "Life"));
    assert_eq!(request.conflict.server, quote("be bold", "Courage"));
    assert!(request.answer(Decision::KeepLocal));

    let report = cycle.await.unwrap().unwrap();
    assert_eq!(report.kept_local, 1);
    assert_eq!(client.quotes().quotes(), &[quote("Be bold", "Life")]);

    // The remembered decision settles the same conflict next time
    let again = client.sync_cycle().await.unwrap();
    assert_eq!(again.conflicts, 0);
    assert_eq!(again.settled, 1);
    assert!(prompts.try_recv().is_err());
}

// ============================================================================
// Remote changes and restarts
// ============================================================================

#[tokio::test]
async fn server_updates_reach_client() {
    let (base, _state) = start_server(vec![quote("A", "X")]).await;
    let (_dir, store) = seeded_store(vec![quote("A", "X")]);
    let client = orchestrator(store, &base, Arc::new(AutoResolver::default()));

    assert!(client.sync_cycle().await.unwrap().is_noop());

    let http = reqwest::Client::new();
    let response = http
        .post(format!("{}/quotes", base))
        .json(&json!({"text": "New one", "category": "Fresh"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let report = client.sync_cycle().await.unwrap();
    assert_eq!(report.additions, 1);
    assert_eq!(
        client.quotes().quotes(),
        &[quote("A", "X"), quote("New one", "Fresh")]
    );
}

#[tokio::test]
async fn state_survives_restart() {
    let (base, _state) = start_server(vec![quote("be bold", "Courage"), quote("B", "Y")]).await;
    let (dir, store) = seeded_store(vec![quote("Be bold", "Life")]);
    let policy = Arc::new(AutoResolver::new(ResolutionPolicy::LocalWins));

    let first = orchestrator(store, &base, policy.clone());
    first.sync_cycle().await.unwrap();
    let merged = first.quotes();
    drop(first);

    let reopened = Arc::new(FileStore::open(dir.path()).unwrap());
    let second = orchestrator(reopened, &base, policy);
    assert_eq!(second.quotes(), merged);
    assert!(second.sync_state().last_sync.is_some());

    let report = second.sync_cycle().await.unwrap();
    assert_eq!(report.conflicts, 0);
    assert_eq!(report.settled, 1);
    assert!(report.is_noop());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn empty_server_leaves_store_untouched() {
    let (base, _state) = start_server(Vec::new()).await;
    let (_dir, store) = seeded_store(vec![quote("A", "X"), quote("B", "Y")]);
    let before = store.get(QUOTES_KEY).unwrap();
    let client = orchestrator(store.clone(), &base, Arc::new(AutoResolver::default()));

    let result = client.sync_cycle().await;
    assert!(matches!(result, Err(SyncError::RemoteUnavailable(_))));

    assert_eq!(store.get(QUOTES_KEY).unwrap(), before);
    assert_eq!(store.get(LAST_SYNC_KEY).unwrap(), None);
    assert_eq!(client.quotes().len(), 2);
}

#[tokio::test]
async fn missing_route_is_unavailable() {
    let (base, _state) = start_server(vec![quote("A", "X")]).await;
    let (_dir, store) = seeded_store(vec![quote("B", "Y")]);
    let remote = HttpRemote::new(format!("{}/nothing-here", base), Duration::from_secs(5)).unwrap();
    let client = SyncOrchestrator::new(
        store,
        Arc::new(remote),
        Arc::new(AutoResolver::default()),
    );

    let result = client.sync_cycle().await;
    assert!(matches!(result, Err(SyncError::RemoteUnavailable(_))));
    assert_eq!(client.quotes().quotes(), &[quote("B", "Y")]);
}

#[tokio::test]
async fn server_emptied_after_first_sync() {
    let (base, state) = start_server(vec![quote("B", "Y")]).await;
    let (_dir, store) = seeded_store(vec![quote("A", "X")]);
    let client = orchestrator(store.clone(), &base, Arc::new(AutoResolver::default()));

    client.sync_cycle().await.unwrap();
    let synced = store.get(QUOTES_KEY).unwrap();

    *state.quotes.write().await = QuoteCollection::new();
    assert!(client.sync_cycle().await.is_err());
    assert_eq!(store.get(QUOTES_KEY).unwrap(), synced);
    assert_eq!(client.quotes().len(), 2);
}
