//! # Quotesync Engine
//!
//! A deterministic merge engine for a local-first quote collection.
//!
//! This crate provides the core logic for reconciling a local quote
//! collection against a remote snapshot of the same logical dataset.
//! The same inputs and decisions always produce the same output.
//!
//! ## Design Principles
//!
//! - **No IO**: Engine has no knowledge of files, network, or platform
//! - **Deterministic**: Same inputs always produce same outputs
//! - **Non-destructive**: Inputs are borrowed, results are new values
//!
//! ## Core Concepts
//!
//! ### Quotes and keys
//!
//! A [`Quote`] is a text plus a category. Quotes have no identifier; their
//! merge identity is the lower-cased text, see [`quote_key`]. A
//! [`QuoteCollection`] holds at most one quote per key, in insertion order.
//!
//! ### Merge
//!
//! [`merge`] compares the local collection with a remote snapshot and yields
//! a [`MergeOutcome`]: pure additions plus [`Conflict`]s (same key, different
//! category). Each conflict needs a [`Decision`]:
//! - [`Decision::KeepLocal`] - local quote stays, server quote dropped
//! - [`Decision::KeepServer`] - server quote replaces the local one
//! - [`Decision::KeepBoth`] - server quote kept under a suffixed text
//!
//! Decisions are folded in discovery order with [`MergeOutcome::fold`].
//!
//! ## Quick Start
//!
//! ```rust
//! use quotesync_engine::{merge, Decision, Quote, QuoteCollection};
//!
//! let local: QuoteCollection = vec![Quote::new("Be bold", "Life").unwrap()].into();
//! let remote = vec![Quote::new("be bold", "Courage").unwrap()];
//!
//! let outcome = merge(&local, &remote);
//! assert_eq!(outcome.conflicts().len(), 1);
//!
//! let result = outcome.fold(&[Decision::KeepServer]).unwrap();
//! assert_eq!(result.merged.quotes(), &[Quote::new("be bold", "Courage").unwrap()]);
//! ```
//!
//! ## Persistence
//!
//! Use [`QuoteSnapshot`], [`SyncState`] and the storage keys in [`snapshot`]
//! to turn state into text for a key-value store.

pub mod error;
pub mod import;
pub mod reconcile;
pub mod record;
pub mod resolution;
pub mod snapshot;
pub mod store;

// Re-export main types at crate root
pub use error::Error;
pub use import::{export_json, parse_import, quote_from_value, ParsedImport};
pub use reconcile::{merge, Conflict, MergeOutcome, MergeResult};
pub use record::{quote_key, Quote};
pub use resolution::{Decision, LedgerEntry, ResolutionLedger, ResolutionPolicy};
pub use snapshot::{default_quotes, QuoteSnapshot, SyncState, SNAPSHOT_FORMAT_VERSION};
pub use store::{CategoryFilter, QuoteCollection, UnionSummary};

/// Merge identity of a quote: its lower-cased text.
pub type QuoteKey = String;
