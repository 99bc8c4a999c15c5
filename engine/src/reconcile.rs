//! Reconciliation of a local collection against a remote snapshot.
//!
//! This is the core of determinism. Given the local collection and a remote
//! snapshot, this module detects additions and conflicts, then folds the
//! decisions taken for each conflict into a new collection.
//!
//! # Algorithm
//!
//! 1. De-duplicate the remote snapshot by key (later entries win)
//! 2. Walk the remote quotes in order, looking each key up in the local collection
//! 3. Unknown keys are pure additions; differing categories are conflicts
//! 4. Non-conflicting local quotes pass through unchanged, in local order
//! 5. Conflicting keys keep their local slot until a decision fills it
//!
//! Neither input is mutated; the merged collection is always a new value.

use crate::{
    error::Result, record::quote_key, resolution::Decision, Error, Quote, QuoteCollection,
    QuoteKey,
};
use serde::{Deserialize, Serialize};

/// Suffix appended to a server quote kept alongside a local one.
pub const KEEP_BOTH_SUFFIX: &str = "server";

/// Two quotes sharing a key but differing in category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    /// The shared key
    pub key: QuoteKey,
    /// The local quote
    pub local: Quote,
    /// The quote from the remote snapshot
    pub server: Quote,
}

/// Position of a quote in the output order.
#[derive(Debug, Clone)]
enum Slot {
    Settled(Quote),
    Pending(usize),
}

/// Result of the detection phase, awaiting one decision per conflict.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    slots: Vec<Slot>,
    conflicts: Vec<Conflict>,
    additions: Vec<Quote>,
}

/// The folded collection and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// The reconciled collection
    pub merged: QuoteCollection,
    /// Remote quotes with keys unknown locally
    pub additions: usize,
    /// Conflicts resolved in favour of the local quote
    pub kept_local: usize,
    /// Conflicts resolved in favour of the server quote
    pub kept_server: usize,
    /// Conflicts where both quotes were retained
    pub kept_both: usize,
}

/// Detect additions and conflicts between `local` and `remote`.
pub fn merge(local: &QuoteCollection, remote: &[Quote]) -> MergeOutcome {
    let remote = QuoteCollection::from_quotes(remote.iter().cloned());

    let mut conflicts = Vec::new();
    let mut additions = Vec::new();
    let mut pending_by_key = std::collections::HashMap::new();

    for server in remote.iter() {
        match local.get(&server.key()) {
            None => additions.push(server.clone()),
            Some(existing) if existing.category != server.category => {
                pending_by_key.insert(server.key(), conflicts.len());
                conflicts.push(Conflict {
                    key: server.key(),
                    local: existing.clone(),
                    server: server.clone(),
                });
            }
            // Same category: the local copy is retained as is
            Some(_) => {}
        }
    }

    let slots = local
        .iter()
        .map(|quote| match pending_by_key.get(&quote.key()) {
            Some(&index) => Slot::Pending(index),
            None => Slot::Settled(quote.clone()),
        })
        .collect();

    MergeOutcome {
        slots,
        conflicts,
        additions,
    }
}

impl MergeOutcome {
    /// Conflicts in discovery order (the order of the remote snapshot).
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Remote quotes with no local counterpart.
    pub fn additions(&self) -> &[Quote] {
        &self.additions
    }

    /// True when nothing needs a decision.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Fold one decision per conflict, in discovery order, into the output.
    pub fn fold(self, decisions: &[Decision]) -> Result<MergeResult> {
        if decisions.len() != self.conflicts.len() {
            return Err(Error::DecisionMismatch {
                expected: self.conflicts.len(),
                actual: decisions.len(),
            });
        }

        let mut merged = QuoteCollection::new();
        let mut kept_aside = Vec::new();
        let (mut kept_local, mut kept_server, mut kept_both) = (0, 0, 0);

        for slot in self.slots {
            let index = match slot {
                Slot::Settled(quote) => {
                    merged.upsert(quote);
                    continue;
                }
                Slot::Pending(index) => index,
            };

            let conflict = &self.conflicts[index];
            match decisions[index] {
                Decision::KeepLocal => {
                    kept_local += 1;
                    merged.upsert(conflict.local.clone());
                }
                Decision::KeepServer => {
                    kept_server += 1;
                    merged.upsert(conflict.server.clone());
                }
                Decision::KeepBoth => {
                    kept_both += 1;
                    merged.upsert(conflict.local.clone());
                    kept_aside.push(conflict.server.clone());
                }
            }
        }

        let additions = self.additions.len();
        for quote in self.additions {
            merged.upsert(quote);
        }

        for server in kept_aside {
            keep_alongside(&mut merged, server);
        }

        Ok(MergeResult {
            merged,
            additions,
            kept_local,
            kept_server,
            kept_both,
        })
    }
}

/// Candidate text for the `attempt`-th disambiguation of a server quote.
pub fn disambiguated_text(text: &str, attempt: usize) -> String {
    if attempt <= 1 {
        format!("{} ({})", text, KEEP_BOTH_SUFFIX)
    } else {
        format!("{} ({} {})", text, KEEP_BOTH_SUFFIX, attempt)
    }
}

/// Insert `server` under the first free disambiguated key.
///
/// A candidate key already holding the same category counts as the quote
/// having been kept before, so repeated folds do not grow the collection.
fn keep_alongside(merged: &mut QuoteCollection, server: Quote) {
    let mut attempt = 1;
    loop {
        let text = disambiguated_text(&server.text, attempt);
        match merged.get(&quote_key(&text)) {
            None => {
                merged.upsert(Quote {
                    text,
                    category: server.category,
                });
                return;
            }
            Some(existing) if existing.category == server.category => return,
            Some(_) => attempt += 1,
        }
    }
}
