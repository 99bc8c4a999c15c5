//! Conflict decisions, automatic policies and remembered resolutions.

use crate::{error::Result, Conflict, Error, QuoteCollection, QuoteKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome chosen for a single conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Keep the local quote, discard the server one
    KeepLocal,
    /// Keep the server quote, discard the local one
    KeepServer,
    /// Keep the local quote and a disambiguated copy of the server one
    KeepBoth,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::KeepLocal => "keep_local",
            Decision::KeepServer => "keep_server",
            Decision::KeepBoth => "keep_both",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "keep_local" | "local" | "l" => Ok(Decision::KeepLocal),
            "keep_server" | "server" | "remote" | "s" => Ok(Decision::KeepServer),
            "keep_both" | "both" | "b" => Ok(Decision::KeepBoth),
            other => Err(Error::Unrecognized(format!("decision: {}", other))),
        }
    }
}

/// Fixed policy used when no human is asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPolicy {
    /// The server copy wins (default)
    #[default]
    ServerWins,
    /// The local copy wins
    LocalWins,
    /// Both copies are kept
    KeepBoth,
}

impl ResolutionPolicy {
    /// The decision this policy takes for any conflict.
    pub fn decide(&self, _conflict: &Conflict) -> Decision {
        match self {
            ResolutionPolicy::ServerWins => Decision::KeepServer,
            ResolutionPolicy::LocalWins => Decision::KeepLocal,
            ResolutionPolicy::KeepBoth => Decision::KeepBoth,
        }
    }
}

impl FromStr for ResolutionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "server-wins" | "server" => Ok(ResolutionPolicy::ServerWins),
            "local-wins" | "local" => Ok(ResolutionPolicy::LocalWins),
            "keep-both" | "both" => Ok(ResolutionPolicy::KeepBoth),
            other => Err(Error::Unrecognized(format!(
                "resolution policy: {}",
                other
            ))),
        }
    }
}

/// A decision remembered for one exact conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub key: QuoteKey,
    pub local_category: String,
    pub server_category: String,
    pub decision: Decision,
}

impl LedgerEntry {
    fn matches(&self, conflict: &Conflict) -> bool {
        self.key == conflict.key
            && self.local_category == conflict.local.category
            && self.server_category == conflict.server.category
    }
}

/// Decisions already taken, so an unchanged conflict is not asked twice.
///
/// Entries match on key plus both categories; any change on either side
/// makes the conflict new again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionLedger {
    entries: Vec<LedgerEntry>,
}

impl ResolutionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The remembered decision for a conflict, if any.
    pub fn lookup(&self, conflict: &Conflict) -> Option<Decision> {
        self.entries
            .iter()
            .find(|e| e.matches(conflict))
            .map(|e| e.decision)
    }

    /// Remember a decision, replacing an entry for the same conflict.
    pub fn record(&mut self, conflict: &Conflict, decision: Decision) {
        match self.entries.iter_mut().find(|e| e.matches(conflict)) {
            Some(entry) => entry.decision = decision,
            None => self.entries.push(LedgerEntry {
                key: conflict.key.clone(),
                local_category: conflict.local.category.clone(),
                server_category: conflict.server.category.clone(),
                decision,
            }),
        }
    }

    /// Drop every entry for `key`. Returns whether anything was dropped.
    pub fn forget(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        self.entries.len() != before
    }

    /// Drop entries whose key is no longer in the collection.
    pub fn prune(&mut self, collection: &QuoteCollection) {
        self.entries.retain(|e| collection.contains_key(&e.key));
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
