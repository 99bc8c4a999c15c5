//! Quote records and merge identity.

use crate::{error::Result, Error, QuoteKey};
use serde::{Deserialize, Serialize};

/// Derive the merge key for a quote text.
///
/// Two quotes whose texts differ only in letter case share a key and are
/// treated as the same entity during merge and import.
pub fn quote_key(text: &str) -> QuoteKey {
    text.to_lowercase()
}

/// A quote: the unit of storage and merge.
///
/// Both fields are trimmed and non-empty for any value built through
/// [`Quote::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// The quotation itself
    pub text: String,
    /// Free-form category label
    pub category: String,
}

impl Quote {
    /// Create a quote, trimming both fields.
    pub fn new(text: impl AsRef<str>, category: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref().trim();
        let category = category.as_ref().trim();

        if text.is_empty() {
            return Err(Error::InvalidQuote("text is empty".into()));
        }
        if category.is_empty() {
            return Err(Error::InvalidQuote("category is empty".into()));
        }

        Ok(Self {
            text: text.to_string(),
            category: category.to_string(),
        })
    }

    /// Re-validate a quote that was built or deserialized without [`Quote::new`].
    pub fn normalized(self) -> Result<Self> {
        Self::new(&self.text, &self.category)
    }

    /// The merge key of this quote.
    pub fn key(&self) -> QuoteKey {
        quote_key(&self.text)
    }

    /// Whether the category matches, ignoring case.
    pub fn in_category(&self, category: &str) -> bool {
        self.category.to_lowercase() == category.to_lowercase()
    }
}
