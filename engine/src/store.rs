//! Store - the ordered, key-unique quote collection.
//!
//! The collection keeps insertion order for display stability while
//! guaranteeing at most one quote per key. Writes to an existing key replace
//! the quote in place.

use crate::{error::Result, record::quote_key, Error, Quote, QuoteKey};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An ordered collection of quotes, unique by key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Quote>", into = "Vec<Quote>")]
pub struct QuoteCollection {
    quotes: Vec<Quote>,
    index: HashMap<QuoteKey, usize>,
}

impl QuoteCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            quotes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a collection from a sequence; later duplicates win.
    pub fn from_quotes(quotes: impl IntoIterator<Item = Quote>) -> Self {
        let mut collection = Self::new();
        for quote in quotes {
            collection.upsert(quote);
        }
        collection
    }

    /// Get a quote by key.
    pub fn get(&self, key: &str) -> Option<&Quote> {
        self.index.get(key).map(|&i| &self.quotes[i])
    }

    /// Check if a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Insert a quote, replacing any quote with the same key in place.
    ///
    /// Returns the replaced quote, if any.
    pub fn upsert(&mut self, quote: Quote) -> Option<Quote> {
        match self.index.get(&quote.key()) {
            Some(&i) => Some(std::mem::replace(&mut self.quotes[i], quote)),
            None => {
                self.index.insert(quote.key(), self.quotes.len());
                self.quotes.push(quote);
                None
            }
        }
    }

    /// Merge a batch into this collection using the import rule: later
    /// entries win on key collision, no conflict detection.
    pub fn union_with(&mut self, quotes: impl IntoIterator<Item = Quote>) -> UnionSummary {
        let mut summary = UnionSummary::default();
        for quote in quotes {
            match self.upsert(quote) {
                Some(_) => summary.replaced += 1,
                None => summary.added += 1,
            }
        }
        summary
    }

    /// All quotes in insertion order.
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// Iterate quotes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.iter()
    }

    /// Count of quotes.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for quote in &self.quotes {
            if !seen.contains(&quote.category.as_str()) {
                seen.push(quote.category.as_str());
            }
        }
        seen
    }

    /// Quotes visible under a filter.
    pub fn filtered(&self, filter: &CategoryFilter) -> Vec<&Quote> {
        self.quotes.iter().filter(|q| filter.matches(q)).collect()
    }

    /// Pick a random quote visible under a filter.
    pub fn pick<R: Rng + ?Sized>(&self, filter: &CategoryFilter, rng: &mut R) -> Option<&Quote> {
        self.filtered(filter).choose(rng).copied()
    }
}

impl PartialEq for QuoteCollection {
    fn eq(&self, other: &Self) -> bool {
        self.quotes == other.quotes
    }
}

impl Eq for QuoteCollection {}

impl From<Vec<Quote>> for QuoteCollection {
    fn from(quotes: Vec<Quote>) -> Self {
        Self::from_quotes(quotes)
    }
}

impl From<QuoteCollection> for Vec<Quote> {
    fn from(collection: QuoteCollection) -> Self {
        collection.quotes
    }
}

impl FromIterator<Quote> for QuoteCollection {
    fn from_iter<I: IntoIterator<Item = Quote>>(iter: I) -> Self {
        Self::from_quotes(iter)
    }
}

impl<'a> IntoIterator for &'a QuoteCollection {
    type Item = &'a Quote;
    type IntoIter = std::slice::Iter<'a, Quote>;

    fn into_iter(self) -> Self::IntoIter {
        self.quotes.iter()
    }
}

/// Counts from [`QuoteCollection::union_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionSummary {
    /// Quotes with a new key
    pub added: usize,
    /// Quotes that overwrote an existing key
    pub replaced: usize,
}

/// Category filter for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryFilter {
    /// Every quote is visible
    #[default]
    All,
    /// Only quotes of this category (case-insensitive)
    Category(String),
}

impl CategoryFilter {
    /// Whether a quote passes this filter.
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(category) => quote.in_category(category),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Category(category) => f.write_str(category),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidFilter("category is empty".into()));
        }
        if quote_key(s) == "all" {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Category(s.to_string()))
        }
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        filter.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quote(text: &str, category: &str) -> Quote {
        Quote::new(text, category).unwrap()
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut collection = QuoteCollection::new();
        collection.upsert(quote("A", "X"));
        collection.upsert(quote("B", "Y"));
        let replaced = collection.upsert(quote("a", "Z"));

        assert_eq!(replaced, Some(quote("A", "X")));
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.quotes()[0], quote("a", "Z"));
        assert_eq!(collection.quotes()[1], quote("B", "Y"));
    }

    #[test]
    fn from_quotes_later_duplicate_wins() {
        let collection =
            QuoteCollection::from_quotes(vec![quote("Hi", "One"), quote("HI", "Two")]);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get("hi"), Some(&quote("HI", "Two")));
    }

    #[test]
    fn union_counts_added_and_replaced() {
        let mut collection = QuoteCollection::from_quotes(vec![quote("A", "X")]);
        let summary = collection.union_with(vec![quote("a", "Y"), quote("B", "Y")]);
        assert_eq!(summary, UnionSummary { added: 1, replaced: 1 });
        assert_eq!(collection.get("a").unwrap().category, "Y");
    }

    #[test]
    fn categories_first_seen_order() {
        let collection = QuoteCollection::from_quotes(vec![
            quote("A", "Life"),
            quote("B", "Wisdom"),
            quote("C", "Life"),
        ]);
        assert_eq!(collection.categories(), vec!["Life", "Wisdom"]);
    }

    #[test]
    fn filter_by_category() {
        let collection = QuoteCollection::from_quotes(vec![
            quote("A", "Life"),
            quote("B", "Wisdom"),
            quote("C", "life"),
        ]);
        let filter: CategoryFilter = "LIFE".parse().unwrap();
        let texts: Vec<_> = collection
            .filtered(&filter)
            .into_iter()
            .map(|q| q.text.as_str())
            .collect();
        assert_eq!(texts, vec!["A", "C"]);
        assert_eq!(collection.filtered(&CategoryFilter::All).len(), 3);
    }

    #[test]
    fn pick_respects_filter() {
        let collection =
            QuoteCollection::from_quotes(vec![quote("A", "Life"), quote("B", "Wisdom")]);
        let mut rng = StdRng::seed_from_u64(7);
        let filter = CategoryFilter::Category("Wisdom".into());
        for _ in 0..10 {
            assert_eq!(collection.pick(&filter, &mut rng).unwrap().text, "B");
        }
        let none = CategoryFilter::Category("Missing".into());
        assert!(collection.pick(&none, &mut rng).is_none());
    }

    #[test]
    fn filter_parsing() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(" ALL ".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            " Life ".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Category("Life".into())
        );
        assert!("  ".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn serializes_as_plain_array() {
        let collection = QuoteCollection::from_quotes(vec![quote("A", "X")]);
        let json = serde_json::to_string(&collection).unwrap();
        assert_eq!(json, r#"[{"text":"A","category":"X"}]"#);

        let parsed: QuoteCollection =
            serde_json::from_str(r#"[{"text":"A","category":"X"},{"text":"a","category":"Y"}]"#)
                .unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get("a").unwrap().category, "Y");
    }
}
