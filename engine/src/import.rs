//! File import and export of quote lists.
//!
//! The exchange format is a JSON array of `{"text", "category"}` objects.
//! Imported entries failing the shape check are skipped; an import with no
//! valid entry at all is rejected.

use crate::{error::Result, Error, Quote, QuoteCollection};
use serde_json::Value;

/// Valid quotes read from an import, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedImport {
    /// Quotes that passed the shape check
    pub quotes: Vec<Quote>,
    /// Entries that were dropped
    pub skipped: usize,
}

/// Parse import text into quotes.
pub fn parse_import(json: &str) -> Result<ParsedImport> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| Error::MalformedImport(e.to_string()))?;

    let entries = match value {
        Value::Array(entries) => entries,
        _ => return Err(Error::MalformedImport("expected a JSON array".into())),
    };

    let total = entries.len();
    let quotes: Vec<Quote> = entries.iter().filter_map(quote_from_value).collect();

    if quotes.is_empty() {
        return Err(Error::MalformedImport(format!(
            "no valid quotes among {} entries",
            total
        )));
    }

    Ok(ParsedImport {
        skipped: total - quotes.len(),
        quotes,
    })
}

/// Shape check for a single entry: an object with non-empty string
/// `text` and `category`.
pub fn quote_from_value(value: &Value) -> Option<Quote> {
    let text = value.get("text")?.as_str()?;
    let category = value.get("category")?.as_str()?;
    Quote::new(text, category).ok()
}

/// Serialize a collection in the import format.
pub fn export_json(collection: &QuoteCollection) -> Result<String> {
    serde_json::to_string_pretty(collection.quotes())
        .map_err(|e| Error::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_import() {
        let parsed =
            parse_import(r#"[{"text":"A","category":"X"},{"text":" B ","category":"Y"}]"#)
                .unwrap();
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.quotes[1], Quote::new("B", "Y").unwrap());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let parsed = parse_import(
            r#"[
                {"text":"A","category":"X"},
                {"text":"","category":"X"},
                {"text":"B"},
                {"text":3,"category":"X"},
                "just a string",
                null
            ]"#,
        )
        .unwrap();
        assert_eq!(parsed.quotes, vec![Quote::new("A", "X").unwrap()]);
        assert_eq!(parsed.skipped, 5);
    }

    #[test]
    fn empty_valid_subset_rejected() {
        let result = parse_import(r#"[{"text":""}, 1]"#);
        assert!(matches!(result, Err(Error::MalformedImport(_))));

        let result = parse_import("[]");
        assert!(matches!(result, Err(Error::MalformedImport(_))));
    }

    #[test]
    fn non_array_rejected() {
        assert!(matches!(
            parse_import(r#"{"text":"A","category":"X"}"#),
            Err(Error::MalformedImport(_))
        ));
        assert!(matches!(
            parse_import("not json"),
            Err(Error::MalformedImport(_))
        ));
    }

    #[test]
    fn export_is_importable() {
        let collection = QuoteCollection::from_quotes(vec![
            Quote::new("A", "X").unwrap(),
            Quote::new("B", "Y").unwrap(),
        ]);
        let json = export_json(&collection).unwrap();
        let parsed = parse_import(&json).unwrap();
        assert_eq!(QuoteCollection::from_quotes(parsed.quotes), collection);
    }
}
