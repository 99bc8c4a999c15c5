//! Edge case tests for quotesync-engine
//!
//! These tests cover boundary conditions and unusual inputs.

use quotesync_engine::{
    merge, parse_import, CategoryFilter, Decision, Quote, QuoteCollection, QuoteSnapshot,
    ResolutionLedger,
};

fn quote(text: &str, category: &str) -> Quote {
    Quote::new(text, category).unwrap()
}

fn collection(quotes: &[(&str, &str)]) -> QuoteCollection {
    quotes.iter().map(|(t, c)| quote(t, c)).collect()
}

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn unicode_keys() {
    let local = collection(&[("ÜBER ALLES", "Deutsch"), ("日本語テスト", "日本")]);
    let remote = vec![quote("über alles", "Deutsch"), quote("日本語テスト", "日本")];

    let outcome = merge(&local, &remote);
    assert!(outcome.is_clean());
    assert!(outcome.additions().is_empty());
}

#[test]
fn whitespace_only_differences_are_trimmed() {
    let local = collection(&[("Be bold", "Life")]);
    let remote = vec![quote("   Be bold\n", " Life ")];

    let outcome = merge(&local, &remote);
    assert!(outcome.is_clean());
    assert!(outcome.additions().is_empty());
}

#[test]
fn category_case_difference_is_a_conflict() {
    // Categories compare exactly during merge
    let local = collection(&[("Be bold", "Life")]);
    let remote = vec![quote("Be bold", "life")];

    assert_eq!(merge(&local, &remote).conflicts().len(), 1);
}

#[test]
fn very_long_text() {
    let long_text = "x".repeat(1024 * 1024);
    let local = collection(&[(&long_text, "Long")]);
    let remote = vec![quote(&long_text.to_uppercase(), "Longer")];

    let result = merge(&local, &remote)
        .fold(&[Decision::KeepBoth])
        .unwrap();
    assert_eq!(result.merged.len(), 2);
}

// ============================================================================
// Collection Edge Cases
// ============================================================================

#[test]
fn both_sides_empty() {
    let result = merge(&QuoteCollection::new(), &[]).fold(&[]).unwrap();
    assert!(result.merged.is_empty());
}

#[test]
fn remote_duplicates_collapse_before_conflict_detection() {
    let local = collection(&[("Be bold", "Life")]);
    // Only the later remote entry counts
    let remote = vec![quote("be bold", "Courage"), quote("BE BOLD", "Life")];

    let outcome = merge(&local, &remote);
    assert!(outcome.is_clean());
    assert_eq!(outcome.fold(&[]).unwrap().merged, local);
}

#[test]
fn addition_colliding_with_disambiguated_text() {
    let local = collection(&[("Be bold", "Life")]);
    let remote = vec![
        quote("be bold", "Courage"),
        quote("be bold (server)", "Unrelated"),
    ];

    let result = merge(&local, &remote)
        .fold(&[Decision::KeepBoth])
        .unwrap();
    assert_eq!(
        result.merged,
        collection(&[
            ("Be bold", "Life"),
            ("be bold (server)", "Unrelated"),
            ("be bold (server 2)", "Courage"),
        ])
    );
}

#[test]
fn many_conflicts_resolved_independently() {
    let local: QuoteCollection = (0..100)
        .map(|i| quote(&format!("Quote {}", i), "Local"))
        .collect();
    let remote: Vec<Quote> = (0..100)
        .map(|i| quote(&format!("quote {}", i), "Server"))
        .collect();

    let outcome = merge(&local, &remote);
    assert_eq!(outcome.conflicts().len(), 100);

    let decisions: Vec<Decision> = (0..100)
        .map(|i| match i % 3 {
            0 => Decision::KeepLocal,
            1 => Decision::KeepServer,
            _ => Decision::KeepBoth,
        })
        .collect();
    let result = outcome.fold(&decisions).unwrap();

    assert_eq!(result.kept_local, 34);
    assert_eq!(result.kept_server, 33);
    assert_eq!(result.kept_both, 33);
    assert_eq!(result.merged.len(), 133);
}

// ============================================================================
// Ledger Replay
// ============================================================================

#[test]
fn ledger_replay_makes_second_merge_a_no_op() {
    let local = collection(&[("Be bold", "Life"), ("Stay", "Calm")]);
    let remote = vec![quote("be bold", "Courage"), quote("New", "Fresh")];

    for decision in [Decision::KeepLocal, Decision::KeepServer, Decision::KeepBoth] {
        let mut ledger = ResolutionLedger::new();
        let first = merge(&local, &remote);
        for conflict in first.conflicts() {
            ledger.record(conflict, decision);
        }
        let merged_once = first.fold(&[decision]).unwrap().merged;

        let second = merge(&merged_once, &remote);
        assert!(second.additions().is_empty());
        let replayed: Vec<Decision> = second
            .conflicts()
            .iter()
            .map(|c| ledger.lookup(c).unwrap())
            .collect();
        let merged_twice = second.fold(&replayed).unwrap().merged;

        assert_eq!(merged_twice, merged_once, "not idempotent for {}", decision);
    }
}

// ============================================================================
// Persistence and Import
// ============================================================================

#[test]
fn snapshot_keeps_display_order() {
    let quotes = collection(&[("Zeta", "Z"), ("Alpha", "A"), ("Mid", "M")]);
    let json = QuoteSnapshot::new(quotes.clone()).to_json().unwrap();
    let restored = QuoteSnapshot::from_json(&json).unwrap();

    let texts: Vec<_> = restored.quotes.iter().map(|q| q.text.as_str()).collect();
    assert_eq!(texts, vec!["Zeta", "Alpha", "Mid"]);
}

#[test]
fn import_later_entries_win() {
    let parsed = parse_import(
        r#"[{"text":"Hi","category":"One"},{"text":"hi","category":"Two"}]"#,
    )
    .unwrap();

    let mut local = collection(&[("HI", "Zero"), ("Other", "X")]);
    let summary = local.union_with(parsed.quotes);
    assert_eq!(summary.replaced, 2);
    assert_eq!(local.get("hi"), Some(&quote("hi", "Two")));
    assert_eq!(local.quotes()[0].category, "Two");
}

#[test]
fn filter_of_unknown_category_is_empty() {
    let quotes = collection(&[("A", "Life")]);
    let filter = CategoryFilter::Category("Nope".into());
    assert!(quotes.filtered(&filter).is_empty());
}
