//! Fuzzy Coin Matching
//!
//! Resolves free-text coin names against the catalog. Each entry is scored
//! by the best similarity of its name, symbol, and id to the query, and the
//! scan keeps every entry whose score reaches the highest score seen so far.
//! Entries seen early with a mediocre score therefore survive alongside the
//! final best ones; callers receive near-best candidates, not a single hit.

use crate::model::CatalogEntry;

/// Ratcliff/Obershelp similarity of two strings in `[0, 1]`.
///
/// `2 * M / T` where `T` is the total number of characters and `M` the
/// characters covered by matching blocks. Two empty strings score 1.0.
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Characters covered by the recursive longest-common-substring blocks
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common block in `a[alo..ahi]` and `b[blo..bhi]`; ties go to the
/// earliest start in `a`, then in `b`.
fn longest_match(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);

    for i in alo..ahi {
        for j in blo..bhi {
            let mut k = 0;
            while i + k < ahi && j + k < bhi && a[i + k] == b[j + k] {
                k += 1;
            }
            if k > best_k {
                (best_i, best_j, best_k) = (i, j, k);
            }
        }
    }

    (best_i, best_j, best_k)
}

/// Score of an entry: the best of its name, symbol and id
fn entry_score(query: &str, entry: &CatalogEntry) -> f64 {
    [&entry.name, &entry.symbol, &entry.id]
        .into_iter()
        .map(|field| similarity(query, &field.to_lowercase()))
        .fold(0.0, f64::max)
}

fn accumulate<'a>(
    query: &str,
    catalog: &'a [CatalogEntry],
    pick: impl Fn(&'a CatalogEntry) -> &'a str,
) -> Vec<String> {
    let query = query.to_lowercase();
    let mut highest = 0.0;
    let mut matches: Vec<String> = Vec::new();

    for entry in catalog {
        let score = entry_score(&query, entry);
        if score >= highest {
            highest = score;
            let value = pick(entry);
            if !matches.iter().any(|m| m == value) {
                matches.push(value.to_string());
            }
        }
    }

    matches
}

/// Identifiers of the near-best catalog entries for `query`
pub fn best_matches(query: &str, catalog: &[CatalogEntry]) -> Vec<String> {
    accumulate(query, catalog, |entry| entry.id.as_str())
}

/// Same selection as [`best_matches`], returning symbols instead of ids
pub fn best_match_symbols(query: &str, catalog: &[CatalogEntry]) -> Vec<String> {
    accumulate(query, catalog, |entry| entry.symbol.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new("bitcoin-cash", "Bitcoin Cash", "bch"),
            CatalogEntry::new("solana", "Solana", "sol"),
            CatalogEntry::new("bitcoin", "Bitcoin", "btc"),
            CatalogEntry::new("wrapped-bitcoin", "Wrapped Bitcoin", "wbtc"),
            CatalogEntry::new("sol-wormhole", "Wrapped SOL (Wormhole)", "sol"),
        ]
    }

    #[test]
    fn test_similarity_ratio() {
        assert!((similarity("abcd", "bcde") - 0.75).abs() < 1e-9);
        assert!((similarity("bitcoin", "bitcoin") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
        assert!(similarity("", "btc").abs() < f64::EPSILON);
        assert!(similarity("eth", "sol").abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_matches_gestalt_blocks() {
        // "ab" then "cd", four matched characters out of twelve
        assert!((similarity("qabxcd", "abycdf") - 2.0 * 4.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_exact_entry_is_included() {
        let matches = best_matches("bitcoin", &catalog());
        assert!(matches.contains(&"bitcoin".to_string()));
    }

    #[test]
    fn test_accumulates_running_best() {
        // bitcoin-cash scores first (threshold rises), solana scores lower and
        // is skipped, bitcoin is exact, the rest fall below 1.0
        let matches = best_matches("Bitcoin", &catalog());
        assert_eq!(matches, vec!["bitcoin-cash", "bitcoin"]);
    }

    #[test]
    fn test_results_are_catalog_ids_without_duplicates() {
        let catalog = catalog();
        for query in ["", "sol", "btc", "wrapped", "zzz"] {
            let matches = best_matches(query, &catalog);
            for id in &matches {
                assert!(catalog.iter().any(|e| &e.id == id));
            }
            let unique: HashSet<&String> = matches.iter().collect();
            assert_eq!(unique.len(), matches.len());
        }
    }

    #[test]
    fn test_symbol_variant_deduplicates() {
        let symbols = best_match_symbols("sol", &catalog());
        assert_eq!(symbols, vec!["bch", "sol"]);
    }

    #[test]
    fn test_repeated_symbols_are_reported_once() {
        // two "sol" entries with an exact name hit between them
        let catalog = vec![
            CatalogEntry::new("solana", "Solana", "sol"),
            CatalogEntry::new("sol-token", "SOL", "xsol"),
            CatalogEntry::new("sol-wormhole", "Wrapped SOL (Wormhole)", "sol"),
        ];

        assert_eq!(best_match_symbols("sol", &catalog), vec!["sol", "xsol"]);
        assert_eq!(best_matches("sol", &catalog), vec!["solana", "sol-token", "sol-wormhole"]);
    }

    #[test]
    fn test_empty_catalog() {
        assert!(best_matches("bitcoin", &[]).is_empty());
    }
}
