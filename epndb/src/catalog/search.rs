///! Search engine for pulsar name matching
use strsim::jaro_winkler;

use super::types::Pulsar;

/// Default similarity threshold for fuzzy matching
pub const DEFAULT_THRESHOLD: f64 = 0.85;

/// Search for pulsars matching the query.
///
/// # Search Priority
/// 1. Exact match on the J2000 name
/// 2. Exact match on the B1950 alias
/// 3. Fuzzy match (Jaro-Winkler similarity >= threshold)
///
/// Matching is case-insensitive and ignores punctuation and whitespace.
/// Returns the J-names of the matches, ordered by relevance.
pub fn search_pulsars(query: &str, pulsars: &[Pulsar], threshold: f64) -> Vec<String> {
    let hard_matches = hard_match(query, pulsars);
    if !hard_matches.is_empty() {
        return hard_matches;
    }

    fuzzy_match(query, pulsars, threshold)
        .into_iter()
        .map(|(_, name)| name)
        .collect()
}

/// Hard match: exact match on J-name or B-name alias
fn hard_match(query: &str, pulsars: &[Pulsar]) -> Vec<String> {
    let normalized_query = normalize_name(query);
    let mut results = Vec::new();

    for psr in pulsars {
        if normalize_name(&psr.jname) == normalized_query {
            results.push(psr.jname.clone());
            continue;
        }

        if let Some(ref bname) = psr.bname {
            if normalize_name(bname) == normalized_query {
                results.push(psr.jname.clone());
            }
        }
    }

    results
}

/// Fuzzy match using Jaro-Winkler similarity
fn fuzzy_match(query: &str, pulsars: &[Pulsar], threshold: f64) -> Vec<(f64, String)> {
    let query_lower = query.to_lowercase();
    let mut matches: Vec<(f64, String)> = Vec::new();

    for psr in pulsars {
        let mut best_score: f64 = jaro_winkler(&query_lower, &psr.jname.to_lowercase());

        if let Some(ref bname) = psr.bname {
            let score = jaro_winkler(&query_lower, &bname.to_lowercase());
            best_score = best_score.max(score);
        }

        if best_score >= threshold {
            matches.push((best_score, psr.jname.clone()));
        }
    }

    // Sort by score descending
    matches.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    matches
}

/// Normalize a name for matching (lowercase, remove punctuation and whitespace)
pub fn normalize_name(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation() && !c.is_whitespace())
        .collect()
}

/// Search multiple queries (separated by '/')
///
/// Returns the unique matches of every query, in order of first appearance.
pub fn search_multiple(input: &str, pulsars: &[Pulsar], threshold: f64) -> Vec<String> {
    let queries: Vec<&str> = input.split('/').map(|s| s.trim()).collect();
    let mut results = Vec::new();

    for query in queries {
        if query.is_empty() {
            continue;
        }

        for name in search_pulsars(query, pulsars, threshold) {
            if !results.contains(&name) {
                results.push(name);
            }
        }
    }

    results
}
