//! Relevance scoring for search candidates
//!
//! One deterministic policy: 10 points per matched query token, +20 when
//! the whole query phrase appears verbatim in the normalized title, +8 per
//! exactly-matched numeric token. Numeric tokens disambiguate product
//! variants ("iphone 15" vs "iPhone 14"), so they carry extra weight.
//! Multi-token queries must match at least two distinct tokens to be
//! eligible at all; that alone removes most accessory noise.

use crate::types::SearchCandidate;
use std::collections::HashSet;

/// Words too generic to signal relevance on marketplace titles
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "or", "the", "for", "to", "of", "in", "on", "with", "buy", "sale", "used",
    "new", "brand", "original", "london", "lagos", "abuja", "nigeria", "naija",
];

/// Cap on query tokens to keep long queries from turning into noise
const MAX_QUERY_TOKENS: usize = 12;

const TOKEN_SCORE: i64 = 10;
const PHRASE_BONUS: i64 = 20;
const NUMERIC_BONUS: i64 = 8;

/// Lowercase, strip punctuation and currency symbols, collapse whitespace
pub fn normalize_text(s: &str) -> String {
    let mapped: String = s
        .chars()
        .flat_map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                vec![' ']
            }
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Query tokens with stopwords dropped, capped at [`MAX_QUERY_TOKENS`]
pub fn tokenize_query(query: &str) -> Vec<String> {
    normalize_text(query)
        .split_whitespace()
        .filter(|t| !STOPWORDS.contains(t))
        .take(MAX_QUERY_TOKENS)
        .map(str::to_string)
        .collect()
}

/// Score one title against the query tokens; returns (score, distinct matches)
fn score_title(query_tokens: &[String], title: &str) -> (i64, usize) {
    if title.is_empty() {
        return (0, 0);
    }

    let title_norm = normalize_text(title);
    let title_tokens: HashSet<&str> = title_norm.split_whitespace().collect();
    let unique: HashSet<&str> = query_tokens.iter().map(String::as_str).collect();

    let mut score = 0;
    let mut matches = 0;
    for token in &unique {
        if title_tokens.contains(token) {
            matches += 1;
            score += TOKEN_SCORE;
            if token.chars().all(|c| c.is_ascii_digit()) {
                score += NUMERIC_BONUS;
            }
        }
    }

    let phrase = query_tokens.join(" ");
    if !phrase.is_empty() && title_norm.contains(&phrase) {
        score += PHRASE_BONUS;
    }

    (score, matches)
}

/// Filter, score and order candidates; the output is at most `limit` long.
///
/// A price ceiling excludes candidates with no detectable price: an unknown
/// price cannot be proven to satisfy the constraint.
pub fn rank(
    candidates: Vec<SearchCandidate>,
    query: &str,
    max_price: Option<f64>,
    limit: usize,
) -> Vec<SearchCandidate> {
    let query_tokens = tokenize_query(query);
    if query_tokens.is_empty() {
        return Vec::new();
    }
    let required_matches = query_tokens.len().min(2);

    let mut scored: Vec<(i64, usize, SearchCandidate)> = Vec::new();
    for candidate in candidates {
        if let Some(cap) = max_price {
            match candidate.price {
                Some(p) if p <= cap => {}
                _ => continue,
            }
        }

        let title = candidate.title.as_deref().unwrap_or("");
        let (score, matches) = score_title(&query_tokens, title);
        if matches < required_matches {
            continue;
        }
        scored.push((score, matches, candidate));
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
    scored
        .into_iter()
        .take(limit.clamp(1, 100))
        .map(|(_, _, c)| c)
        .collect()
}
