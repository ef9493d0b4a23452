//! Token-set similarity scoring on a 0-100 scale.
//!
//! `token_set_ratio` compares the *sets* of whitespace-separated tokens, so
//! word order and repetition do not matter and a string that is a token
//! subset of the other scores 100. Character comparison uses the indel
//! ratio `200 * LCS(a, b) / (|a| + |b|)`.

use std::collections::BTreeSet;

/// Length of the longest common subsequence of two char slices.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Normalized indel similarity of two strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

fn join_tokens(tokens: &[&str]) -> String {
    tokens.join(" ")
}

fn concat(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{left} {right}"),
    }
}

pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !intersection.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = join_tokens(&intersection);
    let sect_a = concat(&sect, &join_tokens(&only_a));
    let sect_b = concat(&sect, &join_tokens(&only_b));

    let mut best = ratio(&sect_a, &sect_b);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &sect_a)).max(ratio(&sect, &sect_b));
    }
    best
}

/// Highest-scoring candidate and its score. Ties keep the earliest candidate.
pub fn extract_one<'a, I>(query: &str, candidates: I) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = token_set_ratio(query, candidate);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((candidate, score));
            if score >= 100.0 {
                break;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_ratio() {
        assert!(approx(ratio("vessel", "vessel"), 100.0));
        assert!(approx(ratio("", ""), 100.0));
        assert!(approx(ratio("abc", "xyz"), 0.0));
        // LCS("cradle", "assignedcradle") = 6 -> 200 * 6 / 20
        assert!(approx(ratio("cradle", "assignedcradle"), 60.0));
    }

    #[test]
    fn test_token_set_ratio_subset_scores_full() {
        assert!(approx(token_set_ratio("vessel", "vessel"), 100.0));
        assert!(approx(token_set_ratio("work orders", "orders"), 100.0));
        assert!(approx(token_set_ratio("orders work", "work orders"), 100.0));
    }

    #[test]
    fn test_token_set_ratio_disjoint_single_tokens() {
        // "vessels" vs "vessel": LCS 6 -> 200 * 6 / 13
        let score = token_set_ratio("vessels", "vessel");
        assert!(approx(score, 1200.0 / 13.0));
        assert!(approx(token_set_ratio("5", "status"), 0.0));
    }

    #[test]
    fn test_token_set_ratio_empty_input() {
        assert!(approx(token_set_ratio("", "vessel"), 0.0));
        assert!(approx(token_set_ratio("   ", ""), 0.0));
    }

    #[test]
    fn test_extract_one_prefers_first_on_tie() {
        let candidates = vec!["cradle", "cradle", "vessel"];
        let (best, score) = extract_one("cradle", candidates.iter().copied()).unwrap();
        assert_eq!(best, "cradle");
        assert!(approx(score, 100.0));

        let (best, _) = extract_one("ab", ["ax", "bx"]).unwrap();
        assert_eq!(best, "ax");
    }

    #[test]
    fn test_extract_one_empty_candidates() {
        assert!(extract_one("vessel", Vec::<&str>::new()).is_none());
    }
}
