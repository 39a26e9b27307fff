//! Pairwise similarity between tag names
//!
//! Scores are an indel ratio over the normalized names:
//!
//! `ratio(a, b) = 2 · LCS(a, b) / (|a| + |b|)`
//!
//! where `LCS` is the longest common subsequence in characters. This is the
//! edit-distance counterpart of a sequence-alignment ratio (insertions and
//! deletions only), so transpositions, word-order changes and partial
//! substrings lower the score gradually instead of all at once. Unlike a
//! greedy longest-block matcher it is exactly symmetric.

use crate::tag::normalize_name;

/// Similarity of two tag names in `[0, 1]`.
///
/// Case-insensitive and whitespace-trimmed. Two empty names are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize_name(a).chars().collect();
    let b: Vec<char> = normalize_name(b).chars().collect();
    ratio(&a, &b)
}

/// Similarity of two already-normalized names.
///
/// Used on hot paths where both sides were normalized once up front.
pub fn normalized_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio(&a, &b)
}

fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    if a == b {
        return 1.0;
    }
    2.0 * lcs_len(a, b) as f64 / total as f64
}

/// Longest common subsequence length, two-row dynamic programming.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    // Keep the shorter sequence in the inner dimension
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if inner.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; inner.len() + 1];
    let mut curr = vec![0usize; inner.len() + 1];

    for &oc in outer {
        for (j, &ic) in inner.iter().enumerate() {
            curr[j + 1] = if oc == ic {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[inner.len()]
}
