//! Fuzzy duplicate detection for candidate titles.
//!
//! Titles are compared case-insensitively with a 0-100 similarity ratio based
//! on insertion/deletion edit distance:
//!
//! ```text
//! ratio = 100 * (1 - indel(a, b) / (len(a) + len(b)))
//! ```
//!
//! A candidate counts as a repost when its ratio against any remembered title
//! exceeds [`SIMILARITY_THRESHOLD`].

use tracing::info;

/// Ratio above which two titles are considered the same story.
pub const SIMILARITY_THRESHOLD: u8 = 85;

/// Case-insensitive similarity of two strings on a 0-100 scale.
///
/// Symmetric; two empty strings are identical (100).
pub fn similarity(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    let indel = total - 2 * lcs_len(&a, &b);
    let ratio = 100.0 * (1.0 - indel as f64 / total as f64);
    ratio.round() as u8
}

/// Length of the longest common subsequence, two-row dynamic programming.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];
    for &x in long {
        for (j, &y) in short.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}

/// Whether `candidate` is a near-duplicate of any title in `history`.
///
/// Stops at the first match.
pub fn is_duplicate<S: AsRef<str>>(candidate: &str, history: &[S]) -> bool {
    history.iter().any(|old| {
        let old: &str = old.as_ref();
        let score = similarity(candidate, old);
        if score > SIMILARITY_THRESHOLD {
            info!(candidate, previous = old, score, "Duplicate title");
            true
        } else {
            false
        }
    })
}
