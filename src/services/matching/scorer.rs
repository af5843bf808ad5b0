//! Composite name similarity.
//!
//! **Signals** (all computed on already-normalized names):
//! 1. Token-set similarity — order/duplicate-insensitive overlap, weight 0.5
//! 2. Partial similarity — best-aligned substring, weight 0.2
//! 3. Phonetic similarity — consonant skeletons compared, weight 0.2
//! 4. Initials bonus — flat +20 when one name's initials contain the other's
//!
//! The underlying ratio is rapidfuzz's normalized indel similarity, scaled
//! to `[0, 100]` and computed over chars.

use rapidfuzz::fuzz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TOKEN_SET_WEIGHT: f64 = 0.5;
pub const PARTIAL_WEIGHT: f64 = 0.2;
pub const PHONETIC_WEIGHT: f64 = 0.2;
pub const INITIALS_BONUS: f64 = 20.0;

/// Upper bound of [`score`].
pub const MAX_SCORE: f64 = 120.0;

/// Vowels dropped after the first character of a phonetic skeleton.
const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'ä', 'ö', 'ü'];

/// Applied in order, each as a literal replace-all.
const PHONETIC_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("z", "s"),
    ("c", "k"),
    ("v", "f"),
    ("w", "v"),
    ("ph", "f"),
    ("dt", "t"),
    ("th", "t"),
];

// ─── Result Types ────────────────────────────────────────────────────────────

/// Per-signal breakdown of one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub token_set: f64,
    pub partial: f64,
    pub phonetic: f64,
    pub initials_bonus: f64,
    pub total: f64,
}

impl MatchScore {
    fn zero() -> Self {
        Self {
            token_set: 0.0,
            partial: 0.0,
            phonetic: 0.0,
            initials_bonus: 0.0,
            total: 0.0,
        }
    }
}

// ─── Composite ───────────────────────────────────────────────────────────────

/// Composite similarity of two normalized names, in `[0, 120]`.
///
/// Never fails; an empty name on either side scores 0.
pub fn score(name_a: &str, name_b: &str) -> f64 {
    score_breakdown(name_a, name_b).total
}

pub fn score_breakdown(name_a: &str, name_b: &str) -> MatchScore {
    if name_a.trim().is_empty() || name_b.trim().is_empty() {
        return MatchScore::zero();
    }

    let token_set = token_set_ratio(name_a, name_b);
    let partial = partial_ratio(name_a, name_b);
    let phonetic = phonetic_similarity(name_a, name_b);
    let initials_bonus = if initials_match(name_a, name_b) {
        INITIALS_BONUS
    } else {
        0.0
    };

    let total = token_set * TOKEN_SET_WEIGHT
        + partial * PARTIAL_WEIGHT
        + phonetic * PHONETIC_WEIGHT
        + initials_bonus;

    MatchScore {
        token_set,
        partial,
        phonetic,
        initials_bonus,
        total: total.clamp(0.0, MAX_SCORE),
    }
}

// ─── Ratio primitives ────────────────────────────────────────────────────────

/// Normalized indel similarity of two char sequences, in `[0, 100]`.
fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    fuzz::ratio(a.iter().copied(), b.iter().copied()) * 100.0
}

/// Normalized indel similarity in `[0, 100]`. Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Token-set similarity: compares the shared tokens against each side's
/// shared + leftover tokens and keeps the best ratio.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let shared: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    // One side is a subset of the other.
    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = shared.join(" ");
    let join_with_sect = |rest: &[&str]| {
        let rest = rest.join(" ");
        if sect.is_empty() {
            rest
        } else {
            format!("{sect} {rest}")
        }
    };
    let combined_a = join_with_sect(&only_a);
    let combined_b = join_with_sect(&only_b);

    let mut best = ratio(&combined_a, &combined_b);
    if !sect.is_empty() {
        best = best
            .max(ratio(&sect, &combined_a))
            .max(ratio(&sect, &combined_b));
    }
    best
}

/// Best ratio of the shorter string against every same-length window of the
/// longer one, plus the partial windows hanging off either end.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let m = short.len();
    let n = long.len();
    let mut best: f64 = 0.0;

    for start in 0..=(n - m) {
        best = best.max(ratio_chars(&short, &long[start..start + m]));
        if best >= 100.0 {
            return 100.0;
        }
    }

    for k in 1..m {
        best = best
            .max(ratio_chars(&short, &long[..k]))
            .max(ratio_chars(&short, &long[n - k..]));
    }

    best
}

// ─── Phonetic ────────────────────────────────────────────────────────────────

/// Consonant skeleton: first char kept, later vowels dropped, then the
/// literal substitutions applied in order.
pub fn phonetic_skeleton(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut skeleton: String = first.to_lowercase().collect();
    for ch in chars.flat_map(char::to_lowercase) {
        if !VOWELS.contains(&ch) {
            skeleton.push(ch);
        }
    }

    for (from, to) in PHONETIC_SUBSTITUTIONS {
        skeleton = skeleton.replace(from, to);
    }
    skeleton
}

pub fn phonetic_similarity(a: &str, b: &str) -> f64 {
    ratio(&phonetic_skeleton(a), &phonetic_skeleton(b))
}

// ─── Initials ────────────────────────────────────────────────────────────────

/// First letter of every token, concatenated.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|token| token.chars().next())
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when either name's initials contain the other's.
pub fn initials_match(a: &str, b: &str) -> bool {
    let ia = initials(a);
    let ib = initials(b);
    if ia.is_empty() || ib.is_empty() {
        return false;
    }
    ia.contains(&ib) || ib.contains(&ia)
}

#[cfg(test)]
#[path = "tests/scorer_tests.rs"]
mod tests;
