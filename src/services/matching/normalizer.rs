//! Person-name canonicalization.
//!
//! Every identity comparison in the crate goes through [`normalize`], so it must
//! stay pure and idempotent.

use deunicode::deunicode;
use std::collections::HashSet;

/// German umlauts and sharp s, replaced by their ASCII digraphs.
const DIGRAPHS: &[(char, &str)] = &[('ä', "ae"), ('ö', "oe"), ('ü', "ue"), ('ß', "ss")];

/// Canonicalize a raw person name into a comparison key.
///
/// Pipeline:
/// 1. Lowercase
/// 2. ä→ae, ö→oe, ü→ue, ß→ss
/// 3. Hyphens become spaces
/// 4. Trim and collapse runs of whitespace to a single space
///
/// Empty input yields an empty key.
pub fn normalize(raw: &str) -> String {
    let mut expanded = String::with_capacity(raw.len());
    for ch in raw.to_lowercase().chars() {
        if ch == '-' {
            expanded.push(' ');
        } else if let Some((_, digraph)) = DIGRAPHS.iter().find(|(c, _)| *c == ch) {
            expanded.push_str(digraph);
        } else {
            expanded.push(ch);
        }
    }

    expanded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize an optional field; a missing value is the empty key.
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}

/// Accent-insensitive key used for roster membership.
///
/// Umlauts are expanded first so "Müller" and "Mueller" agree, then any
/// remaining accents are transliterated ("José" → "jose").
pub fn roster_key(raw: &str) -> String {
    normalize(&deunicode(&normalize(raw)))
}

/// Precomputed roster for exact, case- and accent-insensitive lookups.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    keys: HashSet<String>,
}

impl Roster {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = names
            .into_iter()
            .map(|n| roster_key(n.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();
        Self { keys }
    }

    pub fn contains(&self, name: &str) -> bool {
        let key = roster_key(name);
        !key.is_empty() && self.keys.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/normalizer_tests.rs"]
mod tests;
