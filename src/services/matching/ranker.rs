//! Candidate ranking for one unmatched booking name.
//!
//! **Algorithm:**
//! 1. Drop candidates already claimed by another query's mapping in this batch
//! 2. Learned mapping whose target survived step 1 → single result, score 100
//! 3. Otherwise score every candidate not rejected for this query, keep
//!    `score > threshold`, sort desc (tiebreak name asc), truncate to `limit`

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::scorer;
use crate::database::models::{NameMapping, RejectedPair};

/// Score assigned to a learned-mapping hit.
pub const LEARNED_SCORE: f64 = 100.0;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankConfig {
    /// Candidates must score strictly above this.
    pub threshold: f64,
    /// Maximum number of fuzzy suggestions returned.
    pub limit: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            threshold: 50.0,
            limit: 5,
        }
    }
}

// ─── Result Types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionOrigin {
    Learned,
    Fuzzy,
}

impl std::fmt::Display for SuggestionOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionOrigin::Learned => write!(f, "learned"),
            SuggestionOrigin::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub candidate: String,
    /// Rounded to one decimal.
    pub score: f64,
    pub origin: SuggestionOrigin,
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

/// Rank `candidates` for `query` with the default threshold and limit.
pub fn rank(
    query: &str,
    candidates: &[String],
    mappings: &HashMap<String, NameMapping>,
    rejected: &HashSet<RejectedPair>,
    already_assigned: &HashSet<String>,
) -> Vec<Suggestion> {
    rank_with(
        query,
        candidates,
        mappings,
        rejected,
        already_assigned,
        &RankConfig::default(),
    )
}

pub fn rank_with(
    query: &str,
    candidates: &[String],
    mappings: &HashMap<String, NameMapping>,
    rejected: &HashSet<RejectedPair>,
    already_assigned: &HashSet<String>,
    config: &RankConfig,
) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    let available: Vec<&String> = candidates
        .iter()
        .filter(|c| !already_assigned.contains(c.as_str()))
        .filter(|c| seen.insert(c.as_str()))
        .collect();

    if available.is_empty() {
        return Vec::new();
    }

    if let Some(mapping) = mappings.get(query) {
        if available.iter().any(|c| **c == mapping.target) {
            return vec![Suggestion {
                candidate: mapping.target.clone(),
                score: LEARNED_SCORE,
                origin: SuggestionOrigin::Learned,
            }];
        }
    }

    let mut results: Vec<Suggestion> = available
        .into_iter()
        .filter(|candidate| !rejected.contains(&RejectedPair::new(query, candidate)))
        .filter_map(|candidate| {
            let total = scorer::score(query, candidate);
            (total > config.threshold).then(|| Suggestion {
                candidate: candidate.clone(),
                score: (total * 10.0).round() / 10.0,
                origin: SuggestionOrigin::Fuzzy,
            })
        })
        .collect();

    // Sort: score desc → name asc (deterministic)
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.candidate.cmp(&b.candidate))
    });
    results.truncate(config.limit);
    results
}

/// Check-in names claimed by the mappings of *other* names in the same error
/// batch. Passed as `already_assigned` when ranking for `query`.
pub fn assigned_elsewhere<'a, I>(
    query: &str,
    batch_names: I,
    mappings: &HashMap<String, NameMapping>,
) -> HashSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    batch_names
        .into_iter()
        .filter(|name| *name != query)
        .filter_map(|name| mappings.get(name))
        .map(|mapping| mapping.target.clone())
        .collect()
}

#[cfg(test)]
#[path = "tests/ranker_tests.rs"]
mod tests;
