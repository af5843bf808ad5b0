use super::*;
use crate::database::models::MappingOrigin;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn mapping_to(target: &str) -> NameMapping {
    NameMapping {
        target: target.to_string(),
        confidence: 100.0,
        timestamp: None,
        origin: MappingOrigin::User,
    }
}

#[test]
fn test_learned_mapping_short_circuits() {
    let mut mappings = HashMap::new();
    mappings.insert("hans mueller".to_string(), mapping_to("hans m"));

    let mut rejected = HashSet::new();
    rejected.insert(RejectedPair::new("anna k", "anna koch"));
    rejected.insert(RejectedPair::new("other", "hans m"));

    let result = rank(
        "hans mueller",
        &names(&["hans mueller senior", "hans m", "anna koch"]),
        &mappings,
        &rejected,
        &HashSet::new(),
    );

    assert_eq!(
        result,
        vec![Suggestion {
            candidate: "hans m".into(),
            score: 100.0,
            origin: SuggestionOrigin::Learned,
        }]
    );
}

#[test]
fn test_learned_mapping_wins_over_own_rejection() {
    let mut mappings = HashMap::new();
    mappings.insert("anna k".to_string(), mapping_to("anna koch"));
    let mut rejected = HashSet::new();
    rejected.insert(RejectedPair::new("anna k", "anna koch"));

    let result = rank(
        "anna k",
        &names(&["anna koch"]),
        &mappings,
        &rejected,
        &HashSet::new(),
    );
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].origin, SuggestionOrigin::Learned);
}

#[test]
fn test_learned_target_missing_falls_back_to_fuzzy() {
    let mut mappings = HashMap::new();
    mappings.insert("anna k".to_string(), mapping_to("anna kraus"));

    let result = rank(
        "anna k",
        &names(&["anna koch"]),
        &mappings,
        &HashSet::new(),
        &HashSet::new(),
    );
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].candidate, "anna koch");
    assert_eq!(result[0].origin, SuggestionOrigin::Fuzzy);
}

#[test]
fn test_rejected_pair_is_never_suggested() {
    // Would score well above the threshold without the rejection.
    assert!(scorer::score("anna k", "anna koch") > 50.0);

    let mut rejected = HashSet::new();
    rejected.insert(RejectedPair::new("anna k", "anna koch"));

    let result = rank(
        "anna k",
        &names(&["anna koch"]),
        &HashMap::new(),
        &rejected,
        &HashSet::new(),
    );
    assert!(result.is_empty());
}

#[test]
fn test_rejection_is_ordered_pair() {
    let mut rejected = HashSet::new();
    rejected.insert(RejectedPair::new("anna koch", "anna k"));

    let result = rank(
        "anna k",
        &names(&["anna koch"]),
        &HashMap::new(),
        &rejected,
        &HashSet::new(),
    );
    assert_eq!(result.len(), 1);
}

#[test]
fn test_already_assigned_excluded_even_for_learned() {
    let mut mappings = HashMap::new();
    mappings.insert("erika m".to_string(), mapping_to("erika musterfrau"));

    let batch = ["erika m", "erika mustermann"];
    let assigned = assigned_elsewhere("erika mustermann", batch, &mappings);
    assert!(assigned.contains("erika musterfrau"));

    let result = rank(
        "erika mustermann",
        &names(&["erika musterfrau"]),
        &mappings,
        &HashSet::new(),
        &assigned,
    );
    assert!(result.is_empty());

    // The owner of the mapping still gets its learned hit.
    let own = assigned_elsewhere("erika m", batch, &mappings);
    assert!(own.is_empty());
    let result = rank(
        "erika m",
        &names(&["erika musterfrau"]),
        &mappings,
        &HashSet::new(),
        &own,
    );
    assert_eq!(result[0].origin, SuggestionOrigin::Learned);
}

#[test]
fn test_threshold_sort_and_limit() {
    let candidates = names(&[
        "max mustermann",
        "max musterman",
        "max muster",
        "maxi mustermann",
        "m mustermann",
        "mustermann max",
        "zoe zander",
    ]);
    let result = rank(
        "max mustermann",
        &candidates,
        &HashMap::new(),
        &HashSet::new(),
        &HashSet::new(),
    );

    assert_eq!(result.len(), 5);
    assert!(result.iter().all(|s| s.score > 50.0));
    assert!(result.iter().all(|s| s.origin == SuggestionOrigin::Fuzzy));
    assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(!result.iter().any(|s| s.candidate == "zoe zander"));
    assert_eq!(result[0].candidate, "max mustermann");
    assert_eq!(result[0].score, 110.0);
}

#[test]
fn test_custom_config() {
    let config = RankConfig {
        threshold: 105.0,
        limit: 1,
    };
    let result = rank_with(
        "max mustermann",
        &names(&["max mustermann", "mustermann max", "max muster"]),
        &HashMap::new(),
        &HashSet::new(),
        &HashSet::new(),
        &config,
    );
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].candidate, "max mustermann");
}

#[test]
fn test_empty_candidates() {
    let result = rank(
        "anyone",
        &[],
        &HashMap::new(),
        &HashSet::new(),
        &HashSet::new(),
    );
    assert!(result.is_empty());
}

#[test]
fn test_duplicate_candidates_suggested_once() {
    let result = rank(
        "anna koch",
        &names(&["anna koch", "anna koch"]),
        &HashMap::new(),
        &HashSet::new(),
        &HashSet::new(),
    );
    assert_eq!(result.len(), 1);
}
