//! Weighted similarity between character descriptions.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use storybooker_core::Character;

/// Score at or above which an extracted character merges into an existing one.
pub const MERGE_THRESHOLD: f64 = 40.0;

const SPECIES_EXACT: f64 = 40.0;
const SPECIES_SUBSTRING: f64 = 30.0;
const NAME_EXACT: f64 = 30.0;
const NAME_SUBSTRING: f64 = 15.0;
const FEATURE_WEIGHT: f64 = 20.0;
const KEYWORD_WEIGHT: f64 = 10.0;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "with", "and", "or", "but", "has", "have", "had", "was",
    "were", "be", "been", "being",
];

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("Valid word regex"));

/// Lowercased description words longer than three characters, minus stop-words.
pub fn description_keywords(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Jaccard overlap of two sets, zero when both are empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn feature_set(character: &Character) -> BTreeSet<String> {
    character
        .key_features
        .iter()
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect()
}

fn exact_or_substring(a: &str, b: &str, exact: f64, substring: f64) -> f64 {
    if a.is_empty() || b.is_empty() {
        0.0
    } else if a == b {
        exact
    } else if a.contains(b) || b.contains(a) {
        substring
    } else {
        0.0
    }
}

/// Similarity of an extracted character to an existing one, 0 to 100.
///
/// Species match 40 (substring 30), name match 30 (substring 15), key
/// feature Jaccard ×20, description keyword Jaccard ×10.
pub fn similarity_score(extracted: &Character, existing: &Character) -> f64 {
    let mut score = 0.0;

    if let (Some(a), Some(b)) = (extracted.species(), existing.species()) {
        score += exact_or_substring(
            &a.to_lowercase(),
            &b.to_lowercase(),
            SPECIES_EXACT,
            SPECIES_SUBSTRING,
        );
    }

    score += exact_or_substring(
        &extracted.name.trim().to_lowercase(),
        &existing.name.trim().to_lowercase(),
        NAME_EXACT,
        NAME_SUBSTRING,
    );

    score += jaccard(&feature_set(extracted), &feature_set(existing)) * FEATURE_WEIGHT;
    score += jaccard(
        &description_keywords(&extracted.physical_description),
        &description_keywords(&existing.physical_description),
    ) * KEYWORD_WEIGHT;

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_drop_short_and_stop_words() {
        let words = description_keywords("The mouse has a tiny blue cape and bright eyes");
        let expected: BTreeSet<String> = ["mouse", "tiny", "blue", "cape", "bright", "eyes"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(words, expected);
        assert!(!words.contains("and"));
    }

    #[test]
    fn test_same_name_and_species_clears_threshold() {
        let pinned = Character::new("Luna").with_species("mouse");
        let extracted = Character::new("luna").with_species("Mouse");
        assert_eq!(similarity_score(&extracted, &pinned), 70.0);
    }

    #[test]
    fn test_species_substring() {
        let a = Character::new("Ripple").with_species("field mouse");
        let b = Character::new("Luna").with_species("mouse");
        assert_eq!(similarity_score(&a, &b), 30.0);
    }

    #[test]
    fn test_unrelated_scores_zero() {
        let a = Character::new("Bolt").with_species("robot");
        let b = Character::new("Luna").with_species("mouse");
        assert_eq!(similarity_score(&a, &b), 0.0);
    }

    #[test]
    fn test_feature_overlap_weighted() {
        let a = Character::new("A").with_features(["red scarf", "blue hat"]);
        let b = Character::new("B").with_features(["Red scarf"]);
        assert!((similarity_score(&a, &b) - 10.0).abs() < 1e-9);
    }
}
