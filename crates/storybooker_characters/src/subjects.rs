//! Keeping roster characters in each beat's illustration subjects.

use crate::Roster;
use regex::Regex;
use storybooker_core::{Character, StoryBeat};
use tracing::debug;

/// Case-insensitive whole-word pattern for `term`, `None` when blank.
fn word_pattern(term: &str) -> Option<Regex> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term))).ok()
}

/// Patterns for one roster entry, compiled once per injection pass.
struct EntryPatterns {
    /// Name and species, checked against listed subjects
    identity: Vec<Regex>,
    /// Name, species and aliases, checked against beat text
    mentions: Vec<Regex>,
}

impl EntryPatterns {
    fn new(character: &Character, terms: &[&str]) -> Self {
        let identity = std::iter::once(character.name.as_str())
            .chain(character.species())
            .filter_map(word_pattern)
            .collect();
        let mentions = terms.iter().copied().filter_map(word_pattern).collect();
        Self { identity, mentions }
    }

    fn already_listed(&self, beat: &StoryBeat) -> bool {
        beat.subjects
            .iter()
            .any(|subject| self.identity.iter().any(|re| re.is_match(subject)))
    }

    fn mentioned_in(&self, text: &str) -> bool {
        self.mentions.iter().any(|re| re.is_match(text))
    }
}

/// Label added to a beat's subjects: the shorter of species and name.
fn subject_label(character: &Character) -> String {
    match character.species() {
        Some(species) if species.len() < character.name.trim().len() => species.to_string(),
        _ => character.name.trim().to_string(),
    }
}

/// Add roster characters mentioned in a beat but missing from its subjects.
///
/// A character counts as mentioned when its name, species or an alias appears
/// as a whole word in the beat text or visual description. Pinned characters
/// are also forced into the first beat. Returns the number of subjects added.
pub fn inject_subjects(beats: &mut [StoryBeat], roster: &Roster) -> usize {
    let patterns: Vec<EntryPatterns> = roster
        .entries()
        .iter()
        .map(|entry| EntryPatterns::new(entry.character(), &entry.terms()))
        .collect();
    let mut added = 0;

    for (index, beat) in beats.iter_mut().enumerate() {
        let text = format!("{} {}", beat.text, beat.visual_description);
        for (entry, patterns) in roster.entries().iter().zip(&patterns) {
            if patterns.already_listed(beat) {
                continue;
            }
            let forced = index == 0 && *entry.pinned();
            if forced || patterns.mentioned_in(&text) {
                let label = subject_label(entry.character());
                debug!(beat = index, subject = %label, forced, "Injected subject");
                beat.subjects.push(label);
                added += 1;
            }
        }
    }

    added
}

fn strip_article(subject: &str) -> &str {
    let trimmed = subject.trim();
    for article in ["the ", "a ", "an "] {
        let Some(head) = trimmed.get(..article.len()) else {
            continue;
        };
        if trimmed.len() > article.len() && head.eq_ignore_ascii_case(article) {
            return trimmed[article.len()..].trim_start();
        }
    }
    trimmed
}

/// Roster character an illustration subject refers to.
///
/// Leading articles are ignored. Matches the full name, the species, or any
/// name part longer than two characters, each as a substring either way.
pub fn match_character_to_subject<'a>(
    subject: &str,
    characters: &'a [Character],
) -> Option<&'a Character> {
    let subject = strip_article(subject).to_lowercase();
    if subject.is_empty() {
        return None;
    }

    characters.iter().find(|character| {
        let name = character.name.trim().to_lowercase();
        if !name.is_empty() && (subject.contains(&name) || name.contains(&subject)) {
            return true;
        }
        let species_match = character
            .species()
            .map(str::to_lowercase)
            .is_some_and(|species| subject.contains(&species) || species.contains(&subject));
        if species_match {
            return true;
        }
        name.split_whitespace()
            .filter(|part| part.chars().count() > 2)
            .any(|part| subject.contains(part))
    })
}
