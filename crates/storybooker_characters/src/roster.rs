//! Character roster resolution.

use crate::{MERGE_THRESHOLD, seed_for_name, similarity_score};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use storybooker_core::Character;
use tracing::{debug, instrument};

/// One de-duplicated roster member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct RosterEntry {
    character: Character,
    pinned: bool,
    /// Extracted names and species that resolved to this entry
    aliases: Vec<String>,
}

impl RosterEntry {
    fn new(character: Character, pinned: bool) -> Self {
        Self {
            character,
            pinned,
            aliases: Vec::new(),
        }
    }

    fn add_alias(&mut self, alias: &str) {
        let alias = alias.trim();
        if alias.is_empty()
            || self.character.same_name(alias)
            || self
                .character
                .species()
                .is_some_and(|s| s.eq_ignore_ascii_case(alias))
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias))
        {
            return;
        }
        self.aliases.push(alias.to_string());
    }

    /// Name, species and aliases, in that order.
    pub fn terms(&self) -> Vec<&str> {
        let mut terms = vec![self.character.name.trim()];
        terms.extend(self.character.species());
        terms.extend(self.aliases.iter().map(String::as_str));
        terms
    }
}

/// An extracted character folded into an existing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Merge {
    extracted: String,
    merged_into: String,
    score: f64,
}

/// Resolved characters for one job.
///
/// Pinned entries come first in caller order, then admitted characters in
/// extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    merges: Vec<Merge>,
}

impl Roster {
    /// Roster characters in order.
    pub fn characters(&self) -> Vec<Character> {
        self.entries.iter().map(|e| e.character.clone()).collect()
    }

    /// Characters supplied by the caller.
    pub fn pinned(&self) -> impl Iterator<Item = &Character> {
        self.entries.iter().filter(|e| e.pinned).map(|e| &e.character)
    }

    /// Characters admitted from extraction.
    pub fn admitted(&self) -> impl Iterator<Item = &Character> {
        self.entries.iter().filter(|e| !e.pinned).map(|e| &e.character)
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.character.same_name(name))
    }

    /// Roster names in order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.character.name.as_str()).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a reference image for an admitted character.
    ///
    /// Pinned characters keep their stored image; returns whether the entry
    /// was updated.
    pub fn set_reference_image(&mut self, name: &str, path: std::path::PathBuf) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|e| !e.pinned && e.character.same_name(name))
        {
            Some(entry) => {
                entry.character.reference_image_path = Some(path);
                true
            }
            None => false,
        }
    }
}

/// Merge pinned and extracted characters into one roster.
///
/// Pinned characters are kept verbatim. Each extracted character is scored
/// against every entry so far; a best score of at least [`MERGE_THRESHOLD`]
/// folds it into that entry as an alias, otherwise it is admitted with a
/// name-derived seed unless an entry already carries its name.
#[instrument(skip_all, fields(pinned = pre_selected.len(), extracted = extracted.len()))]
pub fn resolve(pre_selected: &[Character], extracted: &[Character]) -> Roster {
    let mut roster = Roster::default();

    for character in pre_selected {
        if roster.find(&character.name).is_some() {
            debug!(name = %character.name, "Duplicate pinned character ignored");
            continue;
        }
        roster.entries.push(RosterEntry::new(character.clone(), true));
    }

    for candidate in extracted {
        if candidate.name.trim().is_empty() {
            continue;
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, entry) in roster.entries.iter().enumerate() {
            let score = similarity_score(candidate, &entry.character);
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((index, score));
            }
        }

        if let Some((index, score)) = best.filter(|(_, score)| *score >= MERGE_THRESHOLD) {
            let entry = &mut roster.entries[index];
            entry.add_alias(&candidate.name);
            if let Some(species) = candidate.species() {
                entry.add_alias(species);
            }
            debug!(extracted = %candidate.name, into = %entry.character.name, score, "Merged character");
            roster.merges.push(Merge {
                extracted: candidate.name.clone(),
                merged_into: entry.character.name.clone(),
                score,
            });
            continue;
        }

        if roster.find(&candidate.name).is_some() {
            debug!(name = %candidate.name, "Extracted character shares a roster name, skipped");
            continue;
        }

        let mut admitted = candidate.clone();
        admitted.name = admitted.name.trim().to_string();
        admitted.seed = Some(seed_for_name(&admitted.name));
        debug!(name = %admitted.name, seed = ?admitted.seed, "Admitted character");
        roster.entries.push(RosterEntry::new(admitted, false));
    }

    roster
}
