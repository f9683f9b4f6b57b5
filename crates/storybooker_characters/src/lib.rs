//! Character consistency for Storybooker.
//!
//! [`resolve`] merges the caller's pinned characters with characters
//! extracted from a generated story into one de-duplicated, seeded
//! [`Roster`]. The helpers in [`subjects`](inject_subjects) keep roster
//! characters visible in every beat that mentions them.

#![warn(missing_docs)]

mod reference;
mod roster;
mod seed;
mod similarity;
mod store;
mod subjects;

pub use reference::{REFERENCE_FEATURES, format_reference, format_roster_reference};
pub use roster::{Merge, Roster, RosterEntry, resolve};
pub use seed::{SEED_RANGE, seed_for_name};
pub use similarity::{MERGE_THRESHOLD, description_keywords, jaccard, similarity_score};
pub use store::{FileSystemCharacterStore, InMemoryCharacterStore, StoredCharacter};
pub use subjects::{inject_subjects, match_character_to_subject};
