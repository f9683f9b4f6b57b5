//! Character descriptions shared by every stage of a job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Named colour slots of a character, values optional.
///
/// # Examples
///
/// ```
/// use storybooker_core::ColorPalette;
///
/// let mut palette = ColorPalette::default();
/// palette.set("hair_color", "silver");
/// palette.clear("eye_color");
///
/// assert_eq!(palette.get("hair_color"), Some("silver"));
/// assert_eq!(palette.get("eye_color"), None);
/// assert_eq!(palette.filled().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorPalette(BTreeMap<String, Option<String>>);

impl ColorPalette {
    /// Slots the extraction prompt asks for.
    pub const SLOTS: [&'static str; 6] = [
        "hair_color",
        "eye_color",
        "skin_color",
        "clothing_color",
        "primary_color",
        "accent_color",
    ];

    /// Colour in a slot, when one is set.
    pub fn get(&self, slot: &str) -> Option<&str> {
        self.0.get(slot).and_then(|value| value.as_deref())
    }

    /// Set a slot.
    pub fn set(&mut self, slot: impl Into<String>, color: impl Into<String>) {
        self.0.insert(slot.into(), Some(color.into()));
    }

    /// Record a slot as known but empty.
    pub fn clear(&mut self, slot: impl Into<String>) {
        self.0.insert(slot.into(), None);
    }

    /// Slots with a colour, in slot-name order.
    pub fn filled(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|(slot, value)| value.as_deref().map(|v| (slot.as_str(), v)))
    }

    /// True when no slot has a colour.
    pub fn is_empty(&self) -> bool {
        self.filled().next().is_none()
    }
}

/// A visual entity description.
///
/// `name` is the identity key and is matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Character {
    /// Display name and identity key
    pub name: String,
    /// Species or kind of creature
    #[serde(default)]
    pub species: Option<String>,
    /// Free-text appearance
    #[serde(default)]
    pub physical_description: String,
    /// Distinctive features, most salient first
    #[serde(default)]
    pub key_features: Vec<String>,
    /// Colour slots
    #[serde(default)]
    pub color_palette: ColorPalette,
    /// Deterministic rendering seed
    #[serde(default)]
    pub seed: Option<u32>,
    /// Reference image on disk
    #[serde(default, alias = "reference_image")]
    pub reference_image_path: Option<PathBuf>,
}

impl Character {
    /// A character with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the species.
    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    /// Set the physical description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.physical_description = description.into();
        self
    }

    /// Set the key features.
    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_features = features.into_iter().map(Into::into).collect();
        self
    }

    /// Species when present and non-blank.
    pub fn species(&self) -> Option<&str> {
        self.species
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Case-insensitive name comparison.
    pub fn same_name(&self, other: &str) -> bool {
        self.name.trim().to_lowercase() == other.trim().to_lowercase()
    }

    /// Stable store identifier for this character.
    pub fn id(&self) -> String {
        character_id(&self.name)
    }
}

/// Store identifier for a character name.
///
/// Keeps alphanumerics, spaces, `-` and `_`, turns spaces into `_`,
/// collapses repeated `_` and lowercases behind a `chr_` prefix.
///
/// # Examples
///
/// ```
/// use storybooker_core::character_id;
///
/// assert_eq!(character_id("Luna the Brave!"), "chr_luna_the_brave");
/// assert_eq!(character_id("  ??  "), "chr_unnamed");
/// ```
pub fn character_id(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let mut safe = kept.trim().replace(' ', "_");
    while safe.contains("__") {
        safe = safe.replace("__", "_");
    }
    if safe.is_empty() {
        "chr_unnamed".to_string()
    } else {
        format!("chr_{}", safe.to_lowercase())
    }
}
