//! Story text and per-page illustration prompts.

use serde::{Deserialize, Serialize};

/// One page of narrative with its intended illustration subjects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoryBeat {
    /// Page text
    pub text: String,
    /// What the page illustration should show
    #[serde(default)]
    pub visual_description: String,
    /// Character or object names expected in the illustration
    #[serde(default, alias = "sticker_subjects")]
    pub subjects: Vec<String>,
}

impl StoryBeat {
    /// A beat with text and description and no subjects.
    pub fn new(text: impl Into<String>, visual_description: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visual_description: visual_description.into(),
            subjects: Vec::new(),
        }
    }

    /// Set the subjects.
    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = subjects.into_iter().map(Into::into).collect();
        self
    }
}

/// A generated story in one language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Story {
    /// Story title
    #[serde(default)]
    pub title: String,
    /// Pages in reading order
    #[serde(default)]
    pub beats: Vec<StoryBeat>,
}

/// Illustration prompt for one subject of a beat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePrompt {
    /// Subject the prompt renders
    #[serde(default)]
    pub subject: String,
    /// Prompt text
    pub prompt: String,
}

/// All prompts produced for one beat.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BeatPrompts {
    /// One prompt per subject, in subject order
    pub prompts: Vec<ImagePrompt>,
    /// Full-page background scene prompt
    pub scene_prompt: String,
}
