//! Character extraction from a written story.

use crate::parse_json;
use serde::Deserialize;
use storybooker_core::{Character, ColorPalette, Message, Story, TextRequest};
use storybooker_error::JsonError;

/// Request label for character extraction.
pub const CHARACTERS_LABEL: &str = "characters";

/// Prompt asking for every recurring character in `story`.
pub fn extraction_request(story: &Story) -> TextRequest {
    let pages: Vec<String> = story
        .beats
        .iter()
        .enumerate()
        .map(|(i, beat)| format!("Page {}: {} ({})", i + 1, beat.text, beat.visual_description))
        .collect();
    let user = format!(
        "Story: {}\n{}\n\n\
         List every character that appears in this story. For each give name, species, \
         physical_description, key_features (most distinctive first) and color_palette with \
         the slots {}. Use null for unknown colors.\n\n\
         Respond with JSON of the form {{\"characters\": [...]}}",
        story.title,
        pages.join("\n"),
        ColorPalette::SLOTS.join(", "),
    );
    TextRequest::new(
        CHARACTERS_LABEL,
        vec![
            Message::system("You extract character sheets for illustrators. Output ONLY valid JSON."),
            Message::user(user),
        ],
    )
    .with_temperature(0.2)
    .json()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CastReply {
    Wrapped { characters: Vec<Character> },
    Bare(Vec<Character>),
}

/// Parse an extraction reply, dropping nameless entries. Seeds and image
/// paths the model invents are discarded.
pub fn parse_characters(reply: &str) -> Result<Vec<Character>, JsonError> {
    let characters = match parse_json::<CastReply>(reply)? {
        CastReply::Wrapped { characters } | CastReply::Bare(characters) => characters,
    };
    Ok(characters
        .into_iter()
        .filter(|c| !c.name.trim().is_empty())
        .map(|mut c| {
            c.name = c.name.trim().to_string();
            c.seed = None;
            c.reference_image_path = None;
            c
        })
        .collect())
}
