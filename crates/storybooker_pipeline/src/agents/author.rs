//! Story writing.

use crate::parse_json;
use serde::Deserialize;
use storybooker_characters::format_roster_reference;
use storybooker_core::{ArtStyle, Character, Message, Story, StoryBeat, TextRequest};
use storybooker_error::JsonError;

/// Request label for story generation.
pub const STORY_LABEL: &str = "story";

/// Display name for a language code.
pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        other => other,
    }
}

/// Prompt for a story of exactly `pages` beats in `language`, starring
/// `cast` when it is non-empty.
pub fn story_request(
    theme: &str,
    pages: usize,
    language: &str,
    style: ArtStyle,
    cast: &[Character],
) -> TextRequest {
    let system = "You are a children's picture book author. You write short, warm stories \
                  where every page can be illustrated. Output ONLY valid JSON.";
    let mut user = format!(
        "Theme: {theme}\n\
         Language: {language}\n\
         Illustration style: {style}\n\n\
         Write a story of exactly {pages} pages in {name}. Each page has one or two \
         sentences of text, a visual description of the illustration, and the list of \
         characters or objects that must appear in it.\n\n\
         Respond with JSON of the form:\n\
         {{\"title\": \"...\", \"beats\": [{{\"text\": \"...\", \"visual_description\": \"...\", \
         \"sticker_subjects\": [\"...\"]}}]}}",
        name = language_name(language),
    );
    if !cast.is_empty() {
        user.push_str("\n\nThe story must star these characters:\n");
        user.push_str(&format_roster_reference(cast));
    }
    TextRequest::new(STORY_LABEL, vec![Message::system(system), Message::user(user)])
        .with_temperature(0.8)
        .json()
}

#[derive(Debug, Deserialize)]
struct StoryReply {
    #[serde(default)]
    title: String,
    #[serde(default, alias = "pages")]
    beats: Vec<StoryBeat>,
}

/// Parse a story reply. Beats with blank text are dropped.
pub fn parse_story(reply: &str) -> Result<Story, JsonError> {
    let parsed: StoryReply = parse_json(reply)?;
    let beats = parsed
        .beats
        .into_iter()
        .filter(|beat| !beat.text.trim().is_empty())
        .collect();
    Ok(Story {
        title: parsed.title.trim().to_string(),
        beats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_names_count_and_language() {
        let cast = [Character::new("Luna").with_species("mouse")];
        let prompt =
            story_request("space otters", 4, "es", ArtStyle::Watercolor, &cast).prompt_text();
        assert!(prompt.contains("exactly 4 pages"));
        assert!(prompt.contains("- Luna (mouse)"));
        assert!(prompt.contains("Language: es"));
        assert!(prompt.contains("in Spanish"));
    }

    #[test]
    fn test_parse_story_accepts_pages_alias() {
        let story = parse_story(
            r#"{"title": " Otters ", "pages": [{"text": "One."}, {"text": "  "}, {"text": "Two.", "sticker_subjects": ["otter"]}]}"#,
        )
        .unwrap();
        assert_eq!(story.title, "Otters");
        assert_eq!(story.beats.len(), 2);
        assert_eq!(story.beats[1].subjects, vec!["otter"]);
    }
}
