//! Prompt builders and reply parsers for each generation step.

mod art_director;
mod author;
mod cast;

pub use art_director::{
    ART_DIRECTION_LABEL, art_direction_request, cover_prompt, fallback_prompt,
    fallback_scene_prompt, page_image_prompt, parse_art_direction, reference_prompt,
};
pub use author::{STORY_LABEL, language_name, parse_story, story_request};
pub use cast::{CHARACTERS_LABEL, extraction_request, parse_characters};
