//! Illustration prompts for covers, pages and character references.

use crate::parse_json;
use serde::Deserialize;
use storybooker_characters::format_reference;
use storybooker_core::{
    ArtStyle, BeatPrompts, Character, ImagePrompt, Message, Story, StoryBeat, TextRequest,
};

/// Request label for art direction.
pub const ART_DIRECTION_LABEL: &str = "art_direction";

/// Prompt used when the art director returns nothing usable for a subject.
pub fn fallback_prompt(subject: &str) -> String {
    format!(
        "3D rendered sticker-style {}, cute and colorful, clean white background, \
         professional lighting, children's book illustration style",
        subject.trim()
    )
}

/// Background prompt used when the art director gives none.
pub fn fallback_scene_prompt(beat: &StoryBeat) -> String {
    let scene = if beat.visual_description.trim().is_empty() {
        beat.text.trim()
    } else {
        beat.visual_description.trim()
    };
    format!("Full page children's book illustration of {}", scene)
}

/// Prompt for one beat's subjects and background.
pub fn art_direction_request(beat: &StoryBeat, style: ArtStyle, roster_reference: &str) -> TextRequest {
    let mut user = format!(
        "Page text: {}\nScene: {}\nSubjects: {}\nStyle: {}\n",
        beat.text.trim(),
        beat.visual_description.trim(),
        beat.subjects.join(", "),
        style.phrase(),
    );
    if !roster_reference.is_empty() {
        user.push_str("\nCharacters (keep them consistent):\n");
        user.push_str(roster_reference);
        user.push('\n');
    }
    user.push_str(
        "\nWrite one image prompt per subject and one full-page background prompt. \
         Respond with JSON of the form {\"prompts\": [{\"subject\": \"...\", \"prompt\": \"...\"}], \
         \"background_prompt\": \"...\"}",
    );

    TextRequest::new(
        ART_DIRECTION_LABEL,
        vec![
            Message::system("You are an art director for illustrated children's books. Output ONLY valid JSON."),
            Message::user(user),
        ],
    )
    .with_temperature(0.7)
    .json()
}

#[derive(Debug, Default, Deserialize)]
struct ArtReply {
    #[serde(default)]
    prompts: Vec<ImagePrompt>,
    #[serde(default, alias = "scene_prompt")]
    background_prompt: String,
}

/// Prompts for every subject of `beat`, synthesizing any the reply lacks.
///
/// Reply prompts are matched to subjects by name first, then by position
/// among the unmatched ones. An unparseable reply yields only fallbacks.
pub fn parse_art_direction(reply: &str, beat: &StoryBeat) -> BeatPrompts {
    let parsed: ArtReply = match parse_json(reply) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Art direction reply unusable, synthesizing prompts");
            ArtReply::default()
        }
    };

    let mut unused: Vec<ImagePrompt> = parsed
        .prompts
        .into_iter()
        .filter(|p| !p.prompt.trim().is_empty())
        .collect();
    let mut prompts = Vec::with_capacity(beat.subjects.len());
    for subject in &beat.subjects {
        let by_name = unused
            .iter()
            .position(|p| p.subject.trim().eq_ignore_ascii_case(subject.trim()));
        let taken = by_name
            .or_else(|| unused.iter().position(|p| p.subject.trim().is_empty()))
            .map(|index| unused.remove(index));
        let prompt = match taken {
            Some(found) => found.prompt,
            None => {
                tracing::debug!(subject = %subject, "Synthesized fallback prompt");
                fallback_prompt(subject)
            }
        };
        prompts.push(ImagePrompt {
            subject: subject.clone(),
            prompt,
        });
    }

    let scene_prompt = if parsed.background_prompt.trim().is_empty() {
        fallback_scene_prompt(beat)
    } else {
        parsed.background_prompt.trim().to_string()
    };
    BeatPrompts {
        prompts,
        scene_prompt,
    }
}

/// Cover prompt built from the first beat.
pub fn cover_prompt(story: &Story, style: ArtStyle) -> String {
    let scene = story
        .beats
        .first()
        .map(|beat| beat.visual_description.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("a cheerful storybook landscape");
    format!(
        "Book cover illustration for \"{}\": {}. {}",
        story.title, scene, style.phrase()
    )
}

/// Full-page prompt for a beat featuring the given characters.
pub fn page_image_prompt(prompts: &BeatPrompts, featured: &[&Character], style: ArtStyle) -> String {
    let mut prompt = prompts.scene_prompt.clone();
    for subject in &prompts.prompts {
        prompt.push_str(&format!(". {}", subject.prompt));
    }
    if !featured.is_empty() {
        let references: Vec<String> = featured.iter().map(|c| format_reference(c)).collect();
        prompt.push_str(&format!(". Featuring {}", references.join("; ")));
    }
    prompt.push_str(&format!(". {}", style.phrase()));
    prompt
}

/// Reference sheet prompt for one character.
pub fn reference_prompt(character: &Character, style: ArtStyle) -> String {
    format!(
        "Character reference sheet, sticker-style {}, full body, clean white background. {}",
        format_reference(character),
        style.phrase()
    )
}
