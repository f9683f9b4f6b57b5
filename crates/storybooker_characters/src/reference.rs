//! Prompt-ready character references.

use storybooker_core::Character;

/// Key features included per character.
pub const REFERENCE_FEATURES: usize = 3;

/// One line describing a character for image prompts.
pub fn format_reference(character: &Character) -> String {
    let mut line = match character.species() {
        Some(species) => format!("{} ({})", character.name.trim(), species),
        None => character.name.trim().to_string(),
    };

    let description = character.physical_description.trim();
    if !description.is_empty() {
        line.push_str(": ");
        line.push_str(description);
    }

    let features: Vec<&str> = character
        .key_features
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .take(REFERENCE_FEATURES)
        .collect();
    if !features.is_empty() {
        line.push_str(&format!(". Key features: {}", features.join(", ")));
    }

    if !character.color_palette.is_empty() {
        let colors: Vec<String> = character
            .color_palette
            .filled()
            .map(|(slot, color)| format!("{} {}", slot, color))
            .collect();
        line.push_str(&format!(". Colors: {}", colors.join(", ")));
    }

    line
}

/// Reference block for a whole roster, one character per line.
pub fn format_roster_reference(characters: &[Character]) -> String {
    characters
        .iter()
        .map(|c| format!("- {}", format_reference(c)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_takes_first_three_features() {
        let mut luna = Character::new("Luna")
            .with_species("mouse")
            .with_description("A grey mouse")
            .with_features(["blue cape", "round ears", "tiny boots", "a lantern"]);
        luna.color_palette.set("primary", "grey");

        let line = format_reference(&luna);
        assert_eq!(
            line,
            "Luna (mouse): A grey mouse. Key features: blue cape, round ears, tiny boots. Colors: primary grey"
        );
    }

    #[test]
    fn test_bare_character() {
        assert_eq!(format_roster_reference(&[Character::new("Bolt")]), "- Bolt");
    }
}
