//! Stored character commands.

use super::CharacterCommands;
use storybooker::{CharacterStore, FileSystemCharacterStore, StorybookerConfig};

/// Handle `storybooker characters ...`.
pub async fn handle_character_command(
    config: &StorybookerConfig,
    command: CharacterCommands,
) -> anyhow::Result<()> {
    let store = FileSystemCharacterStore::new(&config.paths.characters_dir)?;

    match command {
        CharacterCommands::List { json } => {
            let characters = store.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&characters)?);
                return Ok(());
            }
            if characters.is_empty() {
                println!("No characters in {}", store.base_path().display());
                return Ok(());
            }
            println!("{:<28} {:<20} SPECIES", "ID", "NAME");
            for character in &characters {
                println!(
                    "{:<28} {:<20} {}",
                    character.id(),
                    character.name,
                    character.species().unwrap_or("-")
                );
            }
        }
        CharacterCommands::Show { id } => {
            let character = store.load(&id).await?;
            println!("{}", serde_json::to_string_pretty(&character)?);
        }
    }

    Ok(())
}
