//! Command-line interface module.

mod characters;
mod commands;
mod generate;
mod serve;

pub use characters::handle_character_command;
pub use commands::{CharacterCommands, Cli, Commands, GenerateArgs};
pub use generate::run_generate;
pub use serve::run_server;
