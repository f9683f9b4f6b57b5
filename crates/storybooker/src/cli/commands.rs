//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::str::FromStr;
use storybooker::ArtStyle;

/// Storybooker - illustrated storybooks from a one-line theme
#[derive(Parser, Debug)]
#[command(name = "storybooker")]
#[command(about = "Illustrated storybooks from a one-line theme", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "STORYBOOKER_JSON_LOGS")]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP job API
    Serve {
        /// Bind address, overriding configuration
        #[arg(long)]
        addr: Option<String>,
    },

    /// Run one job in-process and print its documents
    Generate(GenerateArgs),

    /// Stored character commands
    #[command(subcommand)]
    Characters(CharacterCommands),
}

/// Options for a single job.
#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Story theme
    #[arg(long, default_value = "adventure")]
    pub theme: String,

    /// Number of pages
    #[arg(long, default_value_t = 5)]
    pub pages: u8,

    /// Illustration style (e.g. watercolor, 3d_rendered)
    #[arg(long, value_parser = parse_style)]
    pub style: Option<ArtStyle>,

    /// Output language, repeatable; the first is primary
    #[arg(long = "language", short = 'l')]
    pub languages: Vec<String>,

    /// Stored character id that must appear, repeatable
    #[arg(long = "character", short = 'c')]
    pub characters: Vec<String>,

    /// Preferred text provider for this job
    #[arg(long)]
    pub text_provider: Option<String>,

    /// Preferred image provider for this job
    #[arg(long)]
    pub image_provider: Option<String>,
}

/// Stored character subcommands
#[derive(Subcommand, Debug)]
pub enum CharacterCommands {
    /// List stored characters
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one stored character as JSON
    Show {
        /// Character id (chr_...)
        id: String,
    },
}

fn parse_style(raw: &str) -> Result<ArtStyle, String> {
    ArtStyle::from_str(raw.trim()).map_err(|_| format!("unknown style '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_arguments() {
        let cli = Cli::try_parse_from([
            "storybooker",
            "generate",
            "--theme",
            "a brave toaster",
            "--pages",
            "3",
            "--style",
            "watercolor",
            "-l",
            "es",
            "-l",
            "en",
            "--character",
            "chr_luna",
        ])
        .unwrap();

        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.pages, 3);
        assert_eq!(args.style, Some(ArtStyle::Watercolor));
        assert_eq!(args.languages, vec!["es", "en"]);
        assert_eq!(args.characters, vec!["chr_luna"]);
    }

    #[test]
    fn test_unknown_style_is_rejected() {
        assert!(Cli::try_parse_from(["storybooker", "generate", "--style", "cubism"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["storybooker", "serve", "--addr", "127.0.0.1:9000", "-v"])
            .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Serve { addr: Some(ref a) } if a == "127.0.0.1:9000"));
    }
}
