//! Command-line arguments for `idea-gen`.

use clap::Parser;

use idea_session::GenerationRequest;

/// Generate one idea from the configured generation service.
#[derive(Parser, Debug, Clone)]
#[command(name = "idea-gen")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Creator profile description
    #[arg(short = 'p', long)]
    pub profile: String,

    /// Theme hint (repeatable)
    #[arg(short = 't', long = "theme")]
    pub themes: Vec<String>,

    /// Optional free-form prompt
    #[arg(long)]
    pub prompt: Option<String>,

    /// Identifier stamped on the finished idea
    #[arg(long, default_value_t = 1)]
    pub id: i64,

    /// Print live tokens and stage completions to stderr
    #[arg(long)]
    pub progress: bool,
}

impl Args {
    /// Builds the generation request from the parsed arguments.
    pub fn request(&self) -> GenerationRequest {
        GenerationRequest {
            profile_description: self.profile.clone(),
            themes: self.themes.clone(),
            prompt: self
                .prompt
                .clone()
                .filter(|prompt| !prompt.trim().is_empty()),
        }
    }
}
