use clap::Parser;

/// Charla — terminal chat for Groq-hosted models.
#[derive(Parser, Debug)]
#[command(name = "charla", version, about)]
pub struct Args {
    /// Model id to start with (see /models for the catalog).
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 to 1.5).
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// System directive override for this run.
    #[arg(long)]
    pub system_prompt: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
