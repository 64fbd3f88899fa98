mod cli;
mod repl;
mod settings;

use colored::Colorize;
use tracing_subscriber::EnvFilter;

use charla_ai::{GroqClient, GroqConfig, Model, Session};

/// Load environment variables from a .env file (KEY=VALUE lines).
fn load_dotenv() {
    // Try common locations for .env relative to the workspace
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        // Workspace root — two levels up from crates/charla-app/
        manifest_dir.join("..").join("..").join(".env"),
        // Current directory
        std::path::PathBuf::from(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
            return;
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env before the credential lookup
    load_dotenv();

    let args = cli::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("charla=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "charla=info".parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("charla v{} starting", env!("CARGO_PKG_VERSION"));

    let mut settings = settings::load(args.config.as_deref().map(std::path::Path::new));
    if let Some(model) = args.model {
        settings.chat.default_model = model;
    }
    if let Some(temperature) = args.temperature {
        settings.chat.temperature = temperature;
    }
    if let Some(prompt) = args.system_prompt {
        settings.chat.system_prompt = prompt;
    }

    // Missing credential is non-recoverable: report once and leave.
    let config = match GroqConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("{}", format!("charla no puede iniciar: {e}").red());
            eprintln!("Agregá GROQ_API_KEY a tu entorno o a un archivo .env.");
            std::process::exit(1);
        }
    };
    let client = GroqClient::new(config);

    let model = match settings.chat.default_model.parse::<Model>() {
        Ok(model) => model,
        Err(e) => {
            tracing::warn!("{e}, falling back to {}", Model::default());
            Model::default()
        }
    };

    let mut session =
        Session::with_system_prompt(settings.chat.system_prompt.clone()).with_model(model);
    if let Err(e) = session.set_temperature(settings.chat.temperature) {
        tracing::warn!("{e}, keeping {}", session.temperature());
    }
    tracing::info!(session = %session.id(), model = %session.model(), "session ready");

    if let Err(e) = repl::run(&mut session, &client, settings.ui.show_reasoning).await {
        tracing::error!("terminal error: {e}");
        std::process::exit(1);
    }
}
