//! Interactive chat loop.
//!
//! Lines starting with `/` are commands; everything else is submitted as a
//! user message. The loop blocks on each request (a dim waiting line shows
//! in the meantime) and never dies on a failed completion — the error is
//! printed and the conversation continues.

use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use charla_ai::{process, CompletionError, GroqClient, Message, Model, Session};

const PROMPT: &str = "mensaje> ";

const COMMANDS: [&str; 8] = [
    "/help",
    "/models",
    "/model",
    "/temp",
    "/clear",
    "/usage",
    "/reasoning",
    "/quit",
];

/// Readline helper providing completion, hints, and highlighting for the
/// slash commands.
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Help,
    Models,
    Model(&'a str),
    Temperature(&'a str),
    Clear,
    Usage,
    Reasoning(&'a str),
    Quit,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(input: &'a str) -> Self {
        let mut parts = input.splitn(2, char::is_whitespace);
        let head = parts.next().unwrap_or_default();
        let rest = parts.next().map(str::trim).unwrap_or_default();

        match head {
            "/help" => Command::Help,
            "/models" => Command::Models,
            "/model" => Command::Model(rest),
            "/temp" | "/temperature" => Command::Temperature(rest),
            "/clear" => Command::Clear,
            "/usage" => Command::Usage,
            "/reasoning" => Command::Reasoning(rest),
            "/quit" | "/exit" => Command::Quit,
            other => Command::Unknown(other),
        }
    }
}

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn run(
    session: &mut Session,
    client: &GroqClient,
    show_reasoning: bool,
) -> rustyline::Result<()> {
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    let mut show_reasoning = show_reasoning;
    print_banner(session);

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                if input.starts_with('/') {
                    if run_command(Command::parse(input), session, &mut show_reasoning)
                        == Flow::Quit
                    {
                        break;
                    }
                } else {
                    submit_and_render(session, client, &line, show_reasoning).await;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        }
    }

    println!("{}", "hasta luego".dimmed());
    Ok(())
}

fn print_banner(session: &Session) {
    println!("{}", "Chat con Groq".bold());
    println!(
        "{}",
        format!(
            "modelo: {} · temperatura: {} · /help para los comandos",
            session.model(),
            session.temperature()
        )
        .dimmed()
    );
}

async fn submit_and_render(
    session: &mut Session,
    client: &GroqClient,
    text: &str,
    show_reasoning: bool,
) {
    println!("{}", "pensando…".dimmed());
    match session.submit(client, text).await {
        Ok(Some(message)) => render_reply(&message, show_reasoning),
        Ok(None) => {}
        Err(e) => println!("{}", describe_error(&e).red()),
    }
}

fn render_reply(message: &Message, show_reasoning: bool) {
    let processed = process(&message.content);

    if show_reasoning {
        if let Some(reasoning) = processed.reasoning.as_deref().filter(|r| !r.is_empty()) {
            println!("{}", "── razonamiento ──".dimmed());
            for line in reasoning.lines() {
                println!("{}", line.dimmed().italic());
            }
            println!("{}", "──────────────────".dimmed());
        }
    }

    let meta = match &message.usage {
        Some(usage) => format!(
            "{} · {} tokens",
            message.sent_at.format("%H:%M"),
            usage.total_tokens()
        ),
        None => message.sent_at.format("%H:%M").to_string(),
    };
    println!("{} {}", "asistente".bright_cyan().bold(), meta.dimmed());
    println!("{}", processed.display_text);
    println!();
}

fn run_command(command: Command<'_>, session: &mut Session, show_reasoning: &mut bool) -> Flow {
    match command {
        Command::Help => print_help(),
        Command::Models | Command::Model("") => print_models(session),
        Command::Model(id) => match id.parse::<Model>() {
            Ok(model) if model == session.model() => {
                println!("{}", format!("ya estás usando {model}").dimmed());
            }
            Ok(model) => {
                session.set_model(model);
                println!(
                    "{}",
                    format!("modelo cambiado a {model}, conversación reiniciada").dimmed()
                );
            }
            Err(e) => println!("{}", e.to_string().red()),
        },
        Command::Temperature("") => {
            println!("{}", format!("temperatura actual: {}", session.temperature()).dimmed());
        }
        Command::Temperature(value) => match value.parse::<f64>() {
            Ok(temperature) => match session.set_temperature(temperature) {
                Ok(()) => println!("{}", format!("temperatura: {temperature}").dimmed()),
                Err(e) => println!("{}", e.to_string().red()),
            },
            Err(_) => println!("{}", "uso: /temp <número entre 0.0 y 1.5>".red()),
        },
        Command::Clear => {
            session.reset();
            println!("{}", "conversación reiniciada".dimmed());
        }
        Command::Usage => print_usage(session),
        Command::Reasoning("on") => {
            *show_reasoning = true;
            println!("{}", "razonamiento visible".dimmed());
        }
        Command::Reasoning("off") => {
            *show_reasoning = false;
            println!("{}", "razonamiento oculto".dimmed());
        }
        Command::Reasoning(_) => println!("{}", "uso: /reasoning on|off".red()),
        Command::Quit => return Flow::Quit,
        Command::Unknown(cmd) => {
            println!("{}", format!("comando desconocido: {cmd} (/help)").red());
        }
    }
    Flow::Continue
}

fn print_help() {
    println!("{}", "comandos:".dimmed());
    println!("  /models           catálogo de modelos");
    println!("  /model <id>       cambiar de modelo (reinicia la conversación)");
    println!("  /temp <valor>     temperatura de muestreo (0.0 a 1.5)");
    println!("  /clear            reiniciar la conversación");
    println!("  /usage            tokens consumidos en la sesión");
    println!("  /reasoning on|off mostrar u ocultar el razonamiento del modelo");
    println!("  /quit             salir");
}

fn print_models(session: &Session) {
    for model in Model::ALL {
        let marker = if model == session.model() { "▸" } else { " " };
        let note = if model.emits_reasoning() {
            " (razona)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("{marker} {model}{note}");
    }
}

fn print_usage(session: &Session) {
    let tracker = session.tracker();
    let total = tracker.total();
    println!(
        "solicitudes: {} · tokens: {} prompt + {} respuesta = {}",
        tracker.request_count(),
        total.prompt_tokens,
        total.completion_tokens,
        tracker.total_tokens()
    );
    for model in Model::ALL {
        if let Some(usage) = tracker.for_model(model.id()) {
            println!("  {}: {} tokens", model.id(), usage.total_tokens());
        }
    }
}

/// User-facing text for every failure kind. The match is exhaustive on
/// purpose: a new error variant must decide its message here.
fn describe_error(error: &CompletionError) -> String {
    match error {
        CompletionError::Connection(detail) => {
            format!("no se pudo contactar la API: {detail}")
        }
        CompletionError::Status { status: 429, .. } => {
            "límite de uso alcanzado, probá de nuevo en unos segundos".to_string()
        }
        CompletionError::Status { status, message } => {
            format!("la API respondió {status}: {message}")
        }
        CompletionError::Malformed(detail) => {
            format!("respuesta inválida de la API: {detail}")
        }
        CompletionError::Other(detail) => detail.clone(),
    }
}
