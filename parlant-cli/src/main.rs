//! `parlant` -- push-to-talk voice translation from the terminal.
//!
//! Records from the microphone (or replays a file), sends the clip to the
//! translation backend and speaks the translated text aloud.

use std::path::PathBuf;

use clap::Parser;
use parlant_core::config::AppConfig;
use parlant_core::types::LanguageCode;
use parlant_engine::controller::{ControllerError, SessionController};
use parlant_engine::playback::PlaybackOutcome;
use parlant_engine::session::Session;
use parlant_runtime::config_store::ConfigStore;
use parlant_runtime::microphone::list_input_devices;
use parlant_runtime::runtime_controller::{AudioSource, build_system_controller};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Speak in one language, hear it in another.
#[derive(Parser, Debug)]
#[command(name = "parlant", about = "Voice translation client", version)]
struct Cli {
    /// Settings file (JSON). Missing files fall back to defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Translation backend base URL.
    #[arg(long, env = "PARLANT_BACKEND_URL")]
    backend_url: Option<String>,

    /// Spoken language code, or `auto`.
    #[arg(long)]
    source: Option<String>,

    /// Language to translate into.
    #[arg(long)]
    target: Option<String>,

    /// Use this audio file instead of the microphone.
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Don't speak translations aloud.
    #[arg(long)]
    no_speech: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

enum Command {
    Toggle,
    Replay,
    SelectLanguages(String, String),
    ListLanguages,
    ListDevices,
    Status,
    Quit,
    Help,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let mut words = line.split_whitespace();
    match words.next() {
        None | Some("r") => Command::Toggle,
        Some("p") => Command::Replay,
        Some("lang") => match (words.next(), words.next()) {
            (Some(src), Some(tgt)) => Command::SelectLanguages(src.into(), tgt.into()),
            _ => Command::Unknown(line.trim().into()),
        },
        Some("langs") => Command::ListLanguages,
        Some("devices") => Command::ListDevices,
        Some("s") => Command::Status,
        Some("q") | Some("quit") => Command::Quit,
        Some("h") | Some("help") | Some("?") => Command::Help,
        Some(_) => Command::Unknown(line.trim().into()),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut cfg = match &cli.config {
        Some(path) => ConfigStore::at_path(path).load_or_default()?,
        None => AppConfig::default(),
    };
    if let Some(url) = &cli.backend_url {
        cfg.backend_base_url = url.clone();
    }
    if let Some(src) = &cli.source {
        cfg.source_lang = src.clone();
    }
    if let Some(tgt) = &cli.target {
        cfg.target_lang = tgt.clone();
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let cfg = load_config(&cli)?;
    log::debug!("effective config: {cfg:?}");
    let source = match &cli.input_file {
        Some(path) => AudioSource::File(path.clone()),
        None => AudioSource::System,
    };
    let controller = build_system_controller(&cfg, source, !cli.no_speech).await?;

    let catalog = controller.load_catalog().await;
    if let Some(warning) = controller.catalog_warning().await {
        println!("warning: {warning}");
    }
    controller.validate_languages().await?;
    print_languages(&controller).await;
    println!("{} languages available. Type `help` for commands.", catalog.len());
    print_session(&controller.snapshot().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Quit => break,
            cmd => run_command(&controller, cmd).await,
        }
    }

    controller.shutdown().await;
    Ok(())
}

async fn run_command(controller: &SessionController, cmd: Command) {
    match cmd {
        Command::Toggle => {
            if controller.snapshot().await.is_recording() {
                let result = controller
                    .stop_recording_with_hook(|s| println!("> {}", s.status_message))
                    .await;
                report(controller, result).await;
            } else {
                report(controller, controller.start_recording().await).await;
            }
        }
        Command::Replay => match controller.replay().await {
            Ok(PlaybackOutcome::Spoken { voice }) => {
                println!("replayed ({})", voice.as_deref().unwrap_or("default voice"));
            }
            Ok(PlaybackOutcome::Skipped(reason)) => println!("nothing spoken: {reason:?}"),
            Err(e) => println!("error: {e}"),
        },
        Command::SelectLanguages(src, tgt) => {
            let result = controller
                .select_languages(LanguageCode::new(src), LanguageCode::new(tgt))
                .await;
            report(controller, result).await;
        }
        Command::ListLanguages => print_languages(controller).await,
        Command::ListDevices => {
            let devices = list_input_devices();
            if devices.is_empty() {
                println!("no input devices found");
            }
            for name in devices {
                println!("  {name}");
            }
        }
        Command::Status => print_session(&controller.snapshot().await),
        Command::Help => print_help(),
        Command::Unknown(input) => println!("unknown command: {input} (try `help`)"),
        Command::Quit => {}
    }
}

// A failed start still moves the session (e.g. into Error), so show it either way.
async fn report(controller: &SessionController, result: Result<Session, ControllerError>) {
    match result {
        Ok(session) => print_session(&session),
        Err(e) => {
            println!("error: {e}");
            print_session(&controller.snapshot().await);
        }
    }
}

fn print_session(s: &Session) {
    println!(
        "[{}] {} -> {} | {}",
        s.status.label(),
        s.source_lang,
        s.target_lang,
        s.status_message
    );
    if let Some(err) = &s.error_message {
        println!("  error: {err}");
    }
    if let Some(text) = &s.original_text {
        println!("  original:   {text}");
    }
    if let Some(text) = &s.translated_text {
        println!("  translated: {text}");
    }
}

async fn print_languages(controller: &SessionController) {
    let catalog = controller.catalog().await;
    println!("  auto  Auto-Detect (source only)");
    for (code, name) in catalog.iter() {
        println!("  {code:<5} {name}");
    }
}

fn print_help() {
    println!("  <enter>, r         start / stop recording");
    println!("  p                  replay the last translation");
    println!("  lang <src> <tgt>   choose languages (src may be `auto`)");
    println!("  langs              list languages");
    println!("  devices            list input devices");
    println!("  s                  show status");
    println!("  q                  quit");
}
