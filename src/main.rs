use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use voice_agent::console::{self, ConsoleRenderer};
use voice_agent::speech::{ConsoleMicrophone, ConsoleRecognizer, ConsoleSynthesizer};
use voice_agent::{
    Config, FileStore, HttpBackend, Persona, RetryPolicy, Runtime, SessionController, SpeechDevices,
};

/// Terminal client for the voice assistant backend
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file (without extension: .toml, .yaml and .json are tried)
    #[arg(long, default_value = "config/voice-agent")]
    config: String,

    /// Backend base URL, overriding the config file
    #[arg(long)]
    backend: Option<String>,

    /// Initial persona
    #[arg(long)]
    persona: Option<Persona>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut cfg = Config::load(&cli.config)?;
    if let Some(url) = cli.backend {
        cfg.backend.base_url = url;
    }

    let persona = match cli.persona {
        Some(persona) => persona,
        None => cfg.voice.persona.parse()?,
    };

    info!("Voice Agent v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", cfg.backend.base_url);

    let store = Arc::new(FileStore::open(cfg.storage.dir()?)?);
    let backend = Arc::new(HttpBackend::new(&cfg.backend)?);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let recognizer = Arc::new(ConsoleRecognizer::new(events_tx.clone()));
    let devices = SpeechDevices {
        microphone: Arc::new(ConsoleMicrophone::new()),
        recognizer: recognizer.clone(),
        synthesizer: Arc::new(ConsoleSynthesizer::new(
            events_tx.clone(),
            cfg.voice.words_per_minute,
        )),
    };

    let retry = RetryPolicy {
        max_attempts: cfg.session.max_connect_attempts,
        delay: cfg.session.reconnect_delay(),
    };
    let mut controller = SessionController::new(cfg.session.clone(), persona, store);

    println!("{}", console::HELP);
    let input_events = events_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = console::read_input(recognizer, input_events).await {
            error!("Console input failed: {:#}", e);
        }
    });

    let runtime = Runtime::new(backend, devices, events_tx, retry);
    runtime
        .run(&mut controller, events_rx, &mut ConsoleRenderer::default())
        .await
}
