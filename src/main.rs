use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

mod app;
mod chat;
mod client;
mod config;
mod handler;
mod input;
mod login;
mod markdown;
mod tui;
mod ui;

use app::App;
use config::{Config, Overrides, ScreenChoice};
use tui::EventHandler;

#[derive(Parser, Debug)]
#[command(name = "finsage", version)]
#[command(about = "Terminal chat client for the FinSage financial guidance service")]
struct Cli {
    /// Which screen to open
    #[arg(long, value_enum)]
    screen: Option<ScreenChoice>,
    /// Base URL of the FinSage service (requests go to <URL>/query)
    #[arg(long, env = "FINSAGE_ENDPOINT")]
    endpoint: Option<String>,
    /// Config file to read instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
    /// Pause before showing a reply, in milliseconds
    #[arg(long)]
    reply_delay_ms: Option<u64>,
    /// Give up on a request after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Where to write logs (the terminal is owned by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Remember the options given here in the config file
    #[arg(long)]
    save: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            endpoint: self.endpoint.clone(),
            reply_delay_ms: self.reply_delay_ms,
            timeout_secs: self.timeout_secs,
            screen: self.screen,
        }
    }
}

fn init_tracing(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = match &cli.log_file {
        Some(path) => path.clone(),
        None => config::default_log_path()?,
    };
    init_tracing(&log_path)?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::get_config_path()?,
    };
    let mut file_config = Config::load_from(&config_path)?;
    if cli.save {
        file_config.remember(&cli.overrides());
        file_config.save_to(&config_path)?;
        info!(path = %config_path.display(), "saved configuration");
    }
    let settings = file_config.resolve(&cli.overrides());
    info!(
        endpoint = %settings.endpoint,
        screen = ?settings.screen,
        reply_delay_ms = settings.reply_delay.as_millis() as u64,
        timeout_secs = settings.timeout.as_secs(),
        "starting finsage"
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(&settings, events.sender());

    let result = run(&mut terminal, &mut events, &mut app).await;

    app.shutdown();
    tui::restore()?;
    info!("finsage exited");
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => {
                debug!("event channel closed");
                break;
            }
        }
    }
    Ok(())
}
