use clap::Parser;
use jobconnect_chat::ChatController;
use jobconnect_cli::{App, ask::ask, config::Args, terminal::TerminalModes};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    if args.dotenv {
        let _ = dotenvy::dotenv();
    }
    init_tracing(&args.log_file)?;

    let prompt = args.ask.clone();
    let config = args.into_config()?;
    tracing::info!(endpoint = ?config.endpoint, "starting chat");
    let controller = ChatController::new(config.seed.clone(), config.transport()?);

    if let Some(prompt) = prompt {
        let mut stdout = std::io::stdout();
        return ask(&controller, &prompt, &mut stdout).await;
    }

    let app = App::new(controller, &config);
    let terminal = ratatui::init();
    let modes = TerminalModes::enable(&mut std::io::stdout()).unwrap_or_else(|err| {
        tracing::warn!(%err, "failed to enable terminal modes");
        TerminalModes::default()
    });
    let result = app.run(terminal).await;
    if let Err(err) = modes.restore(&mut std::io::stdout()) {
        tracing::warn!(%err, "failed to restore terminal modes");
    }
    ratatui::restore();
    result
}

// The terminal belongs to the TUI, so logs go to a file.
fn init_tracing(path: &Path) -> color_eyre::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
