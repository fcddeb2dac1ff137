use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use llmchat_core::{ChatSession, Config, LlmClient, BASE_URL_ENV};

mod app;
mod handler;
mod logger;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "llmchat", version)]
#[command(about = "Chat with an /llm backend: chat, web search, site Q&A and file questions")]
struct Cli {
    /// Backend base URL (overrides config and LLMCHAT_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Path to a config file (defaults to <config dir>/llmchat/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pages to crawl when asking about a site
    #[arg(long, global = true)]
    max_pages: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Send one message and print the exchange
    Ask {
        /// Message text
        text: Option<String>,
        /// Attach a file (repeatable)
        #[arg(short, long)]
        file: Vec<PathBuf>,
        /// Use one-shot generation instead of chat for plain prompts
        #[arg(long)]
        generate: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let mut config = config
        .with_env_overrides()
        .with_base_url_override(cli.base_url.as_deref());
    if let Some(max_pages) = cli.max_pages {
        config.max_pages = max_pages;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Ask {
            text,
            file,
            generate,
        }) => {
            logger::init(&config.log_level, None)?;
            ask(&config, text.as_deref().unwrap_or(""), file, generate).await
        }
        Some(Commands::Chat) | None => {
            let log_path = logger::default_log_path();
            logger::init(&config.log_level, log_path.as_deref())?;
            run_tui(&config).await
        }
    }
}

async fn ask(config: &Config, text: &str, files: Vec<PathBuf>, generate: bool) -> Result<()> {
    let client = LlmClient::new(&config.base_url).with_endpoint(&config.endpoint);
    let mut session = ChatSession::new(config.max_pages);
    if generate {
        session = session.one_shot();
    }
    for path in files {
        if !path.is_file() {
            bail!("File not found: {}", path.display());
        }
        session.add_file(path);
    }

    let Some(dispatch) = session.prepare(text) else {
        bail!("Nothing to send: give a message or at least one --file");
    };

    let completion = dispatch.run(&client).await;
    let alert = session.complete(completion);

    print!("{}", session.transcript().render_plain());
    if let Some(message) = alert {
        bail!(
            "{} (backend: {}, override with --base-url or {})",
            message,
            client.url(),
            BASE_URL_ENV
        );
    }
    Ok(())
}

async fn run_tui(config: &Config) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(config);
    tracing::info!(url = %app.endpoint_url, "chat session started");

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}
