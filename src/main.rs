//! toolbridge CLI entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use toolbridge::agent::{ChatClient, OllamaClient};
use toolbridge::config::Config;
use toolbridge::session::{stdin_lines, LiveSession, SessionEnd};
use toolbridge::ui;

#[derive(Parser)]
#[command(name = "toolbridge")]
#[command(about = "Chat with a local model that can call tools from a stdio tool server")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.toolbridge/config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Chat endpoint base URL
    #[arg(long, global = true)]
    host: Option<String>,

    /// Model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Command line that starts the tool server
    #[arg(long, global = true)]
    server_cmd: Option<String>,

    /// Verbose diagnostics on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,

    /// List the tools the server advertises
    Tools,

    /// Run a single turn and print the answer
    Ask {
        /// Message to send
        #[arg(short, long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = toolbridge::config::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.ollama_host = host;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(cmd) = cli.server_cmd {
        config.server_cmd = Some(cmd);
    }
    config.debug |= cli.debug;

    init_logging(config.debug);
    config.validate()?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(&config).await?,
        Commands::Tools => {
            let mut session = start(&config).await?;
            ui::print_tools(session.tools());
            session.shutdown().await;
        }
        Commands::Ask { message } => {
            let mut session = start(&config).await?;
            let result = session.handle_turn(&message).await;
            session.shutdown().await;
            println!("{}", result?.answer.unwrap_or_default());
        }
    }

    Ok(())
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("toolbridge=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Open a live session. On failure the model is still asked to unload.
async fn start(config: &Config) -> Result<LiveSession> {
    match LiveSession::start(config).await {
        Ok(session) => Ok(session),
        Err(e) => {
            if let Err(unload) = OllamaClient::from_config(config).unload().await {
                tracing::debug!("model unload failed (ignored): {}", unload);
            }
            Err(e.into())
        }
    }
}

async fn run_chat(config: &Config) -> Result<()> {
    let server_cmd = config.resolved_server_cmd()?;
    ui::print_header(&config.ollama_host, &config.model, &server_cmd);

    let mut session = start(config).await?;
    let mut stdout = std::io::stdout();
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let end = session.run(stdin_lines(), &mut stdout, interrupt).await;
    session.shutdown().await;

    match end? {
        SessionEnd::Interrupted => ui::print_step("Interrupted"),
        SessionEnd::ExitCommand | SessionEnd::EndOfInput => ui::print_step("Bye"),
    }
    Ok(())
}
