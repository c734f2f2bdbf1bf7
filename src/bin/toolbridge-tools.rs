//! Bundled tool server: `get_time`, `read_text` and `list_dir` over stdio.
//!
//! stdout carries protocol traffic only; logs go to stderr.

use anyhow::Result;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use toolbridge::config::ENV_DEBUG;
use toolbridge::mcp::ToolServer;
use toolbridge::tools::ToolRunner;

#[tokio::main]
async fn main() -> Result<()> {
    let debug = std::env::var(ENV_DEBUG).map(|v| v.trim() == "1").unwrap_or(false);
    let filter = if debug {
        EnvFilter::new("toolbridge=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let server = ToolServer::new(ToolRunner::new_with_defaults());
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}
