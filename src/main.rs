//! gconsole - an interactive console for graph query languages.

use anyhow::{Context, Result};
use graph_console::backend::{ExecutionBackend, MockBackend};
use graph_console::cli::Cli;
use graph_console::config::Config;
use graph_console::console::Console;
use graph_console::error::ConsoleError;
use graph_console::logging;
use graph_console::output::OutputWriter;
use graph_console::persistence::{KeyValueStore, MemoryStore, StateDb};
use graph_console::session::SessionCoordinator;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{error, info};

fn main() {
    let cli = Cli::parse_args();

    let log_path = cli.log_path();
    match &log_path {
        Some(path) => logging::init_file_logging(path),
        None => logging::init_stderr_logging(),
    }

    if let Err(e) = run(cli) {
        match e.downcast_ref::<ConsoleError>() {
            Some(console_error) => error!("{}: {:#}", console_error.category(), e),
            None => error!("{e:#}"),
        }
        if log_path.is_some() {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    cli.validate().map_err(anyhow::Error::msg)?;
    let format = cli
        .parse_output_format()
        .map_err(anyhow::Error::msg)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(run_console(cli, config, OutputWriter::new(format)))
}

async fn run_console(cli: Cli, config: Config, writer: OutputWriter) -> Result<()> {
    let store = open_store(&cli, &config).await?;
    let backend: Arc<dyn ExecutionBackend> = Arc::new(MockBackend::new());
    let session = SessionCoordinator::new(backend, store, config.session_config()).await?;

    let console = Console::new(&session).split_only(cli.split_only);
    let reader = open_input(cli.script.as_deref()).await?;
    let prompt = cli.is_interactive();

    let mut out = std::io::stdout();
    let mut err = std::io::stderr();
    console
        .run_lines(reader, &writer, &mut out, &mut err, prompt)
        .await
        .context("Failed to read console input")?;

    session.shutdown();
    Ok(())
}

async fn open_store(cli: &Cli, config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    if cli.in_memory {
        info!("Using in-memory favorites store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let path = cli
        .state_db
        .clone()
        .or_else(|| config.storage.state_db.clone());
    let db = match path {
        Some(path) => StateDb::open(&path).await?,
        None => StateDb::open_default().await?,
    };
    info!("Using state database at {}", db.path().display());
    Ok(Arc::new(db))
}

async fn open_input(script: Option<&str>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match script {
        Some(path) if path != "-" => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open script {path}"))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}
