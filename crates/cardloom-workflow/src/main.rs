/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Task submissions, status views, outline selection, and flashcard output
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

mod cli;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use cardloom_workflow::AppConfig;

use cli::Command;

#[derive(Parser, Debug)]
#[command(name = "cardloom", version, about = "Turn documents into flashcards")]
struct Cli {
    /// Defaults to the platform config dir (cardloom/config.yaml)
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    /// Overrides logging.level from the config file
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    log_level: Option<String>,
    /// Validate configuration (and a submission) without calling the backend
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if let Command::Init { output } = &args.command {
        let output = match output {
            Some(path) => path.clone(),
            None => AppConfig::default_path()?,
        };
        return cli::init::run_init(&output);
    }

    let config_path = match &args.config_path {
        Some(path) => path.clone(),
        None => AppConfig::default_path()?,
    };
    let config = load_config(&config_path)?;
    let log_level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    let _log_guard = init_tracing(log_level, config.logging.file.as_deref())?;

    info!(
        config_path = %config_path.display(),
        base_url = %config.api.base_url,
        dry_run = args.dry_run,
        "starting cardloom"
    );

    if args.dry_run {
        if let Command::Submit(submit) = &args.command {
            let (task_type, workflow_type) =
                cli::commands::precheck(submit).context("invalid submission")?;
            info!(%task_type, %workflow_type, "submission validated");
        }
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    cli::commands::execute(args.command, &config, shutdown).await
}

fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;

    let Some(log_file) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow!(err))
            .context("initialize tracing subscriber")?;
        return Ok(None);
    };

    let directory = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .context("logging.file must name a file")?;
    std::fs::create_dir_all(directory)
        .with_context(|| format!("create log directory {}", directory.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        directory, file_name,
    ));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(Some(guard))
}

fn load_config(path: &Path) -> Result<AppConfig> {
    AppConfig::from_file(path).context("load config")
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
