/*
[INPUT]:  CLI arguments, optional YAML configuration file, OS shutdown signals
[OUTPUT]: Submitted documents tracked to a downloaded contestation, or service queries
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use avopoint_adapter::{AvopointClient, Document, DocumentKind, DocumentSet};
use avopoint_tracker::render::render;
use avopoint_tracker::{SessionView, TrackerConfig, TrackingSession};

#[derive(Parser, Debug)]
#[command(name = "avopoint", version, about = "Submit traffic-fine documents and track their processing")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    /// Overrides the base address from the configuration file
    #[arg(long = "base-url", value_name = "URL", global = true)]
    base_url: Option<String>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit the four documents and follow processing until done
    Submit {
        #[arg(long, value_name = "PATH")]
        contravention: PathBuf,
        #[arg(long, value_name = "PATH")]
        certificat: PathBuf,
        #[arg(long, value_name = "PATH")]
        permis: PathBuf,
        #[arg(long, value_name = "PATH")]
        domicile: PathBuf,
        /// Where to save the generated letter
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Check that the service is up
    Health,
    /// List known tasks
    Tasks,
    /// Delete a task and its files
    Delete { task_id: String },
    /// Download the result of a completed task
    Result {
        task_id: String,
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = load_config(args.config_path.as_deref(), args.base_url)?;
    info!(base_url = %config.base_url, "configuration loaded");
    let client = config.build_client().context("build http client")?;

    match args.command {
        Command::Submit {
            contravention,
            certificat,
            permis,
            domicile,
            output,
        } => {
            let paths = [
                (DocumentKind::Contravention, contravention),
                (DocumentKind::Certificat, certificat),
                (DocumentKind::Permis, permis),
                (DocumentKind::Domicile, domicile),
            ];
            run_submit(client, &paths, output).await
        }
        Command::Health => run_health(&client).await,
        Command::Tasks => run_tasks(&client).await,
        Command::Delete { task_id } => {
            let response = client.delete_task(&task_id).await.context("delete task")?;
            println!("{}", style(response.message).green());
            Ok(())
        }
        Command::Result { task_id, output } => {
            let bytes = client.task_result(&task_id).await.context("download result")?;
            let path = output.unwrap_or_else(|| default_output(&task_id));
            save_result(&path, &bytes).await
        }
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(path: Option<&Path>, base_url: Option<String>) -> Result<TrackerConfig> {
    let mut config = match path {
        Some(path) => {
            let path_str = path.to_str().context("config path must be valid utf-8")?;
            TrackerConfig::from_file(path_str).context("load config")?
        }
        None => TrackerConfig::default(),
    };
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    Ok(config)
}

async fn load_documents(paths: &[(DocumentKind, PathBuf)]) -> Result<DocumentSet> {
    let mut documents = DocumentSet::new();
    for (kind, path) in paths {
        let document = Document::from_path(path)
            .await
            .with_context(|| format!("read {} from {}", kind.label(), path.display()))?;
        documents.insert(*kind, document);
    }
    Ok(documents)
}

async fn run_submit(
    client: AvopointClient,
    paths: &[(DocumentKind, PathBuf)],
    output: Option<PathBuf>,
) -> Result<()> {
    let documents = load_documents(paths).await?;
    let mut session = TrackingSession::new(Arc::new(client));

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    println!("{}", render(&session.view()));
    let submitted = tokio::select! {
        _ = shutdown.cancelled() => None,
        submitted = session.submit(&documents) => Some(submitted),
    };
    let Some(submitted) = submitted else {
        session.reset();
        info!("submission interrupted");
        return Ok(());
    };
    let task_id = match submitted {
        Ok(task_id) => task_id,
        Err(err) => {
            println!("{}", render(&session.view()));
            return Err(err).context("submit documents");
        }
    };
    info!(task_id = %task_id, "tracking task");

    let mut last_view = session.view();
    println!("{}", render(&last_view));
    loop {
        let update = tokio::select! {
            _ = shutdown.cancelled() => None,
            update = session.next_update() => Some(update),
        };
        let Some(update) = update else {
            info!(task_id = %task_id, "shutdown signal received; resetting session");
            session.reset();
            return Ok(());
        };
        let Some(update) = update.context("track task")? else {
            break;
        };

        let view = session.view();
        if view != last_view {
            println!("\n{}", render(&view));
            last_view = view;
        }
        if update.is_terminal() {
            break;
        }
    }

    match session.view() {
        SessionView::Success { task_id } => {
            let bytes = session.fetch_result().await.context("download result")?;
            let path = output.unwrap_or_else(|| default_output(&task_id));
            save_result(&path, &bytes).await
        }
        SessionView::Failure { error, .. } => Err(anyhow!(error)),
        other => Err(anyhow!("tracking ended unexpectedly: {other:?}")),
    }
}

async fn run_health(client: &AvopointClient) -> Result<()> {
    let health = client.health().await.context("query health")?;
    let label = if health.is_healthy() {
        style(health.status.as_str()).green()
    } else {
        style(health.status.as_str()).red()
    };
    println!("{} {} (version {})", style("Service").bold(), label, health.version);
    Ok(())
}

async fn run_tasks(client: &AvopointClient) -> Result<()> {
    let list = client.list_tasks().await.context("list tasks")?;
    if list.tasks.is_empty() {
        println!("{}", style("No tasks found.").yellow());
        return Ok(());
    }
    for task in &list.tasks {
        println!(
            "{}  {:<24} {:>3}%",
            style(&task.task_id).dim(),
            task.status.as_str(),
            task.progress
        );
    }
    Ok(())
}

fn default_output(task_id: &str) -> PathBuf {
    PathBuf::from(format!("contestation_{task_id}.pdf"))
}

async fn save_result(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    println!(
        "{} {}",
        style("Contestation enregistrée:").bold().green(),
        path.display()
    );
    Ok(())
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
