use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubesync_core::{
    DocumentStore, FileStore, FirestoreConfig, FirestoreStore, MemoryStore, SyncConfig,
    VIDEOS_COLLECTION, VideoSyncJob, YouTubeClient, format_outcome, format_videos_readable,
    run_every, store::file::default_store_path,
};

/// Where synced videos are written
#[derive(Clone, Copy, Default, ValueEnum)]
enum StoreKind {
    /// JSON file on local disk
    #[default]
    File,
    /// Cloud Firestore (or its emulator)
    Firestore,
    /// Process memory, discarded on exit
    Memory,
}

#[derive(Parser)]
#[command(name = "tubesync")]
#[command(about = "Keep a document store in sync with a YouTube channel's latest uploads")]
struct Cli {
    /// Channel to poll. Defaults to $YOUTUBE_CHANNEL_ID.
    #[arg(long, global = true)]
    channel_id: Option<String>,

    /// Store backend
    #[arg(short, long, global = true, default_value = "file", env = "TUBESYNC_STORE")]
    store: StoreKind,

    /// Path of the file store. Defaults to the platform data directory.
    #[arg(long, global = true, env = "TUBESYNC_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Target collection
    #[arg(long, global = true, default_value = VIDEOS_COLLECTION)]
    collection: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Subcommand)]
enum Command {
    /// Sync once and exit
    Run,
    /// Sync now and then on a fixed interval until Ctrl-C
    Watch {
        /// Seconds between runs
        #[arg(
            long,
            default_value_t = 3600,
            env = "TUBESYNC_INTERVAL_SECS",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        every_secs: u64,
    },
    /// Print the videos held by the file store
    Show,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tubesync=info,tubesync_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_store(cli: &Cli, http: &reqwest::Client) -> Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match cli.store {
        StoreKind::File => Arc::new(FileStore::new(file_store_path(cli))),
        StoreKind::Firestore => {
            let config = FirestoreConfig::from_env().context("Firestore store selected")?;
            info!(?config, "using Firestore");
            Arc::new(FirestoreStore::new(http.clone(), config))
        }
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

fn file_store_path(cli: &Cli) -> PathBuf {
    cli.data_file.clone().unwrap_or_else(default_store_path)
}

fn build_job(cli: &Cli) -> Result<VideoSyncJob> {
    let config = SyncConfig::from_env(cli.channel_id.clone())?;
    info!(?config, "configuration loaded");

    let http = reqwest::Client::new();
    let store = build_store(cli, &http)?;
    let client = YouTubeClient::new(http, &config);

    Ok(VideoSyncJob::new(client, store, config.channel_id).with_collection(cli.collection.clone()))
}

async fn show(cli: &Cli) -> Result<()> {
    let path = file_store_path(cli);
    let documents = FileStore::new(&path).list(&cli.collection).await?;

    println!(
        "{} {} video{} in {}\n",
        style("✓").green().bold(),
        documents.len(),
        if documents.len() == 1 { "" } else { "s" },
        style(path.display()).dim()
    );
    print!("{}", format_videos_readable(&documents));
    Ok(())
}

async fn sync_once(job: &VideoSyncJob) -> Result<()> {
    let spinner = create_spinner(&format!("Syncing channel {}...", job.channel_id()));
    let outcome = job.run().await;
    let mark = if outcome.is_some() {
        style("✓").green().bold()
    } else {
        style("✗").red().bold()
    };
    spinner.finish_with_message(format!("{} {}", mark, format_outcome(outcome)));
    Ok(())
}

async fn watch(job: &VideoSyncJob, every_secs: u64) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for Ctrl-C, scheduler will run until killed");
                // Hold the sender so the scheduler keeps going.
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    run_every(Duration::from_secs(every_secs), shutdown_rx, move || async move {
        job.run().await;
    })
    .await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    init_tracing();

    let cli = Cli::parse();

    println!(
        "\n{}  {}\n",
        style("tubesync").cyan().bold(),
        style("YouTube → document store").dim()
    );

    let every_secs = match cli.command {
        Command::Show => return show(&cli).await,
        Command::Run => None,
        Command::Watch { every_secs } => Some(every_secs),
    };

    // Validate config early
    let job = match build_job(&cli) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    match every_secs {
        Some(every_secs) => watch(&job, every_secs).await,
        None => sync_once(&job).await,
    }
}
