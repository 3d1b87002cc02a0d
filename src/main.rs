use anyhow::{Context, Result as AnyhowResult};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use workbench_fs::model::{WatchEvent, WatchEventKind};
use workbench_fs::services::event_buffer::run_buffered;
use workbench_fs::services::tracing_setup;
use workbench_fs::{FileSyncStore, MemoryProvider, SyncConfig};

/// Replay filesystem change events through the in-memory mirror
#[derive(Parser, Debug)]
#[command(name = "fsmirror")]
#[command(about = "In-memory container filesystem mirror", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a JSONL file of event batches, then run saves and print the result
    Replay {
        /// One JSON array of events per line
        #[arg(value_name = "EVENTS")]
        events: PathBuf,

        /// Save a file after the events are applied (repeatable)
        #[arg(long = "save", value_name = "PATH=CONTENT")]
        saves: Vec<String>,
    },
    /// Print the effective configuration as JSON
    DumpConfig,
    /// Print the JSON Schema of the configuration file
    Schema,
}

/// One event as written in a replay file
#[derive(Debug, Deserialize)]
struct EventRecord {
    kind: String,
    path: String,
    /// UTF-8 payload
    #[serde(default)]
    text: Option<String>,
    /// Raw payload, for binary or malformed content
    #[serde(default)]
    bytes: Option<Vec<u8>>,
}

impl From<EventRecord> for WatchEvent {
    fn from(record: EventRecord) -> Self {
        let event = WatchEvent::new(WatchEventKind::from(record.kind.as_str()), record.path);
        match (record.bytes, record.text) {
            (Some(bytes), _) => event.with_buffer(bytes),
            (None, Some(text)) => event.with_buffer(text),
            (None, None) => event,
        }
    }
}

fn load_config(path: Option<&Path>) -> AnyhowResult<SyncConfig> {
    match path {
        Some(path) => SyncConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(SyncConfig::default()),
    }
}

fn read_batches(path: &Path) -> AnyhowResult<Vec<Vec<WatchEvent>>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read events from {}", path.display()))?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| -> AnyhowResult<Vec<WatchEvent>> {
            let records: Vec<EventRecord> = serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid event batch", path.display(), idx + 1))?;
            Ok(records.into_iter().map(WatchEvent::from).collect())
        })
        .collect()
}

fn parse_save(arg: &str) -> AnyhowResult<(&str, &str)> {
    arg.split_once('=')
        .with_context(|| format!("Invalid --save '{}', expected PATH=CONTENT", arg))
}

async fn replay(config: SyncConfig, events: &Path, saves: &[String]) -> AnyhowResult<()> {
    let batches = read_batches(events)?;
    let window = config.buffer_window();
    let provider = Arc::new(MemoryProvider::new(config.work_dir.clone()));
    let store = Arc::new(FileSyncStore::new(provider, config));

    let (sender, receiver) = mpsc::unbounded_channel();
    let applier = Arc::clone(&store);
    let watcher = tokio::spawn(run_buffered(receiver, window, move |events| {
        applier.apply_events(events)
    }));

    for batch in batches {
        let _ = sender.send(batch);
    }
    drop(sender);
    watcher.await.context("Watch task failed")?;

    let mut failed = 0;
    for save in saves {
        let (path, content) = parse_save(save)?;
        if let Err(e) = store.save_file(path, content).await {
            eprintln!("Error: {}", e);
            failed += 1;
        }
    }

    let snapshot =
        serde_json::to_string_pretty(&store.files()).context("Failed to serialize snapshot")?;
    println!("{}", snapshot);
    println!("files: {}", store.files_count());

    match store.get_modifications().to_message() {
        Some(message) => println!("{}", message),
        None => println!("no modifications"),
    }

    if failed > 0 {
        anyhow::bail!("{} of {} saves failed", failed, saves.len());
    }
    Ok(())
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    match &args.command {
        Command::Schema => {
            let schema = schema_for!(SyncConfig);
            let output =
                serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
            println!("{}", output);
            return Ok(());
        }
        Command::DumpConfig => {
            let config = load_config(args.config.as_deref())?;
            let output =
                serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("{}", output);
            return Ok(());
        }
        Command::Replay { .. } => {}
    }

    let warning_log_handle = tracing_setup::init_global(args.log_file.as_deref())
        .context("Failed to initialize logging")?;
    let config = load_config(args.config.as_deref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start runtime")?;

    let result = match &args.command {
        Command::Replay { events, saves } => runtime.block_on(replay(config, events, saves)),
        Command::DumpConfig | Command::Schema => Ok(()),
    };

    let warnings = warning_log_handle.drain();
    if !warnings.is_empty() {
        eprintln!("{} warning(s) during replay:", warnings.len());
        for warning in warnings {
            eprintln!("  {}", warning);
        }
    }

    result
}
