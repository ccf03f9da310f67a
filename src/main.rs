//! CLI entry point for urqmd-ingest
//!
//! Provides command-line interface for:
//! - Ingesting an event log into an Arrow columnar store
//! - Quick-look per-event particle counts without writing anything
//! - Inspecting the shape of an existing store file
//!
//! # Usage
//!
//! Ingest a run:
//! ```bash
//! urqmd-ingest ingest AuAu_200GeV.f14 --output particles.arrow
//! ```
//!
//! Quick look at a file:
//! ```bash
//! urqmd-ingest events AuAu_200GeV.f14
//! ```
//!
//! Inspect a store:
//! ```bash
//! urqmd-ingest inspect particles.arrow
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use urqmd_ingest::config::IngestConfig;
use urqmd_ingest::error::IngestError;
use urqmd_ingest::pipeline::IngestPipeline;
use urqmd_ingest::{f14, logging, store};

#[derive(Parser)]
#[command(name = "urqmd-ingest")]
#[command(about = "Stream UrQMD event logs into an Arrow columnar store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest an event log into a new columnar store file
    Ingest {
        /// Path to the .f14 event log
        input: PathBuf,

        /// Path of the store file to create
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration file (TOML); defaults to urqmd-ingest.toml if present
        #[arg(long)]
        config: Option<PathBuf>,

        /// Lines per read batch (overrides configuration)
        #[arg(long)]
        chunk_lines: Option<usize>,

        /// Queue capacity in chunks (overrides configuration)
        #[arg(long)]
        queue_capacity: Option<usize>,

        /// Leave out the event_id / event_impact_parameter columns
        #[arg(long)]
        no_event_columns: bool,

        /// Log level (overrides configuration)
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Print per-event particle counts without writing a store
    Events {
        /// Path to the .f14 event log
        input: PathBuf,
    },

    /// Print the schema and row counts of an existing store file
    Inspect {
        /// Path to a store file written by `ingest`
        store: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            input,
            output,
            config,
            chunk_lines,
            queue_capacity,
            no_event_columns,
            log_level,
        } => {
            ingest(
                input,
                output,
                config,
                chunk_lines,
                queue_capacity,
                no_event_columns,
                log_level,
            )
            .await
        }
        Commands::Events { input } => events(&input),
        Commands::Inspect { store } => inspect(&store),
    }
}

#[allow(clippy::too_many_arguments)]
async fn ingest(
    input: PathBuf,
    output: PathBuf,
    config_path: Option<PathBuf>,
    chunk_lines: Option<usize>,
    queue_capacity: Option<usize>,
    no_event_columns: bool,
    log_level: Option<String>,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => IngestConfig::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => IngestConfig::load().context("loading configuration")?,
    };
    if let Some(lines) = chunk_lines {
        config.reader.chunk_lines = lines;
    }
    if let Some(capacity) = queue_capacity {
        config.reader.queue_capacity = capacity;
    }
    if no_event_columns {
        config.store.include_event_columns = false;
    }
    if let Some(level) = log_level {
        config.application.log_level = level;
    }
    config.validate().map_err(IngestError::Configuration)?;
    logging::init(&config.application.log_level);

    let pipeline = IngestPipeline::new(config);
    let stop = pipeline.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            eprintln!("🛑 Interrupt received - finishing the current batch...");
            stop.stop();
        }
    });

    println!(
        "🚀 Ingesting {} into {}",
        input.display(),
        output.display()
    );

    let summary = pipeline
        .ingest_file(&input, &output)
        .await
        .with_context(|| format!("ingesting {}", input.display()))?;

    println!();
    if summary.cancelled {
        println!("🛑 Run cancelled - the store holds the rows ingested so far");
    }
    println!("✅ Ingestion finished in {:.2?}", summary.elapsed);
    println!("   Lines read:      {}", summary.lines_read);
    println!("   Particle rows:   {}", summary.particle_rows);
    println!("   Rows written:    {}", summary.rows_written);
    println!("   Rows dropped:    {}", summary.rows_dropped);
    println!("   Chunks written:  {}", summary.chunks_written);
    println!("   Events observed: {}", summary.events_seen);
    if summary.orphan_rows > 0 {
        println!(
            "⚠️  Orphan rows:     {} (before the first event header)",
            summary.orphan_rows
        );
    }
    Ok(())
}

fn events(input: &Path) -> Result<()> {
    logging::init("warn");

    let file = std::fs::File::open(input)
        .with_context(|| format!("opening {}", input.display()))?;
    let counts = f14::scan_events(std::io::BufReader::new(file))?;

    for count in &counts {
        println!("event {:>7}: {} particles", count.event_id, count.particle_rows);
    }
    let total: u64 = counts.iter().map(|c| c.particle_rows).sum();
    println!();
    println!("✅ {} events, {} particle rows", counts.len(), total);
    Ok(())
}

fn inspect(store_path: &Path) -> Result<()> {
    logging::init("warn");

    let summary = store::summarize_store(store_path)
        .with_context(|| format!("reading {}", store_path.display()))?;

    println!("📦 {}", store_path.display());
    println!("   Rows:    {}", summary.rows);
    println!("   Batches: {}", summary.batches);
    match summary.events {
        Some(events) => println!("   Events:  {events}"),
        None => println!("   Events:  (store has no event column)"),
    }
    println!("   Schema:");
    for (name, dtype) in &summary.fields {
        println!("     {name:<24} {dtype}");
    }
    Ok(())
}
