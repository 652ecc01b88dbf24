//! The `run` command: drive a sweep file to completion.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::info;

use crate::adapters::channels::RedisChannel;
use crate::domain::models::{CommandItem, Config};
use crate::domain::queues::{ExplicitQueue, MultiQueue, Queue};
use crate::services::{EngineEvent, EngineSettings, JobEngine, ResultsLog};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Sweep file listing named queues of items (YAML)
    #[arg(long, value_name = "PATH")]
    pub sweep: PathBuf,

    /// Results log path (overrides engine.results_path)
    #[arg(long, value_name = "PATH")]
    pub results: Option<PathBuf>,

    /// Force the local tracker regardless of the configured kind
    #[arg(long)]
    pub local: bool,
}

/// Sweep file shape: named lists of items to run.
#[derive(Debug, Deserialize)]
struct SweepFile {
    queues: Vec<SweepQueue>,
}

#[derive(Debug, Deserialize)]
struct SweepQueue {
    name: String,
    items: Vec<CommandItem>,
}

pub async fn execute(args: RunArgs, config: &Config, json_mode: bool) -> Result<()> {
    let sweep_text = tokio::fs::read_to_string(&args.sweep)
        .await
        .with_context(|| format!("Failed to read sweep file {}", args.sweep.display()))?;
    let sweep: SweepFile = serde_yaml::from_str(&sweep_text)
        .with_context(|| format!("Failed to parse sweep file {}", args.sweep.display()))?;
    let total_items: usize = sweep.queues.iter().map(|q| q.items.len()).sum();
    let queue = build_queue(sweep)?;

    let tracker_kind = if args.local {
        "local"
    } else {
        config.tracker.kind.as_str()
    };
    let tracker = super::build_tracker(config, tracker_kind, true).await?;

    let channel = RedisChannel::connect(&config.channel)
        .await
        .with_context(|| format!("Failed to connect to channel at {}", config.channel.url()))?;

    let results_path = args
        .results
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.engine.results_path));
    let results = ResultsLog::create(&results_path)?;

    let settings = EngineSettings::from_config(&config.engine);
    let mut engine = JobEngine::new(settings, tracker, queue, Box::new(channel), results);

    if !json_mode {
        println!(
            "Starting {} engine over {} items",
            console::style(&config.engine.name).bold(),
            total_items
        );
        println!("   Tracker: {tracker_kind}");
        println!(
            "   Channel: {} on {}",
            config.channel.channel,
            config.channel.url()
        );
        println!("   Results: {}", results_path.display());
        println!();
    }

    let (event_tx, mut event_rx) = mpsc::channel::<EngineEvent>(100);

    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match &event {
                EngineEvent::Started => {
                    if !json_mode {
                        println!("Engine started");
                    }
                }
                EngineEvent::JobDispatched { name, command } => {
                    if !json_mode {
                        println!("  {} {}", console::style(name).cyan(), command.join(" "));
                    }
                }
                EngineEvent::ResultRecorded { name, score } => {
                    if !json_mode {
                        println!("  {} scored {score:.6}", console::style(name).green());
                    }
                }
                EngineEvent::JobPresumedDead { name } => {
                    if !json_mode {
                        println!(
                            "  {} {}",
                            console::style(name).red(),
                            console::style("presumed dead").red()
                        );
                    }
                }
                EngineEvent::QueueSaved { path } => {
                    if !json_mode {
                        println!("  Queue state saved to {}", path.display());
                    }
                }
                EngineEvent::QueueRestored { path } => {
                    if !json_mode {
                        println!("  Queue state restored from {}", path.display());
                    }
                }
                EngineEvent::Finished(_) => {
                    break;
                }
            }
        }
    });

    let run_result = engine.run(event_tx).await;
    let _ = event_handler.await;

    match run_result {
        Ok(stats) => {
            if json_mode {
                let output = serde_json::json!({
                    "dispatched": stats.dispatched,
                    "results": stats.results,
                    "presumed_dead": stats.presumed_dead,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!();
                println!(
                    "Sweep complete: {} dispatched, {} results, {} presumed dead",
                    stats.dispatched, stats.results, stats.presumed_dead
                );
            }
            Ok(())
        }
        Err(e) => {
            if !json_mode {
                println!("\nEngine error: {e}");
            }
            Err(e.into())
        }
    }
}

/// One named list becomes a plain FIFO; several become a round-robin
/// multiplex of FIFOs.
fn build_queue(sweep: SweepFile) -> Result<Box<dyn Queue<CommandItem>>> {
    let mut queues = sweep.queues;
    match queues.len() {
        0 => bail!("sweep file defines no queues"),
        1 => {
            let only = queues.remove(0);
            info!(queue = %only.name, items = only.items.len(), "single-queue sweep");
            Ok(Box::new(ExplicitQueue::from_items(only.items)))
        }
        _ => {
            let mut multi = MultiQueue::new();
            for queue in queues {
                info!(queue = %queue.name, items = queue.items.len(), "adding sweep queue");
                multi.add_queue(queue.name, ExplicitQueue::from_items(queue.items))?;
            }
            Ok(Box::new(multi))
        }
    }
}
