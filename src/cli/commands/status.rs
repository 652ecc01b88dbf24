//! The `status` command: one liveness query, rendered as a table.

use anyhow::Result;
use comfy_table::{presets, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::domain::models::{Config, JobName};

pub async fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let tracker = super::build_tracker(config, &config.tracker.kind, false).await?;
    let live = tracker.live_jobs().await?;

    if json_mode {
        let output = serde_json::json!({
            "tracker": tracker.name(),
            "running": live.running.iter().map(JobName::as_str).collect::<Vec<_>>(),
            "queued": live.queued.iter().map(JobName::as_str).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if live.is_empty() {
        println!("No live jobs on the {} tracker.", tracker.name());
        return Ok(());
    }

    println!(
        "{} live jobs on the {} tracker ({} running, {} queued):",
        console::style(live.running.len() + live.queued.len()).bold(),
        tracker.name(),
        live.running.len(),
        live.queued.len()
    );

    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("NAME").set_alignment(CellAlignment::Left),
            Cell::new("STATE").set_alignment(CellAlignment::Left),
        ]);
    for name in &live.running {
        table.add_row(vec![
            Cell::new(name.as_str()),
            Cell::new("running").fg(Color::Green),
        ]);
    }
    for name in &live.queued {
        table.add_row(vec![
            Cell::new(name.as_str()),
            Cell::new("queued").fg(Color::Yellow),
        ]);
    }
    println!("{table}");

    Ok(())
}
