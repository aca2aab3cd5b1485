//! Insight commands: list cards, export them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color};
use console::style;
use uuid::Uuid;

use praxis_core::service::ExportFormat;
use praxis_types::practice::InsightType;
use praxis_types::record::InsightFilter;

use super::display;
use super::practice::OutputMode;
use crate::state::AppState;

/// `praxis insight [INPUT_ID] [--type T] [--min-intensity N]`
pub async fn list(
    state: &AppState,
    input_id: Option<String>,
    insight_type: Option<String>,
    min_intensity: Option<u8>,
    out: OutputMode,
) -> Result<()> {
    let filter = InsightFilter {
        input_id: input_id
            .map(|id| Uuid::parse_str(id.trim()).with_context(|| format!("'{id}' is not a valid id")))
            .transpose()?,
        insight_type: insight_type
            .map(|t| t.parse::<InsightType>().map_err(|e| anyhow::anyhow!(e)))
            .transpose()?,
        min_intensity,
    };

    let insights = state.service.insights(&filter).await?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }
    if out.quiet {
        return Ok(());
    }

    if insights.is_empty() {
        display::info("No insight cards match. Finish a practice session to earn some.");
        return Ok(());
    }

    let mut table = display::table(&["#", "Title", "Type", "Intensity", "Micro-practice"]);
    for (i, stored) in insights.iter().enumerate() {
        let card = &stored.card;
        let intensity_color = match card.intensity {
            5 | 4 => Color::Red,
            3 => Color::Yellow,
            _ => Color::Green,
        };
        table.add_row(vec![
            Cell::new(i + 1).fg(Color::DarkGrey),
            Cell::new(&card.title),
            Cell::new(card.insight_type).fg(Color::Cyan),
            Cell::new(card.intensity).fg(intensity_color),
            Cell::new(display::truncate(&card.micro_practice, 60)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// `praxis export [--format md|json] [--output F]`
pub async fn export(state: &AppState, format: &str, output: Option<PathBuf>, out: OutputMode) -> Result<()> {
    let format = format.parse::<ExportFormat>().map_err(|e| anyhow::anyhow!(e))?;
    let (count, text) = state.service.export(format).await?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &text)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            if out.json {
                let body = serde_json::json!({
                    "path": path.display().to_string(),
                    "count": count,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else if !out.quiet {
                display::success(&format!(
                    "Exported {count} insight card(s) to {}",
                    style(path.display()).cyan()
                ));
                println!();
            }
        }
        None => print!("{text}"),
    }
    Ok(())
}
