//! Read-only record commands: list, show.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color};
use console::style;
use uuid::Uuid;

use praxis_types::practice::InputType;

use super::display;
use super::practice::OutputMode;
use crate::state::AppState;

/// `praxis list [--type T] [--limit N]`
pub async fn list(state: &AppState, input_type: Option<String>, limit: u32, out: OutputMode) -> Result<()> {
    let input_type = input_type
        .map(|t| t.parse::<InputType>().map_err(|e| anyhow::anyhow!(e)))
        .transpose()?;

    let inputs = state.service.list_inputs(input_type, limit).await?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&inputs)?);
        return Ok(());
    }
    if out.quiet {
        for input in &inputs {
            println!("{}", input.id);
        }
        return Ok(());
    }

    if inputs.is_empty() {
        display::info(&format!(
            "No inputs yet. Add one with: {}",
            style("praxis add notes.md").yellow()
        ));
        return Ok(());
    }

    let mut table = display::table(&["ID", "Type", "File", "Preview", "Added"]);
    for input in &inputs {
        let type_cell = match input.input_type {
            Some(t) => Cell::new(t).fg(Color::Cyan),
            None => Cell::new("unclassified").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(input.id),
            type_cell,
            Cell::new(input.file_path.as_deref().unwrap_or("-")),
            Cell::new(display::truncate(&input.raw_text, 48)),
            Cell::new(display::format_relative_time(&input.created_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// `praxis show ID` where ID is an input or scenario id.
pub async fn show(state: &AppState, id: &str, out: OutputMode) -> Result<()> {
    let id = Uuid::parse_str(id.trim()).with_context(|| format!("'{id}' is not a valid id"))?;
    let overview = state.service.show(id).await?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }

    let input = &overview.input;
    println!();
    println!("  {} {}", style("Input").bold(), style(input.id).cyan());
    if let Some(path) = &input.file_path {
        display::field("File", path);
    }
    display::field("Added", display::format_relative_time(&input.created_at));
    if let Some(hint) = input.type_hint {
        display::field("Type hint", hint);
    }
    display::field("Text", style(display::truncate(&input.raw_text, 120)).dim());

    match &overview.classification {
        Some(c) => display::classification(c),
        None => display::info("Not classified yet."),
    }

    for entry in &overview.scenarios {
        let scenario = &entry.scenario;
        display::section(&format!("Scenario {}", scenario.id));
        display::field("Scene", scenario.scene_type);
        display::field("Role", style(&scenario.role).cyan());
        display::field("Task", &scenario.task);
        match &entry.response {
            Some(response) => {
                if let Some(score) = &response.score {
                    display::score(score);
                }
            }
            None => println!(
                "  {}",
                style(format!("In progress: praxis answer {}", scenario.id)).yellow()
            ),
        }
    }

    if !overview.insights.is_empty() {
        display::section("Insights");
        for (i, stored) in overview.insights.iter().enumerate() {
            display::insight_card(i + 1, &stored.card);
        }
    }
    println!();
    Ok(())
}
