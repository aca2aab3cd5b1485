//! Shared terminal rendering helpers.

use std::time::Duration;

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use praxis_types::checkpoint::SuspendPayload;
use praxis_types::practice::{Classification, InsightCard, Score};

/// Spinner shown while a generation call is in flight. Hidden in quiet or JSON mode.
pub fn spinner(message: &str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

pub fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::White))
            .collect::<Vec<_>>(),
    );
    table
}

pub fn success(message: &str) {
    println!();
    println!("  {} {}", style("✓").green().bold(), message);
}

pub fn info(message: &str) {
    println!();
    println!("  {} {}", style("i").blue().bold(), message);
    println!();
}

pub fn section(title: &str) {
    println!();
    println!("  {}", style(format!("── {title} ──")).dim());
}

pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {}  {}", style(format!("{label}:")).bold(), value);
}

pub fn bullets(items: &[String]) {
    for item in items {
        println!("    {} {}", style("•").dim(), item);
    }
}

/// Render the prompt a paused practice session is waiting on.
pub fn suspension(payload: &SuspendPayload) {
    section(&format!("Round {}/{}", payload.round, payload.max_rounds));
    field("Role", style(&payload.role).cyan());
    field("Task", &payload.task);
    if !payload.constraints.is_empty() {
        println!("  {}", style("Constraints:").bold());
        bullets(&payload.constraints);
    }
    if !payload.structure_hints.is_empty() {
        println!("  {}", style("Structure hints:").bold());
        bullets(&payload.structure_hints);
    }
    if let Some(message) = &payload.coach_message {
        println!();
        println!("  {} {}", style("Coach:").magenta().bold(), message);
    }
    println!();
    println!(
        "  Reply with: {}",
        style(format!("praxis answer {}", payload.scenario_id)).yellow()
    );
    println!();
}

pub fn classification(c: &Classification) {
    section("Classification");
    field("Type", style(c.input_type).cyan());
    field("Summary", &c.summary);
    field("Routing", c.routing_policy);
    field("Difficulty", format!("{}/5", c.tags.difficulty));
    if !c.tags.topics.is_empty() {
        field("Topics", c.tags.topics.join(", "));
    }
    let capabilities: Vec<String> = c
        .capability_map
        .dimensions()
        .iter()
        .map(|(name, value)| format!("{name} {value}/10"))
        .collect();
    field("Capabilities", style(capabilities.join(" · ")).dim());
}

pub fn score(score: &Score) {
    section("Score");
    for (dimension, value) in score.signal.dimensions() {
        println!("  {:<18} {}", dimension.to_string(), bar(value, 10));
    }
    if !score.improvement_vectors.is_empty() {
        println!("  {}", style("Improve next time:").bold());
        bullets(&score.improvement_vectors);
    }
}

pub fn insight_card(n: usize, card: &InsightCard) {
    println!();
    println!(
        "  {} {}  {}",
        style(format!("{n}.")).dim(),
        style(&card.title).bold(),
        style(format!("[{} · {}]", card.insight_type, intensity(card.intensity))).dim()
    );
    println!("     {} {}", style("What happened:").dim(), card.what_happened);
    println!("     {} {}", style("Why it matters:").dim(), card.why_it_matters);
    println!("     {} {}", style("Upgrade:").green(), card.upgrade_pattern);
    println!("     {} {}", style("Practice:").yellow(), card.micro_practice);
}

fn bar(value: u8, max: u8) -> String {
    let filled = usize::from(value.min(max));
    format!(
        "{}{} {value}/{max}",
        style("█".repeat(filled)).cyan(),
        style("░".repeat(usize::from(max) - filled)).dim()
    )
}

fn intensity(value: u8) -> String {
    "●".repeat(usize::from(value.min(5)))
}

/// Cut `text` to at most `max` characters, marking the cut.
pub fn truncate(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

pub fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let diff = chrono::Utc::now() - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}
