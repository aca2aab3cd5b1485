//! Rendering of stored insight cards for export.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::Serialize;

use praxis_types::record::StoredInsight;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Markdown,
    Json,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format: '{other}' (expected md or json)")),
        }
    }
}

/// Flat export shape: the card plus its provenance.
#[derive(Debug, Serialize)]
struct ExportedCard<'a> {
    input_id: String,
    created_at: String,
    #[serde(flatten)]
    card: &'a praxis_types::practice::InsightCard,
}

pub fn render(insights: &[StoredInsight], format: ExportFormat) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Json => {
            let cards: Vec<ExportedCard<'_>> = insights
                .iter()
                .map(|i| ExportedCard {
                    input_id: i.input_id.to_string(),
                    created_at: i.created_at.to_rfc3339(),
                    card: &i.card,
                })
                .collect();
            serde_json::to_string_pretty(&cards)
        }
        ExportFormat::Markdown => Ok(render_markdown(insights)),
    }
}

fn render_markdown(insights: &[StoredInsight]) -> String {
    let mut out = String::from("# Praxis Insight Cards\n");
    for (n, stored) in insights.iter().enumerate() {
        let card = &stored.card;
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "\n## {}. {}\n\n**Type:** {}  \n**Intensity:** {}/5\n\n\
             **What happened:** {}\n\n**Why it matters:** {}\n\n\
             **Upgrade pattern:** {}\n\n**Micro practice:** {}\n",
            n + 1,
            card.title,
            card.insight_type,
            card.intensity,
            card.what_happened,
            card.why_it_matters,
            card.upgrade_pattern,
            card.micro_practice,
        );
        if !card.concepts.is_empty() {
            let _ = write!(out, "\n**Concepts:** {}\n", card.concepts.join(", "));
        }
        if !card.skills.is_empty() {
            let _ = write!(out, "\n**Skills:** {}\n", card.skills.join(", "));
        }
        out.push_str("\n---\n");
    }
    out
}
