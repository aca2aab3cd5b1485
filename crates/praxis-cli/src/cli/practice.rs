//! Pipeline commands: add, practice, answer, retry.
//!
//! Each command drives the engine through the service and renders the
//! outcome: either the prompt a paused session waits on, or the final
//! score and insight cards.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::Editor;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

use praxis_core::pipeline::{EngineError, Outcome};
use praxis_core::service::{PracticeReport, ServiceError, SubmitRequest};
use praxis_types::practice::InputType;

use super::display;
use crate::state::AppState;

/// Output switches shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub json: bool,
    pub quiet: bool,
}

impl OutputMode {
    fn hide_progress(&self) -> bool {
        self.json || self.quiet
    }
}

/// `praxis add FILE [--type T] [--force]`
pub async fn add(
    state: &AppState,
    file: &Path,
    input_type: Option<String>,
    force: bool,
    out: OutputMode,
) -> Result<()> {
    let raw_text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let type_hint = input_type
        .map(|t| t.parse::<InputType>().map_err(|e| anyhow::anyhow!(e)))
        .transpose()?;

    let request = SubmitRequest {
        file_path: Some(file.display().to_string()),
        raw_text,
        type_hint,
        force,
    };

    let spinner = display::spinner("Classifying input...", out.hide_progress());
    let result = state.service.submit(request).await;
    spinner.finish_and_clear();

    match result {
        Err(ServiceError::Duplicate { existing_id }) if !out.json => {
            display::info(&format!(
                "Already added as {}. Use {} to reprocess.",
                style(existing_id).cyan(),
                style("--force").yellow()
            ));
            Ok(())
        }
        result => render(with_retry_hint(result)?, out),
    }
}

/// `praxis practice INPUT_ID`
pub async fn practice(state: &AppState, input_id: &str, out: OutputMode) -> Result<()> {
    let input_id = parse_id(input_id)?;

    let spinner = display::spinner("Generating scenario...", out.hide_progress());
    let result = state.service.practice(input_id).await;
    spinner.finish_and_clear();

    render(with_retry_hint(result)?, out)
}

/// `praxis answer SCENARIO_ID [--editor | --file F]`
pub async fn answer(
    state: &AppState,
    scenario_id: &str,
    editor: bool,
    file: Option<PathBuf>,
    out: OutputMode,
) -> Result<()> {
    let scenario_id = parse_id(scenario_id)?;
    let reply = read_reply(editor, file.as_deref(), out).await?;

    let spinner = display::spinner("Coach is reading your answer...", out.hide_progress());
    let result = state.service.answer(scenario_id, &reply).await;
    spinner.finish_and_clear();

    render(with_retry_hint(result)?, out)
}

/// `praxis retry THREAD_ID`
pub async fn retry(state: &AppState, thread_id: &str, out: OutputMode) -> Result<()> {
    let spinner = display::spinner("Retrying...", out.hide_progress());
    let result = state.service.retry(thread_id).await;
    spinner.finish_and_clear();

    render(with_retry_hint(result)?, out)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("'{id}' is not a valid id"))
}

/// Attach the `praxis retry` command to step failures.
fn with_retry_hint(result: Result<PracticeReport, ServiceError>) -> Result<PracticeReport> {
    match result {
        Err(ServiceError::Engine(EngineError::Step {
            thread_id,
            step,
            source,
        })) => {
            let hint = format!("progress is saved; run `praxis retry {thread_id}` to continue");
            Err(anyhow::Error::new(EngineError::Step {
                thread_id,
                step,
                source,
            })
            .context(hint))
        }
        other => Ok(other?),
    }
}

async fn read_reply(editor: bool, file: Option<&Path>, out: OutputMode) -> Result<String> {
    let reply = if editor {
        Editor::new()
            .edit("")?
            .context("editor closed without saving an answer")?
    } else if let Some(path) = file {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
    } else {
        if !out.hide_progress() && console::user_attended() {
            eprintln!(
                "  {}",
                style("Type your answer, then press Ctrl-D to submit.").dim()
            );
        }
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read answer from stdin")?;
        buf
    };

    if reply.trim().is_empty() {
        bail!("answer is empty");
    }
    Ok(reply)
}

/// Print a pipeline outcome as JSON or styled text.
pub fn render(report: PracticeReport, out: OutputMode) -> Result<()> {
    let PracticeReport { input_id, run } = report;

    if out.json {
        let (status, suspended) = match &run.outcome {
            Outcome::Suspended(payload) => ("suspended", Some(payload)),
            Outcome::Done => ("done", None),
        };
        let body = serde_json::json!({
            "input_id": input_id,
            "thread_id": run.thread_id,
            "status": status,
            "suspended": suspended,
            "classification": run.state.classification,
            "scenario_id": run.state.scenario.as_ref().map(|s| s.id),
            "rounds": run.state.round_count,
            "score": run.state.score,
            "insights": run.state.insights,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }
    if out.quiet {
        if let Outcome::Suspended(payload) = &run.outcome {
            println!("{}", payload.scenario_id);
        }
        return Ok(());
    }

    match &run.outcome {
        Outcome::Suspended(payload) => {
            if payload.round == 1 {
                display::success(&format!("Input {}", style(input_id).dim()));
                if let Some(c) = &run.state.classification {
                    display::classification(c);
                }
            }
            display::suspension(payload);
        }
        Outcome::Done => {
            display::success("Done");
            match (&run.state.score, run.state.scenario.is_some()) {
                (Some(score), _) => {
                    display::score(score);
                    if !run.state.insights.is_empty() {
                        display::section("Insights");
                        for (i, card) in run.state.insights.iter().enumerate() {
                            display::insight_card(i + 1, card);
                        }
                    }
                }
                (None, false) => {
                    if let Some(c) = &run.state.classification {
                        display::classification(c);
                    }
                    display::info(&format!(
                        "No practice needed. Start one anyway with {}",
                        style(format!("praxis practice {input_id}")).yellow()
                    ));
                    return Ok(());
                }
                (None, true) => {}
            }
            println!();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_core::pipeline::StepError;
    use praxis_types::checkpoint::StepId;
    use praxis_types::generation::GenerationError;

    #[test]
    fn test_parse_id() {
        let id = Uuid::now_v7();
        assert_eq!(parse_id(&format!(" {id} ")).unwrap(), id);
        assert!(parse_id("not-an-id").is_err());
    }

    #[test]
    fn test_step_failure_carries_retry_hint() {
        let err = ServiceError::Engine(EngineError::Step {
            thread_id: "t-42".to_string(),
            step: StepId::Score,
            source: StepError::Generation(GenerationError::Transport("timeout".to_string())),
        });
        let message = format!("{:#}", with_retry_hint(Err(err)).unwrap_err());
        assert!(message.contains("praxis retry t-42"));
        assert!(message.contains("timeout"));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = with_retry_hint(Err(ServiceError::ThreadNotFound("t-1".to_string()))).unwrap_err();
        assert!(!format!("{err:#}").contains("praxis retry"));
    }
}
