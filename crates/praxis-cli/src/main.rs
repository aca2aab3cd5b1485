//! Praxis CLI entry point.
//!
//! Binary name: `praxis`
//!
//! Parses CLI arguments, loads configuration, initializes the database and
//! services, then dispatches to the matching command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::practice::OutputMode;
use cli::{Cli, Commands};
use praxis_infra::config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (filter, respect_env) = if cli.quiet {
        ("error", false)
    } else {
        (praxis_observe::filter_for_verbosity(cli.verbose), true)
    };
    let enable_otel = std::env::var("PRAXIS_OTEL").is_ok_and(|v| v == "1");
    if let Err(e) = praxis_observe::init_tracing(filter, respect_env, enable_otel) {
        eprintln!("warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    praxis_observe::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need config or state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "praxis", &mut std::io::stdout());
        return Ok(());
    }

    let out = OutputMode {
        json: cli.json,
        quiet: cli.quiet,
    };

    let config_dir = config::config_dir();
    let mut config = config::load_config(&config_dir).await;
    state::apply_provider_override(&mut config, cli.provider.as_deref())?;
    console::set_colors_enabled(config.display.color);

    if let Commands::Config { action } = cli.command {
        return cli::config::handle(action, &config, &config_dir, out).await;
    }

    let needs_generation = cli.command.needs_generation();
    let state = AppState::init(config, config_dir, needs_generation).await?;
    tracing::debug!(data_dir = %state.data_dir.display(), "state initialized");

    match cli.command {
        Commands::Add {
            file,
            input_type,
            force,
        } => cli::practice::add(&state, &file, input_type, force, out).await,
        Commands::Practice { input_id } => cli::practice::practice(&state, &input_id, out).await,
        Commands::Answer {
            scenario_id,
            editor,
            file,
        } => cli::practice::answer(&state, &scenario_id, editor, file, out).await,
        Commands::Retry { thread_id } => cli::practice::retry(&state, &thread_id, out).await,
        Commands::Insight {
            input_id,
            insight_type,
            min_intensity,
        } => cli::insight::list(&state, input_id, insight_type, min_intensity, out).await,
        Commands::Show { id } => cli::records::show(&state, &id, out).await,
        Commands::Export { format, output } => cli::insight::export(&state, &format, output, out).await,
        Commands::List { input_type, limit } => cli::records::list(&state, input_type, limit, out).await,
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}
