//! Application state wiring the practice service together.
//!
//! `PracticeService` is generic over the checkpoint store, record repository
//! and content hasher; AppState pins them to the concrete infra
//! implementations and selects the generation backend from configuration.

use std::path::PathBuf;

use anyhow::Context;

use praxis_core::generation::{BoxGenerationBackend, GenerationAdapter, GenerationBackend, GenerationRequest};
use praxis_core::pipeline::{Engine, PracticeSteps};
use praxis_core::service::PracticeService;
use praxis_infra::config::{self, ConfigError};
use praxis_infra::crypto::hash::Sha256ContentHasher;
use praxis_infra::generation::create_backend;
use praxis_infra::sqlite::checkpoint::SqliteCheckpointStore;
use praxis_infra::sqlite::pool::{DatabasePool, database_url};
use praxis_infra::sqlite::record::SqliteRecordRepository;
use praxis_types::config::PraxisConfig;
use praxis_types::generation::{GenerationError, RawGeneration};

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcretePracticeService =
    PracticeService<SqliteCheckpointStore, SqliteRecordRepository, Sha256ContentHasher>;

/// Shared application state for CLI commands.
pub struct AppState {
    pub service: ConcretePracticeService,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Connect to the database and wire the service.
    ///
    /// When `needs_generation` is false and no API key is configured, the
    /// service is wired to a backend that rejects every call, so read-only
    /// commands work without credentials.
    pub async fn init(
        config: PraxisConfig,
        config_dir: PathBuf,
        needs_generation: bool,
    ) -> anyhow::Result<Self> {
        let data_dir = config::data_dir(&config, &config_dir);
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("failed to open database")?;

        let backend = match config::resolve_generation(&config.llm) {
            Ok(settings) => create_backend(settings)?,
            Err(err) if !needs_generation => BoxGenerationBackend::new(Unconfigured(err.to_string())),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(backend = backend.name(), "generation backend selected");

        let engine = Engine::new(
            PracticeSteps::new(GenerationAdapter::new(backend)),
            SqliteCheckpointStore::new(db_pool.clone()),
            config.engine.clone(),
        );
        let service = PracticeService::new(
            engine,
            SqliteRecordRepository::new(db_pool),
            Sha256ContentHasher::new(),
        );

        Ok(Self { service, data_dir })
    }
}

/// Apply `--provider`, dropping a base URL that belonged to another provider.
pub fn apply_provider_override(config: &mut PraxisConfig, provider: Option<&str>) -> Result<(), ConfigError> {
    let Some(name) = provider else {
        return Ok(());
    };
    let provider = config::parse_provider(name)?;
    if provider != config.llm.provider {
        config.llm.provider = provider;
        config.llm.base_url = None;
    }
    Ok(())
}

/// Stand-in backend for commands that never generate.
struct Unconfigured(String);

impl GenerationBackend for Unconfigured {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn generate_raw(&self, _request: &GenerationRequest) -> Result<RawGeneration, GenerationError> {
        Err(GenerationError::Transport(self.0.clone()))
    }
}
