//! Dependency injection container for the agent application.
//!
//! The container owns infrastructure dependencies and provides factory
//! methods for wiring decision loops to them.

use std::{path::Path, sync::Arc};

use super::config::AgentConfig;
use crate::{
    Result,
    adapters::MsgPackRepository,
    decision::DecisionLoop,
    ports::TableRepository,
    q_learning::{QTable, SavedQTable},
    store::TableStore,
};

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```
/// use tabq::app::{App, AgentConfig};
/// use tabq::ActionSet;
///
/// let app = App::new();
///
/// let config = AgentConfig::new(ActionSet::Basic).with_seed(42);
/// let agent = app.create_agent(config)?;
/// # Ok::<(), tabq::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use tabq::app::App;
/// use tabq::adapters::InMemoryRepository;
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    /// Repository for table persistence
    repository: Arc<dyn TableRepository + Send + Sync>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app with production defaults: tables are stored as
    /// MessagePack files and agents are seeded from entropy.
    pub fn new() -> Self {
        Self {
            repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing an app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn repository(&self) -> Arc<dyn TableRepository + Send + Sync> {
        Arc::clone(&self.repository)
    }

    /// Create a decision loop from a configuration.
    ///
    /// With a `persist_path`, the loop gets a [`TableStore`] and, if
    /// `load_existing` is set, starts from the stored table. A stored table of
    /// the wrong shape is an error; an unreadable one is replaced by zeros
    /// with a warning.
    pub fn create_agent(&self, config: AgentConfig) -> Result<DecisionLoop> {
        config.validate()?;
        let shape = config.shape()?;

        let mut builder = DecisionLoop::builder()
            .actions(config.actions)
            .features(config.resolved_features())
            .rewards(config.resolved_rewards())
            .learning(config.learning_params()?)
            .temperature(config.temperature);

        // Apply seed from config or use container default
        if let Some(seed) = config.seed.or(self.default_seed) {
            builder = builder.seed(seed);
        }

        if let Some(path) = &config.persist_path {
            let store = TableStore::new(self.repository(), path.clone(), shape);
            if config.load_existing {
                builder = builder.table(store.load_or_zeros()?);
            }
            builder = builder.store(store);
        }
        if let Some(every) = config.snapshot_every {
            builder = builder.snapshot_every(every);
        }

        builder.build()
    }

    /// Load a stored table of the given shape, or zeros if none is stored.
    pub fn load_table(&self, path: &Path, shape: (usize, usize)) -> Result<QTable> {
        TableStore::new(self.repository(), path, shape).load()
    }

    /// Read whatever table is stored at `path`, without a shape check.
    pub fn read_saved(&self, path: &Path) -> Result<Option<SavedQTable>> {
        self.repository.load(path)
    }

    /// Save an agent's table to `path`.
    pub fn save_agent(&self, agent: &DecisionLoop, path: &Path) -> Result<()> {
        self.repository
            .save(&SavedQTable::from_table(agent.table()), path)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing an app with custom dependencies.
///
/// Primarily used for testing to inject in-memory repositories and control
/// randomness.
pub struct AppBuilder {
    repository: Option<Arc<dyn TableRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            repository: None,
            default_seed: None,
        }
    }

    pub fn with_repository<R: TableRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.repository = Some(Arc::new(repo));
        self
    }

    /// Set a default random seed for all agents created by this container.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app. Without a repository, `MsgPackRepository` is used.
    pub fn build(self) -> App {
        App {
            repository: self
                .repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
