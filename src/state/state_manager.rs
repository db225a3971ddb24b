use crate::display::{CommandRunner, DisplayProbe};
use crate::error::Result;
use crate::state::config_state::ConfigManager;
use crate::state::package_state::PackageManager;
use crate::state::post_init::PostInitializationHandler;
use crate::state::preference_state::JsonPreferenceStore;
use crate::state::resolution_state::ResolutionManager;
use std::path::PathBuf;
use std::sync::Arc;

/// Files the launcher state is persisted to.
#[derive(Debug, Clone)]
pub struct StatePaths {
    pub config_path: PathBuf,
    pub preferences_path: PathBuf,
}

impl Default for StatePaths {
    fn default() -> Self {
        Self {
            config_path: crate::state::config_state::default_config_path(),
            preferences_path: crate::state::preference_state::default_preferences_path(),
        }
    }
}

pub struct State {
    pub config_manager: Arc<ConfigManager>,
    pub preference_store: Arc<JsonPreferenceStore>,
    pub package_manager: PackageManager,
    pub resolution_manager: ResolutionManager,
}

impl State {
    /// Builds every manager from explicit collaborators and loads persisted state.
    pub async fn init(
        paths: StatePaths,
        display: Arc<dyn DisplayProbe>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Arc<Self>> {
        log::info!("State::init - Starting primary initialization of managers (Phase 1 - Lightweight Instantiation)...");
        let config_manager = Arc::new(ConfigManager::new(paths.config_path)?);
        let preference_store = Arc::new(JsonPreferenceStore::new(paths.preferences_path));

        log::info!("State::init - Running post-initialization handlers (Phase 2)...");
        config_manager.on_state_ready().await?;
        log::info!("State::init - ConfigManager post-initialization complete.");
        preference_store.on_state_ready().await?;
        log::info!("State::init - JsonPreferenceStore post-initialization complete.");

        let package_manager = PackageManager::new(config_manager.clone());
        let resolution_manager = ResolutionManager::new(
            config_manager.clone(),
            preference_store.clone(),
            display,
            runner,
        );

        let config = config_manager.get_config().await;
        log::info!("Launcher Config - Product: {:?}", config.product_name);
        log::info!(
            "Launcher Config - Wabbajack directory: {}",
            config.wabbajack_dir().display()
        );
        log::info!(
            "Launcher Config - Graphics config: {:?}",
            config.graphics_config_path
        );

        log::info!("State::init - Full initialization complete.");
        Ok(Arc::new(Self {
            config_manager,
            preference_store,
            package_manager,
            resolution_manager,
        }))
    }
}
