use crate::display::{
    enumerate_resolutions, reconcile_resolutions, CommandRunner, DisplayProbe, ResolutionProjector,
    ResolutionRecord,
};
use crate::error::{AppError, Result};
use crate::state::config_state::ConfigManager;
use crate::state::preference_state::{
    clear_resolution_preference, load_resolution_preference, PreferenceStore,
};
use crate::utils::system_info::OS;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Resolution half of the launcher's query surface.
///
/// The mode list is computed once per manager and kept for its lifetime. The
/// [`OnceCell`] lets only one caller run the enumeration while the others
/// wait for its result; a failed run leaves the cell empty so a later call
/// can retry.
pub struct ResolutionManager {
    config_manager: Arc<ConfigManager>,
    preferences: Arc<dyn PreferenceStore>,
    display: Arc<dyn DisplayProbe>,
    runner: Arc<dyn CommandRunner>,
    projector: ResolutionProjector,
    enumeration_supported: bool,
    available: OnceCell<Vec<ResolutionRecord>>,
}

impl ResolutionManager {
    pub fn new(
        config_manager: Arc<ConfigManager>,
        preferences: Arc<dyn PreferenceStore>,
        display: Arc<dyn DisplayProbe>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self::with_platform_support(
            config_manager,
            preferences,
            display,
            runner,
            OS.supports_resolution_enumeration(),
        )
    }

    pub fn with_platform_support(
        config_manager: Arc<ConfigManager>,
        preferences: Arc<dyn PreferenceStore>,
        display: Arc<dyn DisplayProbe>,
        runner: Arc<dyn CommandRunner>,
        enumeration_supported: bool,
    ) -> Self {
        let projector = ResolutionProjector::new(preferences.clone(), display.clone());
        Self {
            config_manager,
            preferences,
            display,
            runner,
            projector,
            enumeration_supported,
            available: OnceCell::new(),
        }
    }

    pub async fn available_resolutions(&self) -> Result<Vec<ResolutionRecord>> {
        let modes = self
            .available
            .get_or_try_init(|| self.compute_available_resolutions())
            .await?;
        Ok(modes.clone())
    }

    async fn compute_available_resolutions(&self) -> Result<Vec<ResolutionRecord>> {
        let current = self.display.current_resolution().await?;
        let saved = load_resolution_preference(self.preferences.as_ref()).await?;

        let enumerated = if self.enumeration_supported {
            let config = self.config_manager.get_config().await;
            enumerate_resolutions(
                self.runner.as_ref(),
                &config.resolution_tool,
                config.resolution_tool_timeout(),
            )
            .await?
        } else {
            warn!("Display mode enumeration is not supported on {}, using fallback modes", OS);
            None
        };

        let modes = reconcile_resolutions(enumerated, current, saved);
        info!(
            "Resolved {} available resolutions (current {}, saved {:?})",
            modes.len(),
            current,
            saved.map(|s| s.to_string())
        );
        debug!(
            "Available resolutions: {:?}",
            modes.iter().map(ResolutionRecord::to_string).collect::<Vec<_>>()
        );
        Ok(modes)
    }

    pub async fn current_resolution(&self) -> Result<ResolutionRecord> {
        self.display.current_resolution().await
    }

    pub async fn saved_preference(&self) -> Result<Option<ResolutionRecord>> {
        load_resolution_preference(self.preferences.as_ref()).await
    }

    /// The saved preference, or the hardware resolution when the user never chose one.
    pub async fn active_resolution(&self) -> Result<ResolutionRecord> {
        match self.saved_preference().await? {
            Some(saved) => Ok(saved),
            None => self.current_resolution().await,
        }
    }

    pub async fn apply_resolution(&self, selected: ResolutionRecord) -> Result<()> {
        let config = self.config_manager.get_config().await;
        let config_path = config.graphics_config_path.ok_or_else(|| {
            AppError::Config("graphics_config_path is not configured".to_string())
        })?;

        info!("Applying resolution {} to {}", selected, config_path.display());
        self.projector.apply(selected, &config_path).await
    }

    pub async fn clear_preference(&self) -> Result<()> {
        clear_resolution_preference(self.preferences.as_ref()).await
    }
}
