use crate::display::graphics_config::{
    GraphicsConfig, BORDERLESS_UPSCALE_KEY, RENDER_SECTION, RESOLUTION_KEY,
};
use crate::display::{DisplayProbe, ResolutionRecord};
use crate::error::{AppError, Result};
use crate::state::preference_state::{
    load_resolution_preference, save_resolution_preference, PreferenceStore,
};
use crate::utils::file_utils::write_atomically;
use log::info;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

/// Writes the chosen resolution into the game's graphics config.
pub struct ResolutionProjector {
    preferences: Arc<dyn PreferenceStore>,
    display: Arc<dyn DisplayProbe>,
}

impl ResolutionProjector {
    pub fn new(preferences: Arc<dyn PreferenceStore>, display: Arc<dyn DisplayProbe>) -> Self {
        Self {
            preferences,
            display,
        }
    }

    /// Saves `selected` as the user's preference and projects it into `config_path`.
    ///
    /// `Render.Resolution` is taken from the stored preference after saving.
    /// `Render.BorderlessUpscale` follows the physical monitor: it is disabled on
    /// ultra-wide monitors regardless of the resolution being written.
    pub async fn apply(&self, selected: ResolutionRecord, config_path: &Path) -> Result<()> {
        save_resolution_preference(self.preferences.as_ref(), selected).await?;

        if !config_path.exists() {
            return Err(AppError::FileNotFound(config_path.to_path_buf()));
        }
        let raw = fs::read_to_string(config_path).await?;
        let mut config = GraphicsConfig::parse(&raw)?;

        let resolution = load_resolution_preference(self.preferences.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::Preference("resolution preference vanished after saving".to_string())
            })?;
        let monitor = self.display.current_resolution().await?;
        let borderless_upscale = !monitor.is_ultra_wide();

        config.set(RENDER_SECTION, RESOLUTION_KEY, resolution.to_string());
        config.set_bool(RENDER_SECTION, BORDERLESS_UPSCALE_KEY, borderless_upscale);

        write_atomically(config_path, config.serialize().as_bytes()).await?;
        info!(
            "Projected resolution {} into {} (monitor {}, {}={})",
            resolution,
            config_path.display(),
            monitor,
            BORDERLESS_UPSCALE_KEY,
            borderless_upscale
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayGeometry, StaticDisplayProbe};
    use crate::state::preference_state::JsonPreferenceStore;

    const INI: &str = "[Render]\n\
        Resolution=1920x1080\n\
        BorderlessUpscale=false\n\
        Borderless=true\n\
        \n\
        [Framerate]\n\
        EnableVSync=false\n";

    fn projector(dir: &tempfile::TempDir, monitor: (u32, u32)) -> (ResolutionProjector, Arc<JsonPreferenceStore>) {
        let store = Arc::new(JsonPreferenceStore::new(dir.path().join("preferences.json")));
        let probe = Arc::new(StaticDisplayProbe::new(DisplayGeometry {
            logical_width: monitor.0,
            logical_height: monitor.1,
            scale_factor: 1.0,
        }));
        (ResolutionProjector::new(store.clone(), probe), store)
    }

    #[tokio::test]
    async fn test_apply_on_standard_monitor() {
        let dir = tempfile::tempdir().unwrap();
        let ini_path = dir.path().join("SSEDisplayTweaks.ini");
        std::fs::write(&ini_path, INI).unwrap();
        let (projector, store) = projector(&dir, (2560, 1440));

        let selected = ResolutionRecord::new(2560, 1440).unwrap();
        projector.apply(selected, &ini_path).await.unwrap();

        let written = std::fs::read_to_string(&ini_path).unwrap();
        assert_eq!(
            written,
            INI.replace("Resolution=1920x1080", "Resolution=2560x1440")
                .replace("BorderlessUpscale=false", "BorderlessUpscale=true")
        );
        assert_eq!(
            load_resolution_preference(store.as_ref()).await.unwrap(),
            Some(selected)
        );
    }

    #[tokio::test]
    async fn test_upscale_follows_monitor_not_selection() {
        let dir = tempfile::tempdir().unwrap();
        let ini_path = dir.path().join("SSEDisplayTweaks.ini");
        std::fs::write(&ini_path, INI).unwrap();
        let (projector, _store) = projector(&dir, (3440, 1440));

        projector
            .apply(ResolutionRecord::new(1920, 1080).unwrap(), &ini_path)
            .await
            .unwrap();

        let config = GraphicsConfig::parse(&std::fs::read_to_string(&ini_path).unwrap()).unwrap();
        assert_eq!(config.get(RENDER_SECTION, RESOLUTION_KEY), Some("1920x1080"));
        assert_eq!(config.get_bool(RENDER_SECTION, BORDERLESS_UPSCALE_KEY), Some(false));
        assert_eq!(config.get(RENDER_SECTION, "Borderless"), Some("true"));
    }

    #[tokio::test]
    async fn test_missing_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (projector, _store) = projector(&dir, (1920, 1080));

        let err = projector
            .apply(
                ResolutionRecord::new(1920, 1080).unwrap(),
                &dir.path().join("missing.ini"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FileNotFound(_)));
    }
}
