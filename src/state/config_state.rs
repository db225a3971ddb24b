use crate::config::{default_wabbajack_dir, ProjectDirsExt, LAUNCHER_DIRECTORY};
use crate::display::{DisplayGeometry, ToolProbeSettings};
use crate::error::{AppError, Result};
use crate::registry::install_settings_reader::SAVED_SETTINGS_DIRNAME;
use crate::registry::legacy_reader::LEGACY_REGISTRY_FILENAME;
use crate::state::post_init::PostInitializationHandler;
use crate::utils::file_utils::write_atomically;
use async_trait::async_trait;
use log::{debug, error, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

const CONFIG_FILENAME: &str = "launcher_config.json";
const CONFIG_CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LauncherConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    /// Modlist title this launcher ships with, as written by the installer.
    #[serde(default)]
    pub product_name: Option<String>,
    /// Install directory of the running modlist. Defaults to the executable's directory.
    #[serde(default)]
    pub install_directory: Option<PathBuf>,
    /// Overrides `<LocalAppData>/Wabbajack`.
    #[serde(default)]
    pub wabbajack_directory: Option<PathBuf>,
    #[serde(default)]
    pub graphics_config_path: Option<PathBuf>,
    #[serde(default = "default_resolution_tool")]
    pub resolution_tool: PathBuf,
    #[serde(default = "default_resolution_tool_timeout_secs")]
    pub resolution_tool_timeout_secs: u64,
    /// Display geometry assumed when the current mode cannot be read from the tool.
    #[serde(default)]
    pub fallback_display: DisplayGeometry,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_config_version() -> u32 {
    CONFIG_CURRENT_VERSION
}

fn default_resolution_tool() -> PathBuf {
    PathBuf::from("QRes.exe")
}

fn default_resolution_tool_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "debug".to_string()
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_CURRENT_VERSION,
            product_name: None,
            install_directory: None,
            wabbajack_directory: None,
            graphics_config_path: None,
            resolution_tool: default_resolution_tool(),
            resolution_tool_timeout_secs: default_resolution_tool_timeout_secs(),
            fallback_display: DisplayGeometry::default(),
            log_level: default_log_level(),
        }
    }
}

impl LauncherConfig {
    pub fn wabbajack_dir(&self) -> PathBuf {
        self.wabbajack_directory
            .clone()
            .unwrap_or_else(default_wabbajack_dir)
    }

    pub fn legacy_registry_path(&self) -> PathBuf {
        self.wabbajack_dir().join(LEGACY_REGISTRY_FILENAME)
    }

    pub fn install_settings_dir(&self) -> PathBuf {
        self.wabbajack_dir().join(SAVED_SETTINGS_DIRNAME)
    }

    pub fn resolution_tool_timeout(&self) -> Duration {
        Duration::from_secs(self.resolution_tool_timeout_secs)
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level).map_err(|_| {
            AppError::InvalidInput(format!("log_level '{}' is not a log level", self.log_level))
        })
    }

    pub fn display_probe_settings(&self) -> ToolProbeSettings {
        ToolProbeSettings {
            tool: self.resolution_tool.clone(),
            timeout: self.resolution_tool_timeout(),
            fallback: self.fallback_display,
        }
    }

    /// Configured install directory, else the directory holding the launcher executable.
    pub fn current_install_directory(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.install_directory {
            return Some(dir.clone());
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolution_tool_timeout_secs == 0 {
            return Err(AppError::InvalidInput(
                "resolution_tool_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.fallback_display.physical_resolution().is_err() {
            return Err(AppError::InvalidInput(format!(
                "fallback_display does not describe a usable resolution: {:?}",
                self.fallback_display
            )));
        }
        self.log_level_filter()?;
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<LauncherConfig>>,
    config_path: PathBuf,
    save_lock: Mutex<()>,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Result<Self> {
        info!(
            "ConfigManager: Initializing with path: {:?} (config loading deferred)",
            config_path
        );

        Ok(Self {
            config: Arc::new(RwLock::new(LauncherConfig::default())),
            config_path,
            save_lock: Mutex::new(()),
        })
    }

    async fn load_config_internal(&self) -> Result<()> {
        if !self.config_path.exists() {
            info!("Config file not found, using default configuration");
            self.save_config().await?;
            return Ok(());
        }

        info!(
            "Loading launcher configuration from: {:?}",
            self.config_path
        );
        let config_data = fs::read_to_string(&self.config_path).await?;

        let loaded = serde_json::from_str::<LauncherConfig>(&config_data)
            .map_err(AppError::from)
            .and_then(|config| config.validate().map(|_| config));

        match loaded {
            Ok(loaded_config) => {
                info!("Successfully loaded launcher configuration");
                debug!("Loaded config: {:?}", loaded_config);
                let mut config = self.config.write().await;
                *config = loaded_config;
            }
            Err(e) => {
                error!("Failed to load config file: {}", e);
                warn!("Config file is corrupted, creating backup and using defaults");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(backup_err) = fs::copy(&self.config_path, &backup_path).await {
                    error!("Failed to backup corrupted config: {}", backup_err);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                self.save_config().await?;
            }
        }

        Ok(())
    }

    pub async fn save_config(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        debug!("Acquired save lock, proceeding to save config...");

        let config_data = {
            let config = self.config.read().await;
            serde_json::to_string_pretty(&*config)?
        };

        write_atomically(&self.config_path, config_data.as_bytes()).await?;
        info!(
            "Successfully saved launcher configuration to: {:?}",
            self.config_path
        );

        Ok(())
    }

    pub async fn get_config(&self) -> LauncherConfig {
        self.config.read().await.clone()
    }

    pub async fn set_config(&self, new_config: LauncherConfig) -> Result<()> {
        new_config.validate()?;

        let should_save = {
            let mut config = self.config.write().await;
            let current = &*config;

            if *current == new_config {
                debug!("No config changes detected, skipping save");
                false
            } else {
                if current.product_name != new_config.product_name {
                    info!(
                        "Changing product name: {:?} -> {:?}",
                        current.product_name, new_config.product_name
                    );
                }
                if current.install_directory != new_config.install_directory {
                    info!(
                        "Changing install directory: {:?} -> {:?}",
                        current.install_directory, new_config.install_directory
                    );
                }
                if current.wabbajack_directory != new_config.wabbajack_directory {
                    info!(
                        "Changing Wabbajack directory: {:?} -> {:?}",
                        current.wabbajack_directory, new_config.wabbajack_directory
                    );
                }
                if current.graphics_config_path != new_config.graphics_config_path {
                    info!(
                        "Changing graphics config path: {:?} -> {:?}",
                        current.graphics_config_path, new_config.graphics_config_path
                    );
                }
                if current.resolution_tool != new_config.resolution_tool {
                    info!(
                        "Changing resolution tool: {:?} -> {:?}",
                        current.resolution_tool, new_config.resolution_tool
                    );
                }
                if current.resolution_tool_timeout_secs != new_config.resolution_tool_timeout_secs {
                    info!(
                        "Changing resolution tool timeout: {}s -> {}s",
                        current.resolution_tool_timeout_secs,
                        new_config.resolution_tool_timeout_secs
                    );
                }
                if current.log_level != new_config.log_level {
                    info!(
                        "Changing log level: {} -> {}",
                        current.log_level, new_config.log_level
                    );
                }
                if current.fallback_display != new_config.fallback_display {
                    info!(
                        "Changing fallback display: {:?} -> {:?}",
                        current.fallback_display, new_config.fallback_display
                    );
                }

                // Preserve version during replacement
                let version = config.version;
                *config = LauncherConfig {
                    version,
                    ..new_config
                };
                true
            }
        };

        if should_save {
            self.save_config().await?;
        }

        Ok(())
    }
}

#[async_trait]
impl PostInitializationHandler for ConfigManager {
    async fn on_state_ready(&self) -> Result<()> {
        info!("ConfigManager: on_state_ready called. Loading configuration...");
        self.load_config_internal().await?;
        info!("ConfigManager: Successfully loaded configuration in on_state_ready.");
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    LAUNCHER_DIRECTORY.root_dir().join(CONFIG_FILENAME)
}
