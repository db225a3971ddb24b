use crate::error::Result;
use crate::registry::{
    read_install_settings, read_legacy_registry, reconcile_packages, PackageRecord,
};
use crate::state::config_state::ConfigManager;
use log::{error, info};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const UNKNOWN_VERSION: &str = "unknown";

/// Read-only view over the installed-modlist registries.
///
/// Nothing is cached: every query re-reads both installer generations, since
/// the installer may run alongside the launcher.
pub struct PackageManager {
    config_manager: Arc<ConfigManager>,
}

impl PackageManager {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// All known installs keyed by path, or `None` when neither registry lists anything.
    pub async fn installed_packages(&self) -> Result<Option<BTreeMap<PathBuf, PackageRecord>>> {
        let config = self.config_manager.get_config().await;

        let legacy = read_legacy_registry(&config.legacy_registry_path()).await?;
        let current = read_install_settings(&config.install_settings_dir()).await?;
        let merged = reconcile_packages(legacy, current);

        info!("{} candidate installs found", merged.len());
        if merged.is_empty() {
            Ok(None)
        } else {
            Ok(Some(merged))
        }
    }

    /// Install paths whose modlist title matches the configured product name.
    pub async fn packages_matching_current_product(&self) -> Result<Vec<PathBuf>> {
        let config = self.config_manager.get_config().await;
        let Some(product_name) = config.product_name else {
            return Ok(Vec::new());
        };

        let packages = self.installed_packages().await?.unwrap_or_default();
        Ok(packages
            .into_values()
            .filter(|record| record.title.as_deref() == Some(product_name.as_str()))
            .map(|record| record.install_path)
            .collect())
    }

    pub async fn metadata_at_path(&self, path: &Path) -> Result<Option<PackageRecord>> {
        Ok(self
            .installed_packages()
            .await?
            .and_then(|mut packages| packages.remove(path)))
    }

    pub async fn current_product_metadata(&self) -> Result<Option<PackageRecord>> {
        let config = self.config_manager.get_config().await;
        match config.current_install_directory() {
            Some(dir) => self.metadata_at_path(&dir).await,
            None => Ok(None),
        }
    }

    /// Version of the running modlist; never fails.
    pub async fn current_product_version(&self) -> String {
        match self.current_product_metadata().await {
            Ok(Some(PackageRecord {
                version: Some(version),
                ..
            })) => version,
            Ok(_) => UNKNOWN_VERSION.to_string(),
            Err(e) => {
                error!("Failed to resolve modlist version: {}", e);
                UNKNOWN_VERSION.to_string()
            }
        }
    }
}
