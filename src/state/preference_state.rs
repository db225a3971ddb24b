use crate::config::{ProjectDirsExt, LAUNCHER_DIRECTORY};
use crate::display::ResolutionRecord;
use crate::error::{AppError, Result};
use crate::state::post_init::PostInitializationHandler;
use crate::utils::file_utils::write_atomically;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

const PREFERENCES_FILENAME: &str = "preferences.json";

pub const RESOLUTION_KEY: &str = "display.resolution";
pub const RESOLUTION_OVERRIDE_KEY: &str = "display.resolution_override";

/// Generic key-value persistence used for user preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    async fn has(&self, key: &str) -> Result<bool>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// [`PreferenceStore`] backed by a single JSON object on disk.
pub struct JsonPreferenceStore {
    values: RwLock<BTreeMap<String, Value>>,
    store_path: PathBuf,
    save_lock: Mutex<()>,
}

impl JsonPreferenceStore {
    pub fn new(store_path: PathBuf) -> Self {
        info!(
            "JsonPreferenceStore: Initializing with path: {:?} (loading deferred)",
            store_path
        );
        Self {
            values: RwLock::new(BTreeMap::new()),
            store_path,
            save_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<()> {
        if !self.store_path.exists() {
            info!("Preference file not found, starting with empty preferences");
            return Ok(());
        }

        let raw = fs::read_to_string(&self.store_path).await?;
        match serde_json::from_str::<BTreeMap<String, Value>>(&raw) {
            Ok(loaded) => {
                debug!("Loaded {} preferences", loaded.len());
                *self.values.write().await = loaded;
            }
            Err(e) => {
                error!("Failed to parse preference file: {}", e);
                let backup_path = self.store_path.with_extension("json.corrupted");
                if let Err(backup_err) = fs::copy(&self.store_path, &backup_path).await {
                    warn!("Failed to back up corrupted preferences: {}", backup_err);
                } else {
                    info!("Backed up corrupted preferences to: {:?}", backup_path);
                }
                self.values.write().await.clear();
                self.save().await?;
            }
        }
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        let data = {
            let values = self.values.read().await;
            serde_json::to_string_pretty(&*values)?
        };
        write_atomically(&self.store_path, data.as_bytes()).await?;
        debug!("Saved preferences to {:?}", self.store_path);
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for JsonPreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        self.save().await
    }

    async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.values.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let removed = self.values.write().await.remove(key).is_some();
        if removed {
            self.save().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PostInitializationHandler for JsonPreferenceStore {
    async fn on_state_ready(&self) -> Result<()> {
        info!("JsonPreferenceStore: on_state_ready called. Loading preferences...");
        self.load().await
    }
}

pub fn default_preferences_path() -> PathBuf {
    LAUNCHER_DIRECTORY.root_dir().join(PREFERENCES_FILENAME)
}

/// The user's saved resolution, if they ever overrode the hardware default.
pub async fn load_resolution_preference(
    store: &dyn PreferenceStore,
) -> Result<Option<ResolutionRecord>> {
    let overridden = store
        .get(RESOLUTION_OVERRIDE_KEY)
        .await?
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !overridden {
        return Ok(None);
    }

    match store.get(RESOLUTION_KEY).await? {
        Some(value) => {
            let saved: ResolutionRecord = serde_json::from_value(value)?;
            ResolutionRecord::new(saved.width, saved.height)
                .map(Some)
                .map_err(|e| AppError::Preference(format!("stored resolution is invalid: {}", e)))
        }
        None => {
            warn!("Resolution override flag set without a stored resolution, ignoring");
            Ok(None)
        }
    }
}

pub async fn save_resolution_preference(
    store: &dyn PreferenceStore,
    resolution: ResolutionRecord,
) -> Result<()> {
    store
        .set(RESOLUTION_KEY, serde_json::to_value(resolution)?)
        .await?;
    store.set(RESOLUTION_OVERRIDE_KEY, Value::Bool(true)).await?;
    info!("Saved resolution preference {}", resolution);
    Ok(())
}

pub async fn clear_resolution_preference(store: &dyn PreferenceStore) -> Result<()> {
    store.delete(RESOLUTION_OVERRIDE_KEY).await?;
    store.delete(RESOLUTION_KEY).await?;
    info!("Cleared resolution preference");
    Ok(())
}
