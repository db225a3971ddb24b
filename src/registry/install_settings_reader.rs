use crate::error::Result;
use crate::registry::dto::InstallSettings;
use crate::registry::PackageRecord;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const SAVED_SETTINGS_DIRNAME: &str = "saved_settings";
pub const INSTALL_SETTINGS_PREFIX: &str = "install-settings";

/// Reads every `install-settings*` file of the current installer.
///
/// Each record is stamped with its file's modification time. The installer
/// writes these files under randomized names, so several of them may describe
/// the same install location; they are all returned and left to the reconciler.
pub async fn read_install_settings(dir: &Path) -> Result<Vec<PackageRecord>> {
    if !dir.is_dir() {
        warn!(
            "Install settings directory not found at {}, skipping",
            dir.display()
        );
        return Ok(Vec::new());
    }

    let files = list_install_settings_files(dir).await?;
    info!(
        "Found {} install settings files in {}",
        files.len(),
        dir.display()
    );

    let mut records = Vec::with_capacity(files.len());
    for path in files {
        records.push(read_install_settings_file(&path).await?);
    }

    Ok(records)
}

/// Lists matching files sorted by file name so repeated runs fold in the same order.
async fn list_install_settings_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name();
        let is_match = name
            .to_str()
            .map(|n| n.starts_with(INSTALL_SETTINGS_PREFIX))
            .unwrap_or(false);
        if is_match && entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

async fn read_install_settings_file(path: &Path) -> Result<PackageRecord> {
    let raw = fs::read_to_string(path).await?;
    let settings: InstallSettings = serde_json::from_str(&raw)?;
    let modified: DateTime<Utc> = fs::metadata(path).await?.modified()?.into();
    let metadata = settings.metadata.unwrap_or_default();

    debug!(
        "Install settings {} -> {} ({:?} {:?}, modified {})",
        path.display(),
        settings.install_location.display(),
        metadata.title,
        metadata.version,
        modified
    );

    Ok(PackageRecord {
        install_path: settings.install_location,
        title: metadata.title,
        version: metadata.version,
        last_updated: Some(modified),
    })
}
