use crate::error::{AppError, Result};
use crate::registry::dto::{LegacyInstallEntry, LEGACY_TYPE_KEY};
use crate::registry::PackageRecord;
use log::{debug, info, warn};
use std::path::Path;
use tokio::fs;

pub const LEGACY_REGISTRY_FILENAME: &str = "installed_modlists.json";

/// Reads the registry file written by the legacy installer.
///
/// A missing file is not an error: the legacy installer may never have run on
/// this machine. The file carries no timestamps, so every record comes back
/// with `last_updated: None`.
pub async fn read_legacy_registry(path: &Path) -> Result<Vec<PackageRecord>> {
    if !path.exists() {
        warn!(
            "Legacy modlist registry not found at {}, skipping",
            path.display()
        );
        return Ok(Vec::new());
    }

    info!("Reading legacy modlist registry from {}", path.display());
    let raw = fs::read_to_string(path).await?;
    parse_legacy_registry(&raw)
}

fn parse_legacy_registry(raw: &str) -> Result<Vec<PackageRecord>> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let entries = value.as_object().ok_or_else(|| {
        AppError::ParseError("legacy modlist registry is not a JSON object".to_string())
    })?;

    let mut records = Vec::with_capacity(entries.len());
    for (key, entry) in entries {
        if key == LEGACY_TYPE_KEY {
            continue;
        }

        let entry: LegacyInstallEntry = serde_json::from_value(entry.clone())?;
        let mod_list = entry.mod_list.unwrap_or_default();
        debug!(
            "Legacy registry entry '{}' -> {} ({:?} {:?})",
            key,
            entry.installation_path.display(),
            mod_list.name,
            mod_list.version
        );

        records.push(PackageRecord {
            install_path: entry.installation_path,
            title: mod_list.name,
            version: mod_list.version,
            last_updated: None,
        });
    }

    Ok(records)
}
