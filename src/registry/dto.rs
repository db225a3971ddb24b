use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Key the legacy installer writes next to its entries to carry .NET type info.
pub const LEGACY_TYPE_KEY: &str = "$type";

/// One value of `installed_modlists.json`, keyed by install path in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyInstallEntry {
    #[serde(rename = "InstallationPath")]
    pub installation_path: PathBuf,
    #[serde(rename = "ModList", default)]
    pub mod_list: Option<LegacyModList>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyModList {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Version", default)]
    pub version: Option<String>,
}

/// Contents of one `install-settings*` file written by the current installer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallSettings {
    #[serde(rename = "InstallLocation")]
    pub install_location: PathBuf,
    #[serde(rename = "Metadata", default)]
    pub metadata: Option<InstallMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}
