pub mod dto;
pub mod install_settings_reader;
pub mod legacy_reader;
pub mod reconciler;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use install_settings_reader::read_install_settings;
pub use legacy_reader::read_legacy_registry;
pub use reconciler::{reconcile_packages, should_replace};

/// One row of the canonical installed-modlist registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub install_path: PathBuf,
    pub title: Option<String>,
    pub version: Option<String>,
    /// Only set for sources that carry a file modification time.
    pub last_updated: Option<DateTime<Utc>>,
}
