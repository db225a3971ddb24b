use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;
use std::path::PathBuf;

pub static LAUNCHER_DIRECTORY: Lazy<ProjectDirs> =
    Lazy::new(
        || match ProjectDirs::from("gg", "modpack", "ModpackLauncher") {
            Some(proj_dirs) => proj_dirs,
            None => panic!("Failed to get application directory"),
        },
    );

/// Folder name the Wabbajack installer uses below the local app data directory.
const WABBAJACK_DIR_NAME: &str = "Wabbajack";

// Extension trait for ProjectDirs to add root_dir functionality
pub trait ProjectDirsExt {
    fn root_dir(&self) -> PathBuf;
}

impl ProjectDirsExt for ProjectDirs {
    fn root_dir(&self) -> PathBuf {
        if cfg!(target_os = "windows") {
            // Windows: data_dir ends in "data", keep everything one level up
            self.data_dir()
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| self.data_dir().to_path_buf())
        } else {
            self.data_dir().to_path_buf()
        }
    }
}

/// Returns `<LocalAppData>/Wabbajack`, where both installer generations keep their records.
/// Falls back to a relative path when no home directory can be resolved.
pub fn default_wabbajack_dir() -> PathBuf {
    match BaseDirs::new() {
        Some(base) => base.data_local_dir().join(WABBAJACK_DIR_NAME),
        None => PathBuf::from(WABBAJACK_DIR_NAME),
    }
}
