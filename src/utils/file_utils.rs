use crate::error::{AppError, Result};
use fs4::tokio::AsyncFileExt;
use log::{debug, error, info};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const TMP_SUFFIX: &str = ".launcher_tmp";
const LOCK_SUFFIX: &str = ".lock";

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Replaces `target` with `contents` so readers only ever see the old or the new file.
///
/// Holds an exclusive lock on `<target>.lock` for the duration of the write,
/// writes and fsyncs `<target>.launcher_tmp`, then renames it over `target`.
/// Fails with [`AppError::FileLocked`] if another writer holds the lock.
pub async fn write_atomically(target: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent_dir) = target.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir).await?;
        }
    }

    let lock_path = with_suffix(target, LOCK_SUFFIX);
    let lock_file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .await?;

    if let Err(e) = lock_file.try_lock_exclusive() {
        if e.kind() == ErrorKind::WouldBlock
            || e.kind() == ErrorKind::PermissionDenied
            || e.kind() == ErrorKind::ResourceBusy
        {
            error!("Could not lock {} for writing: {}", lock_path.display(), e);
            return Err(AppError::FileLocked(target.to_path_buf()));
        }
        return Err(AppError::Io(e));
    }
    debug!("Acquired write lock {}", lock_path.display());

    let tmp_path = with_suffix(target, TMP_SUFFIX);
    let written = async {
        let mut tmp = fs::File::create(&tmp_path).await?;
        tmp.write_all(contents).await?;
        tmp.sync_all().await?;
        drop(tmp);
        fs::rename(&tmp_path, target).await
    }
    .await;

    if let Err(e) = written {
        error!("Failed to replace {}: {}", target.display(), e);
        let _ = fs::remove_file(&tmp_path).await;
        return Err(AppError::Io(e));
    }

    // The lock is released when `lock_file` goes out of scope here.
    info!("Wrote {} ({} bytes)", target.display(), contents.len());
    Ok(())
}
