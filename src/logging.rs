use crate::config::{ProjectDirsExt, LAUNCHER_DIRECTORY};
use crate::error::{AppError, Result};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};
use tokio::fs;

pub use log4rs::Handle;

const LOG_DIR_NAME: &str = "logs";
const LOG_FILE_NAME: &str = "launcher.log";
const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} | {({l}):5.5} | {M} | {m}{n}";
const CONSOLE_LOG_PATTERN: &str = "{d(%H:%M:%S)} | {h({l}):5.5} | {m}{n}";
const LOG_FILE_SIZE_LIMIT_MB: u64 = 10;
const LOG_FILE_BACKUP_COUNT: u32 = 5;
/// Level used until the launcher config is loaded.
const STARTUP_LEVEL: LevelFilter = LevelFilter::Debug;

pub fn log_dir() -> PathBuf {
    LAUNCHER_DIRECTORY.root_dir().join(LOG_DIR_NAME)
}

/// Rolling `launcher.log` in `log_dir` plus stdout, both at `level`.
pub fn build_config(log_dir: &Path, level: LevelFilter) -> Result<Config> {
    let size_trigger = SizeTrigger::new(LOG_FILE_SIZE_LIMIT_MB * 1024 * 1024);
    let roller_pattern = log_dir.join(format!("{}.{{}}", LOG_FILE_NAME));
    let roller_pattern = roller_pattern.to_str().ok_or_else(|| {
        AppError::Config(format!(
            "log directory {} is not valid UTF-8",
            log_dir.display()
        ))
    })?;
    let roller = FixedWindowRoller::builder()
        .base(1)
        .build(roller_pattern, LOG_FILE_BACKUP_COUNT)
        .map_err(|e| AppError::Config(format!("log roller: {}", e)))?;
    let compound_policy = CompoundPolicy::new(Box::new(size_trigger), Box::new(roller));

    let file_appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(log_dir.join(LOG_FILE_NAME), Box::new(compound_policy))?;

    let console_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_LOG_PATTERN)))
        .target(Target::Stdout)
        .build();

    Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .appender(Appender::builder().build("stdout", Box::new(console_appender)))
        .build(
            Root::builder()
                .appender("file")
                .appender("stdout")
                .build(level),
        )
        .map_err(|e| AppError::Config(format!("logging config: {}", e)))
}

/// Starts logging at the startup level. The returned handle lets
/// [`set_log_level`] switch to the configured level once it is known.
pub async fn setup_logging() -> Result<Handle> {
    let log_dir = log_dir();

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir).await?;
        // log4rs is not up yet
        eprintln!(
            "[Logging Setup] Created log directory: {}",
            log_dir.display()
        );
    }

    let handle = log4rs::init_config(build_config(&log_dir, STARTUP_LEVEL)?)
        .map_err(|e| AppError::Config(format!("logger already set: {}", e)))?;

    log::info!("Logging initialized. Log directory: {}", log_dir.display());

    Ok(handle)
}

pub fn set_log_level(handle: &Handle, level: LevelFilter) -> Result<()> {
    if level == STARTUP_LEVEL {
        return Ok(());
    }
    handle.set_config(build_config(&log_dir(), level)?);
    log::info!("Log level set to {}", level);
    Ok(())
}
