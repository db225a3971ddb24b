use log::{error, info};
use modpack_launcher_lib::display::{ResolutionRecord, SystemCommandRunner, ToolDisplayProbe};
use modpack_launcher_lib::error::{AppError, Result};
use modpack_launcher_lib::logging;
use modpack_launcher_lib::state::{State, StatePaths};
use modpack_launcher_lib::utils::system_info::OS;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let log_handle = match logging::setup_logging().await {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("ERROR: Logging could not be initialized: {}", e);
            None
        }
    };

    info!("Starting modpack launcher...");

    if let Err(e) = run(std::env::args().skip(1).collect(), log_handle).await {
        error!("Launcher failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Vec<String>, log_handle: Option<logging::Handle>) -> Result<()> {
    let runner = Arc::new(SystemCommandRunner);
    let display = Arc::new(ToolDisplayProbe::new(
        runner.clone(),
        OS.supports_resolution_enumeration(),
    ));
    let state = State::init(StatePaths::default(), display.clone(), runner).await?;

    let config = state.config_manager.get_config().await;
    display.configure(config.display_probe_settings()).await;
    if let Some(handle) = &log_handle {
        logging::set_log_level(handle, config.log_level_filter()?)?;
    }

    match args.first().map(String::as_str) {
        Some("set-resolution") => {
            let raw = args.get(1).ok_or_else(|| {
                AppError::InvalidInput("usage: set-resolution <width>x<height>".to_string())
            })?;
            let resolution: ResolutionRecord = raw.parse()?;
            state.resolution_manager.apply_resolution(resolution).await?;
            info!("Resolution set to {}", resolution);
        }
        Some("clear-resolution") => {
            state.resolution_manager.clear_preference().await?;
        }
        Some(other) => {
            return Err(AppError::InvalidInput(format!(
                "unknown command '{}', expected set-resolution or clear-resolution",
                other
            )));
        }
        None => report(&state).await?,
    }

    Ok(())
}

async fn report(state: &State) -> Result<()> {
    match state.package_manager.installed_packages().await? {
        Some(packages) => {
            for record in packages.values() {
                info!(
                    "Installed: {} -> {} {}",
                    record.install_path.display(),
                    record.title.as_deref().unwrap_or("<untitled>"),
                    record.version.as_deref().unwrap_or("")
                );
            }
        }
        None => info!("No installed modlists found"),
    }

    for path in state.package_manager.packages_matching_current_product().await? {
        info!("Product install: {}", path.display());
    }
    info!(
        "Current modlist version: {}",
        state.package_manager.current_product_version().await
    );

    let active = state.resolution_manager.active_resolution().await?;
    for resolution in state.resolution_manager.available_resolutions().await? {
        info!(
            "Resolution {}{}{}",
            resolution,
            if resolution.is_ultra_wide() { " (ultra-wide)" } else { "" },
            if resolution == active { " [active]" } else { "" }
        );
    }

    Ok(())
}
