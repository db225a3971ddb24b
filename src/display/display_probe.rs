use crate::display::enumerator::query_current_resolution;
use crate::display::{CommandRunner, ResolutionRecord};
use crate::error::Result;
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Primary display as reported by the windowing layer: logical size plus DPI scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub logical_width: u32,
    pub logical_height: u32,
    pub scale_factor: f64,
}

impl DisplayGeometry {
    /// Physical pixel resolution, rounded per axis.
    pub fn physical_resolution(&self) -> Result<ResolutionRecord> {
        let width = (self.logical_width as f64 * self.scale_factor).round() as u32;
        let height = (self.logical_height as f64 * self.scale_factor).round() as u32;
        ResolutionRecord::new(width, height)
    }
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        Self {
            logical_width: 1920,
            logical_height: 1080,
            scale_factor: 1.0,
        }
    }
}

#[async_trait]
pub trait DisplayProbe: Send + Sync {
    async fn primary_display(&self) -> Result<DisplayGeometry>;

    /// Current hardware resolution of the primary display.
    async fn current_resolution(&self) -> Result<ResolutionRecord> {
        let geometry = self.primary_display().await?;
        let resolution = geometry.physical_resolution()?;
        debug!(
            "Primary display {}x{} @ {}x -> {}",
            geometry.logical_width, geometry.logical_height, geometry.scale_factor, resolution
        );
        Ok(resolution)
    }
}

/// Probe fed by whoever owns the window (the shell pushes updates on monitor changes).
pub struct StaticDisplayProbe {
    geometry: RwLock<DisplayGeometry>,
}

impl StaticDisplayProbe {
    pub fn new(geometry: DisplayGeometry) -> Self {
        Self {
            geometry: RwLock::new(geometry),
        }
    }

    pub async fn update(&self, geometry: DisplayGeometry) {
        let mut guard = self.geometry.write().await;
        *guard = geometry;
    }
}

#[async_trait]
impl DisplayProbe for StaticDisplayProbe {
    async fn primary_display(&self) -> Result<DisplayGeometry> {
        Ok(*self.geometry.read().await)
    }
}

/// How [`ToolDisplayProbe`] reaches the resolution tool and what it reports when it can't.
#[derive(Debug, Clone)]
pub struct ToolProbeSettings {
    pub tool: PathBuf,
    pub timeout: Duration,
    pub fallback: DisplayGeometry,
}

impl Default for ToolProbeSettings {
    fn default() -> Self {
        Self {
            tool: PathBuf::from("QRes.exe"),
            timeout: Duration::from_secs(10),
            fallback: DisplayGeometry::default(),
        }
    }
}

/// Reads the primary display's mode from the resolution tool.
///
/// The tool reports physical pixels, so the geometry it yields always has a
/// scale factor of 1. When the platform has no tool, or the tool fails, the
/// configured fallback geometry is returned instead.
pub struct ToolDisplayProbe {
    runner: Arc<dyn CommandRunner>,
    tool_supported: bool,
    settings: RwLock<ToolProbeSettings>,
}

impl ToolDisplayProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, tool_supported: bool) -> Self {
        Self {
            runner,
            tool_supported,
            settings: RwLock::new(ToolProbeSettings::default()),
        }
    }

    pub async fn configure(&self, settings: ToolProbeSettings) {
        let mut guard = self.settings.write().await;
        *guard = settings;
    }
}

#[async_trait]
impl DisplayProbe for ToolDisplayProbe {
    async fn primary_display(&self) -> Result<DisplayGeometry> {
        let settings = self.settings.read().await.clone();
        if !self.tool_supported {
            return Ok(settings.fallback);
        }

        match query_current_resolution(self.runner.as_ref(), &settings.tool, settings.timeout).await
        {
            Ok(Some(current)) => Ok(DisplayGeometry {
                logical_width: current.width,
                logical_height: current.height,
                scale_factor: 1.0,
            }),
            Ok(None) => Ok(settings.fallback),
            Err(e) => {
                warn!(
                    "Could not read the current display mode ({}), assuming {}x{} @ {}x",
                    e,
                    settings.fallback.logical_width,
                    settings.fallback.logical_height,
                    settings.fallback.scale_factor
                );
                Ok(settings.fallback)
            }
        }
    }
}
