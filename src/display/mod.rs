pub mod display_probe;
pub mod enumerator;
pub mod graphics_config;
pub mod projector;
pub mod reconciler;

use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

pub use display_probe::{
    DisplayGeometry, DisplayProbe, StaticDisplayProbe, ToolDisplayProbe, ToolProbeSettings,
};
pub use enumerator::{
    enumerate_resolutions, query_current_resolution, CommandOutput, CommandRunner, SystemCommandRunner,
};
pub use projector::ResolutionProjector;
pub use reconciler::{fallback_resolutions, reconcile_resolutions};

/// Aspect ratio above which a mode counts as ultra-wide. 16:9 is ~1.7778.
pub const ULTRA_WIDE_THRESHOLD: f64 = 1.78;

static RESOLUTION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*[xX]\s*(\d+)$").expect("resolution pattern is valid"));

/// A display mode in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub width: u32,
    pub height: u32,
}

impl ResolutionRecord {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AppError::InvalidInput(format!(
                "resolution must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn is_ultra_wide(&self) -> bool {
        self.aspect_ratio() > ULTRA_WIDE_THRESHOLD
    }
}

impl Display for ResolutionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ResolutionRecord {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = RESOLUTION_TOKEN
            .captures(s.trim())
            .ok_or_else(|| AppError::ParseError(format!("invalid resolution '{}'", s)))?;

        let parse = |idx: usize| -> Result<u32> {
            caps[idx]
                .parse::<u32>()
                .map_err(|e| AppError::ParseError(format!("invalid resolution '{}': {}", s, e)))
        };

        ResolutionRecord::new(parse(1)?, parse(2)?)
    }
}
