// SPDX-License-Identifier: GPL-3.0-only

//! User configuration handling
//!
//! Stored as JSON under the user config directory. A missing file yields
//! the defaults; a malformed file is an error rather than silently reset.

use crate::backends::camera::CameraConstraints;
use crate::errors::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Default decode cadence: 4 Hz. Faster wastes CPU and battery, slower
/// feels unresponsive.
const DEFAULT_DECODE_INTERVAL_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Capture device and format constraints
    pub camera: CameraConstraints,
    /// Milliseconds between decode attempts
    pub decode_interval_ms: u64,
    /// Play a confirmation tone when a new ISBN is stored
    pub tone_enabled: bool,
    /// Scanlines sampled per frame by the built-in decoder
    pub scan_rows: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConstraints::default(),
            decode_interval_ms: DEFAULT_DECODE_INTERVAL_MS,
            tone_enabled: true,
            scan_rows: 15,
        }
    }
}

impl Config {
    pub fn decode_interval(&self) -> Duration {
        Duration::from_millis(self.decode_interval_ms.max(1))
    }

    /// Load from disk, falling back to defaults when no file exists
    pub fn load() -> ScanResult<Self> {
        let Some(path) = config_path() else {
            debug!("No config directory available, using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| ScanError::Config(format!("read {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| ScanError::Config(format!("parse {}: {}", path.display(), e)))
    }

    /// Persist to disk, creating the config directory if needed
    pub fn save(&self) -> ScanResult<()> {
        let path = config_path()
            .ok_or_else(|| ScanError::Config("no config directory available".to_string()))?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| ScanError::Config(format!("create {}: {}", dir.display(), e)))?;
        }

        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| ScanError::Config(e.to_string()))?;
        std::fs::write(&path, raw)
            .map_err(|e| ScanError::Config(format!("write {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bookscan").join("config.json"))
}
