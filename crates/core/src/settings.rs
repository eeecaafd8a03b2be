use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Fixed delays of the control loop, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub detection_wait: u64,
    pub retry_delay: u64,
    pub pause_poll: u64,
    pub iteration_delay: u64,
    pub completion_settle: u64,
    pub after_completion: u64,
    pub click_settle: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            detection_wait: 300,
            retry_delay: 500,
            pause_poll: 100,
            iteration_delay: 50,
            completion_settle: 500,
            after_completion: 500,
            click_settle: 150,
        }
    }
}

impl Timing {
    /// No waiting at all; used by tests and simulations.
    pub fn instant() -> Self {
        Self {
            detection_wait: 0,
            retry_delay: 0,
            pause_poll: 1,
            iteration_delay: 0,
            completion_settle: 0,
            after_completion: 0,
            click_settle: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_fetch_retries: u32,
    pub timing: Timing,
    pub debug: bool,
    pub calibration_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub color_tolerance: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_fetch_retries: 3,
            timing: Timing::default(),
            debug: false,
            calibration_path: PathBuf::from("calibration.json"),
            catalog_path: None,
            color_tolerance: 60.0,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            let _ = std::fs::write(path, json);
        }
    }

    /// Like `load`, but writes the defaults out when no file exists yet.
    pub fn load_or_init(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            settings.save(path);
            return settings;
        }
        Self::load(path)
    }
}
