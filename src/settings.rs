use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::comparison::DisplayMode;
use crate::error::SettingsError;
use crate::formula::TimeIndexBase;

/// Session settings, read from a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Moving average window in days.
    pub moving_average_window: usize,
    /// Label of the time-index pseudo-series in pickers and the formula legend.
    pub time_index_label: String,
    pub time_index_base: TimeIndexBase,
    pub display_mode: DisplayMode,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            moving_average_window: 7,
            time_index_label: "Days".to_string(),
            time_index_base: TimeIndexBase::One,
            display_mode: DisplayMode::Smoothed,
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load from `path`, falling back to defaults when it is missing or invalid.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.as_ref().display(), error = %e, "using default settings");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.moving_average_window == 0 {
            return Err(SettingsError::InvalidWindow(self.moving_average_window));
        }
        Ok(())
    }
}
