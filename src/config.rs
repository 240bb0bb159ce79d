//! Session configuration.
//!
//! All settings have defaults matching the review UI's behavior, so a partial
//! JSON document (or `{}`) is a valid configuration.

use crate::error::{MooTrackError, Result};
use crate::request::DEFAULT_MAX_UPLOAD_BYTES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables for one [`AnnotationSession`](crate::session::AnnotationSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Manual boxes must be larger than this many display pixels on both axes.
    pub min_manual_box_size: f64,
    /// Lowest zoom scale. Panning is disabled at this scale.
    pub min_zoom: f64,
    /// Highest zoom scale.
    pub max_zoom: f64,
    /// Zoom change applied by the zoom-in / zoom-out buttons.
    pub zoom_step: f64,
    /// Multiplier turning wheel `deltaY` into a zoom delta.
    pub wheel_sensitivity: f64,
    /// Confidence filter applied to a fresh session, as a percentage (0-100).
    pub default_confidence_percent: u8,
    /// Select every visible detection when a new result arrives.
    pub auto_select_on_result: bool,
    /// Drop the current result as soon as a re-detection starts instead of
    /// keeping it on screen until the new reply resolves.
    pub clear_results_on_redetect: bool,
    /// Base URL of the detection service, consumed by the HTTP layer.
    pub api_base_url: String,
    /// Files larger than this are refused before upload.
    pub max_upload_bytes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_manual_box_size: 20.0,
            min_zoom: 1.0,
            max_zoom: 4.0,
            zoom_step: 0.5,
            wheel_sensitivity: 0.01,
            default_confidence_percent: 0,
            auto_select_on_result: true,
            clear_results_on_redetect: true,
            api_base_url: "http://localhost:8000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl SessionConfig {
    /// Check that the settings describe a usable session.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_zoom.is_finite() && self.max_zoom.is_finite()) || self.min_zoom <= 0.0 {
            return Err(MooTrackError::InvalidConfig(format!(
                "min_zoom must be a positive number, got {}",
                self.min_zoom,
            )));
        }
        if self.max_zoom < self.min_zoom {
            return Err(MooTrackError::InvalidConfig(format!(
                "max_zoom ({}) must be >= min_zoom ({})",
                self.max_zoom, self.min_zoom
            )));
        }
        if !self.zoom_step.is_finite() || self.zoom_step <= 0.0 {
            return Err(MooTrackError::InvalidConfig(format!(
                "zoom_step must be positive, got {}",
                self.zoom_step,
            )));
        }
        if !self.wheel_sensitivity.is_finite() || self.wheel_sensitivity < 0.0 {
            return Err(MooTrackError::InvalidConfig(format!(
                "wheel_sensitivity must be non-negative, got {}",
                self.wheel_sensitivity,
            )));
        }
        if !self.min_manual_box_size.is_finite() || self.min_manual_box_size < 0.0 {
            return Err(MooTrackError::InvalidConfig(format!(
                "min_manual_box_size must be non-negative, got {}",
                self.min_manual_box_size,
            )));
        }
        if self.default_confidence_percent > 100 {
            return Err(MooTrackError::InvalidConfig(format!(
                "default_confidence_percent must be 0-100, got {}",
                self.default_confidence_percent,
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(MooTrackError::InvalidConfig(
                "max_upload_bytes must be positive".to_string(),
            ));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(MooTrackError::InvalidConfig(
                "api_base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize the configuration as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the configuration to disk, overwriting any existing file.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// Load and validate a session configuration from a JSON file.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<SessionConfig> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Load and validate a session configuration from a JSON string.
///
/// # Example
///
/// ```
/// use mootrack::config::load_config_from_str;
///
/// let config = load_config_from_str(r#"{ "max_zoom": 8.0 }"#).unwrap();
/// assert_eq!(config.max_zoom, 8.0);
/// assert_eq!(config.min_manual_box_size, 20.0);
/// ```
pub fn load_config_from_str(json_str: &str) -> Result<SessionConfig> {
    let config: SessionConfig = serde_json::from_str(json_str)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_inverted_zoom_bounds_rejected() {
        let result = load_config_from_str(r#"{ "min_zoom": 3.0, "max_zoom": 2.0 }"#);
        assert!(matches!(result, Err(MooTrackError::InvalidConfig(_))));
    }

    #[test]
    fn test_percent_over_100_rejected() {
        let result = load_config_from_str(r#"{ "default_confidence_percent": 150 }"#);
        assert!(result.is_err());
    }
}
