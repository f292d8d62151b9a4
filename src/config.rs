//! Configuration for summary generation.
//!
//! Precedence: environment variables > config file > defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::SummaryError;
use crate::selection::ContourFilter;
use crate::timeline::S_WAVE_VELOCITY_KM_S;

/// Summary settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Catalog locations
    #[serde(default)]
    pub general: GeneralConfig,

    /// Physical constants and display thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

/// Catalog file locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whitespace-delimited station list
    #[serde(default = "default_station_file")]
    pub station_file: PathBuf,

    /// `name,lat,lon,population,category` city list
    #[serde(default = "default_city_file")]
    pub city_file: PathBuf,
}

/// Thresholds consumed by the geometry core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Near-source S-wave velocity (km/s)
    #[serde(default = "default_s_wave_velocity")]
    pub s_wave_velocity: f64,

    /// Magnitude at which the large-event MMI applies
    #[serde(default = "default_mag_threshold")]
    pub mag_threshold: f64,

    /// Minimum MMI drawn for small events
    #[serde(default = "default_mmi_small")]
    pub mmi_small: u8,

    /// Minimum MMI drawn for large events
    #[serde(default = "default_mmi_alert")]
    pub mmi_alert: u8,
}

fn default_station_file() -> PathBuf {
    PathBuf::from("params/stations.txt")
}

fn default_city_file() -> PathBuf {
    PathBuf::from("params/cities.csv")
}

fn default_s_wave_velocity() -> f64 {
    S_WAVE_VELOCITY_KM_S
}

fn default_mag_threshold() -> f64 {
    5.0
}

fn default_mmi_small() -> u8 {
    3
}

fn default_mmi_alert() -> u8 {
    4
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            station_file: default_station_file(),
            city_file: default_city_file(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            s_wave_velocity: default_s_wave_velocity(),
            mag_threshold: default_mag_threshold(),
            mmi_small: default_mmi_small(),
            mmi_alert: default_mmi_alert(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// Relative catalog paths are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        if let Some(base) = path.parent() {
            settings.general.station_file = resolve(base, &settings.general.station_file);
            settings.general.city_file = resolve(base, &settings.general.city_file);
        }

        Ok(settings)
    }

    /// Load settings from an optional file, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable, an override is malformed,
    /// or the resulting values are out of range.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        debug!(?settings, "configuration loaded");

        Ok(settings)
    }

    /// Apply `SHAKESUMMARY_*` overrides from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric override does not parse.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup("SHAKESUMMARY_CITY_FILE") {
            self.general.city_file = PathBuf::from(path);
        }

        if let Some(path) = lookup("SHAKESUMMARY_STATION_FILE") {
            self.general.station_file = PathBuf::from(path);
        }

        if let Some(velocity) = lookup("SHAKESUMMARY_S_WAVE_VELOCITY") {
            self.thresholds.s_wave_velocity = velocity
                .parse()
                .context("Invalid SHAKESUMMARY_S_WAVE_VELOCITY")?;
        }

        if let Some(mag) = lookup("SHAKESUMMARY_MAG_THRESHOLD") {
            self.thresholds.mag_threshold = mag.parse().context("Invalid SHAKESUMMARY_MAG_THRESHOLD")?;
        }

        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::Config`] for a non-positive velocity or an
    /// MMI threshold outside 1..=10.
    pub fn validate(&self) -> Result<(), SummaryError> {
        let t = &self.thresholds;

        if !(t.s_wave_velocity.is_finite() && t.s_wave_velocity > 0.0) {
            return Err(SummaryError::Config(format!(
                "s_wave_velocity must be positive, got {}",
                t.s_wave_velocity
            )));
        }

        for (name, value) in [("mmi_small", t.mmi_small), ("mmi_alert", t.mmi_alert)] {
            if !(1..=10).contains(&value) {
                return Err(SummaryError::Config(format!("{name} must be within 1..=10, got {value}")));
            }
        }

        Ok(())
    }
}

impl From<&Settings> for ContourFilter {
    fn from(settings: &Settings) -> Self {
        Self {
            mag_threshold: settings.thresholds.mag_threshold,
            min_mmi_small: settings.thresholds.mmi_small,
            min_mmi_large: settings.thresholds.mmi_alert,
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!((settings.thresholds.s_wave_velocity - 3.55).abs() < f64::EPSILON);
        assert_eq!(settings.thresholds.mmi_small, 3);
        assert_eq!(settings.thresholds.mmi_alert, 4);
        assert_eq!(settings.general.city_file, PathBuf::from("params/cities.csv"));
        assert!(settings.validate().is_ok());
        assert_eq!(ContourFilter::from(&settings), ContourFilter::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shakesummary.toml");
        std::fs::write(&path, "[thresholds]\nmag_threshold = 6.0\n").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert!((settings.thresholds.mag_threshold - 6.0).abs() < f64::EPSILON);
        assert_eq!(settings.thresholds.mmi_alert, 4);
        assert_eq!(settings.general.city_file, dir.path().join("params/cities.csv"));
    }

    #[test]
    fn test_absolute_paths_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shakesummary.toml");
        std::fs::write(&path, "[general]\ncity_file = \"/srv/cities.csv\"\n").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.general.city_file, PathBuf::from("/srv/cities.csv"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("SHAKESUMMARY_CITY_FILE", "/tmp/cities.csv"),
            ("SHAKESUMMARY_S_WAVE_VELOCITY", "3.2"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_overrides(|key| env.get(key).map(ToString::to_string))
            .unwrap();

        assert_eq!(settings.general.city_file, PathBuf::from("/tmp/cities.csv"));
        assert!((settings.thresholds.s_wave_velocity - 3.2).abs() < f64::EPSILON);
        assert!((settings.thresholds.mag_threshold - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bad_override() {
        let mut settings = Settings::default();
        let result = settings.apply_overrides(|key| (key == "SHAKESUMMARY_MAG_THRESHOLD").then(|| "big".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_ranges() {
        let mut settings = Settings::default();
        settings.thresholds.s_wave_velocity = 0.0;
        assert!(matches!(settings.validate(), Err(SummaryError::Config(_))));

        let mut settings = Settings::default();
        settings.thresholds.mmi_alert = 11;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.thresholds.mmi_small = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[thresholds\nmag_threshold = ").unwrap();
        assert!(Settings::from_file(&path).is_err());
    }
}
