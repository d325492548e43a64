use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Detector tuning: window geometry, throttle and acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Sliding window length W; also the classifier's sequence length.
    pub window_size: usize,
    /// Frames that must be buffered before the classifier runs.
    pub min_fill: usize,
    /// Minimum time between two admitted detection calls.
    pub throttle_ms: u64,
    /// Top score must be strictly above this to produce a result.
    pub acceptance_threshold: f32,
}

impl DetectorConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: 30,
            min_fill: 10,
            throttle_ms: 200,
            acceptance_threshold: 0.6,
        }
    }
}

/// Session smoothing and history policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub display_threshold: f32,
    pub history_threshold: f32,
    pub dedup_window_ms: u64,
    pub decay_step: f32,
    pub clear_threshold: f32,
    pub history_capacity: usize,
}

impl SessionConfig {
    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_threshold: 0.6,
            history_threshold: 0.7,
            dedup_window_ms: 2000,
            decay_step: 0.05,
            clear_threshold: 0.3,
            history_capacity: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub detector: DetectorConfig,
    pub session: SessionConfig,
}

impl RecognitionConfig {
    /// Reads and validates a JSON config. Missing fields take their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the user config if present, otherwise defaults.
    ///
    /// An unreadable or invalid user config is logged and ignored.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring user config: {e}");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Read {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// `<config_dir>/handsign/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.json"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.detector;
        let s = &self.session;

        if d.window_size == 0 {
            return Err(ConfigError::Invalid("window_size must be >= 1".into()));
        }
        if d.min_fill == 0 || d.min_fill > d.window_size {
            return Err(ConfigError::Invalid(format!(
                "min_fill must be between 1 and window_size ({}), got {}",
                d.window_size, d.min_fill
            )));
        }
        for (name, value) in [
            ("acceptance_threshold", d.acceptance_threshold),
            ("display_threshold", s.display_threshold),
            ("history_threshold", s.history_threshold),
            ("clear_threshold", s.clear_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 0.0 and 1.0, got {value}"
                )));
            }
        }
        if s.display_threshold >= s.history_threshold {
            return Err(ConfigError::Invalid(format!(
                "display_threshold ({}) must be below history_threshold ({})",
                s.display_threshold, s.history_threshold
            )));
        }
        if s.clear_threshold > s.display_threshold {
            return Err(ConfigError::Invalid(format!(
                "clear_threshold ({}) must not exceed display_threshold ({})",
                s.clear_threshold, s.display_threshold
            )));
        }
        if !(s.decay_step > 0.0 && s.decay_step <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "decay_step must be in (0.0, 1.0], got {}",
                s.decay_step
            )));
        }
        if s.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be >= 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RecognitionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_durations() {
        let config = RecognitionConfig::default();
        assert_eq!(config.detector.throttle(), Duration::from_millis(200));
        assert_eq!(config.session.dedup_window(), Duration::from_secs(2));
    }

    #[rstest]
    #[case::zero_window(|c: &mut RecognitionConfig| c.detector.window_size = 0)]
    #[case::zero_min_fill(|c: &mut RecognitionConfig| c.detector.min_fill = 0)]
    #[case::min_fill_over_window(|c: &mut RecognitionConfig| c.detector.min_fill = 31)]
    #[case::acceptance_above_one(|c: &mut RecognitionConfig| c.detector.acceptance_threshold = 1.5)]
    #[case::display_equals_history(|c: &mut RecognitionConfig| c.session.display_threshold = 0.7)]
    #[case::clear_above_display(|c: &mut RecognitionConfig| c.session.clear_threshold = 0.65)]
    #[case::zero_decay(|c: &mut RecognitionConfig| c.session.decay_step = 0.0)]
    #[case::zero_history(|c: &mut RecognitionConfig| c.session.history_capacity = 0)]
    fn test_invalid_configs_rejected(#[case] mutate: fn(&mut RecognitionConfig)) {
        let mut config = RecognitionConfig::default();
        mutate(&mut config);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"detector": {"throttle_ms": 300}}"#).unwrap();

        let config = RecognitionConfig::load_from(&path).unwrap();

        assert_eq!(config.detector.throttle_ms, 300);
        assert_eq!(config.detector.window_size, 30);
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"detector": {"min_fill": 40}}"#).unwrap();

        assert!(matches!(
            RecognitionConfig::load_from(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            RecognitionConfig::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_reports_read_error() {
        let result = RecognitionConfig::load_from(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = RecognitionConfig::default();
        config.session.decay_step = 0.08;
        config.session.clear_threshold = 0.4;

        config.save_to(&path).unwrap();

        assert_eq!(RecognitionConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_default_path_under_app_dir() {
        if let Some(path) = RecognitionConfig::default_path() {
            assert!(path.to_string_lossy().contains(APP_DIR_NAME));
            assert!(path.ends_with("config.json"));
        }
    }
}
