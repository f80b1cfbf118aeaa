use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::models::AnalysisMode;

const SAMPLE_INTERVAL_ENV: &str = "MOCKVIEW_SAMPLE_INTERVAL_MS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectorOptions {
    /// Square input edge the detector resizes frames to
    pub input_size: u32,
    /// Minimum face score for a detection to count
    pub score_threshold: f64,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            input_size: 224,
            score_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSettings {
    pub sample_interval_ms: u64,
    pub default_mode: AnalysisMode,
    pub detector: DetectorOptions,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: 200,
            default_mode: AnalysisMode::Audio,
            detector: DetectorOptions::default(),
        }
    }
}

impl AnalysisSettings {
    /// Sampling period, honoring `MOCKVIEW_SAMPLE_INTERVAL_MS` when set to a
    /// positive integer.
    pub fn sample_interval(&self) -> Duration {
        self.interval_with_override(std::env::var(SAMPLE_INTERVAL_ENV).ok().as_deref())
    }

    fn interval_with_override(&self, raw: Option<&str>) -> Duration {
        let from_env = raw
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0);

        Duration::from_millis(from_env.unwrap_or(self.sample_interval_ms).max(1))
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AnalysisSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            AnalysisSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn analysis(&self) -> AnalysisSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, settings: AnalysisSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &AnalysisSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.analysis(), AnalysisSettings::default());
        assert_eq!(store.analysis().default_mode, AnalysisMode::Audio);
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.analysis();
        settings.sample_interval_ms = 100;
        settings.default_mode = AnalysisMode::Video;
        store.update(settings.clone()).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.analysis(), settings);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.analysis(), AnalysisSettings::default());
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "sampleIntervalMs": 500 }"#).unwrap();
        let settings = SettingsStore::new(path).unwrap().analysis();
        assert_eq!(settings.sample_interval_ms, 500);
        assert_eq!(settings.detector, DetectorOptions::default());
    }

    #[test]
    fn env_override_wins_over_file_value() {
        let settings = AnalysisSettings::default();
        assert_eq!(settings.interval_with_override(Some("50")), Duration::from_millis(50));
        assert_eq!(settings.interval_with_override(Some(" 75 ")), Duration::from_millis(75));
        assert_eq!(settings.interval_with_override(Some("0")), Duration::from_millis(200));
        assert_eq!(settings.interval_with_override(Some("fast")), Duration::from_millis(200));
        assert_eq!(settings.interval_with_override(None), Duration::from_millis(200));
    }
}
