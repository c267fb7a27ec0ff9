use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, time::Duration};

use crate::metrics::{HISTORY_CAPACITY, TREND_WINDOW};
use crate::tutor::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "EMOTUTOR_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub system_instruction: Option<String>,
    pub tick_interval_ms: u64,
    pub history_capacity: usize,
    pub trend_window: usize,
    pub event_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            system_instruction: None,
            tick_interval_ms: 1_000,
            history_capacity: HISTORY_CAPACITY,
            trend_window: TREND_WINDOW,
            event_buffer: 64,
        }
    }
}

impl AppConfig {
    /// Defaults, then the JSON file named by `EMOTUTOR_CONFIG`, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Overlay values from `lookup`; blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = get("API_KEY").or_else(|| get("GEMINI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(url) = get("EMOTUTOR_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = get("EMOTUTOR_MODEL") {
            self.model = model;
        }
        if let Some(ms) = get("EMOTUTOR_TICK_MS") {
            self.tick_interval_ms = ms
                .trim()
                .parse()
                .with_context(|| format!("EMOTUTOR_TICK_MS is not a number: {ms}"))?;
        }
        if let Some(capacity) = get("EMOTUTOR_HISTORY") {
            self.history_capacity = capacity
                .trim()
                .parse()
                .with_context(|| format!("EMOTUTOR_HISTORY is not a number: {capacity}"))?;
        }
        match get("EMOTUTOR_TREND") {
            Some(window) => {
                self.trend_window = window
                    .trim()
                    .parse()
                    .with_context(|| format!("EMOTUTOR_TREND is not a number: {window}"))?;
            }
            // A shrunken history carries the default trend window down with it.
            None => self.trend_window = self.trend_window.min(self.history_capacity),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            bail!("tick_interval_ms must be greater than zero");
        }
        if self.history_capacity == 0 {
            bail!("history_capacity must be greater than zero");
        }
        if self.trend_window == 0 || self.trend_window > self.history_capacity {
            bail!(
                "trend_window must be between 1 and history_capacity ({})",
                self.history_capacity
            );
        }
        if self.model.trim().is_empty() {
            bail!("model must not be empty");
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_dashboard() {
        let config = AppConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.trend_window, 30);
        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(config.api_key.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_and_key_fallback() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup(&[
                ("API_KEY", " "),
                ("GEMINI_API_KEY", "gemini-secret"),
                ("EMOTUTOR_TICK_MS", "250"),
                ("EMOTUTOR_MODEL", "gemini-2.0-flash"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("gemini-secret"));
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.model, "gemini-2.0-flash");
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let mut config = AppConfig::default();
        assert!(config
            .apply_env(lookup(&[("EMOTUTOR_TICK_MS", "soon")]))
            .is_err());
    }

    #[test]
    fn small_history_shrinks_the_trend_window() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup(&[("EMOTUTOR_HISTORY", "20")]))
            .unwrap();
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.trend_window, 20);
        config.validate().unwrap();

        let mut config = AppConfig::default();
        config
            .apply_env(lookup(&[("EMOTUTOR_HISTORY", "20"), ("EMOTUTOR_TREND", "12")]))
            .unwrap();
        assert_eq!(config.trend_window, 12);
        config.validate().unwrap();

        let mut config = AppConfig::default();
        config
            .apply_env(lookup(&[("EMOTUTOR_HISTORY", "20"), ("EMOTUTOR_TREND", "25")]))
            .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_inconsistent_windows() {
        let mut config = AppConfig::default();
        config.trend_window = 60;
        assert!(config.validate().is_err());
        config.trend_window = 30;
        config.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tick_interval_ms": 500, "history_capacity": 80}}"#).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.tick_interval_ms, 500);
        assert_eq!(config.history_capacity, 80);
        assert_eq!(config.trend_window, 30);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn serialized_config_omits_the_key() {
        let config = AppConfig {
            api_key: Some("secret".into()),
            ..AppConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
