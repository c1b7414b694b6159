//! Configuration handling for the screener.
//!
//! Settings come from an optional JSON file named by `SCREEN_CONFIG`; a few
//! frequently tuned values can be overridden with individual environment
//! variables. Anything not given falls back to the built-in defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::classifier::ClassifierConfig;
use crate::fetcher::FetcherConfig;
use crate::pipeline::PipelineConfig;

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "SCREEN_CONFIG";
pub const ENV_CONCURRENCY: &str = "SCREEN_CONCURRENCY";
pub const ENV_MAX_RETRIES: &str = "SCREEN_MAX_RETRIES";
pub const ENV_TIMEOUT_MS: &str = "SCREEN_TIMEOUT_MS";
pub const ENV_MIN_INTERVAL_MS: &str = "SCREEN_MIN_INTERVAL_MS";
pub const ENV_JITTER_MS: &str = "SCREEN_JITTER_MS";
pub const ENV_VIDEO_LIMIT: &str = "SCREEN_VIDEO_LIMIT";
pub const ENV_BASE_URL: &str = "SCREEN_BASE_URL";

/// Everything the settings file may contain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fetcher: FetcherConfig,
    pub classifier: ClassifierConfig,
    pub pipeline: PipelineConfig,
}

/// Application runtime configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    settings: Settings,
    source: Option<PathBuf>,
}

impl Config {
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        validate(&settings)?;
        Ok(Self {
            settings,
            source: None,
        })
    }

    /// Load the settings file (if any), apply env overrides, validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        let source = env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
        let mut settings = match &source {
            Some(path) => load_file(path)?,
            None => Settings::default(),
        };
        apply_overrides(&mut settings)?;
        validate(&settings)?;
        Ok(Self { settings, source })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Settings file the config was read from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn load_file(path: &Path) -> Result<Settings, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_overrides(settings: &mut Settings) -> Result<(), ConfigError> {
    let fetcher = &mut settings.fetcher;
    if let Some(v) = env_parse(ENV_CONCURRENCY)? {
        fetcher.concurrency = v;
    }
    if let Some(v) = env_parse(ENV_MAX_RETRIES)? {
        fetcher.max_retries = v;
    }
    if let Some(v) = env_parse(ENV_TIMEOUT_MS)? {
        fetcher.timeout_ms = v;
    }
    if let Some(v) = env_parse(ENV_MIN_INTERVAL_MS)? {
        fetcher.pacing.min_interval_ms = v;
    }
    if let Some(v) = env_parse(ENV_JITTER_MS)? {
        fetcher.pacing.jitter_ms = v;
    }
    if let Some(v) = env_parse(ENV_VIDEO_LIMIT)? {
        settings.pipeline.video_limit = v;
    }
    if let Ok(v) = env::var(ENV_BASE_URL) {
        settings.pipeline.base_url = v;
    }
    Ok(())
}

fn env_parse<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                field: key,
                reason: format!("'{raw}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let fetcher = &settings.fetcher;
    if fetcher.concurrency == 0 {
        return Err(invalid("fetcher.concurrency", "must be at least 1"));
    }
    if fetcher.timeout_ms == 0 {
        return Err(invalid("fetcher.timeout_ms", "must be positive"));
    }
    if fetcher.backoff_base_ms > fetcher.backoff_cap_ms {
        return Err(invalid(
            "fetcher.backoff_base_ms",
            format!(
                "{} exceeds backoff_cap_ms {}",
                fetcher.backoff_base_ms, fetcher.backoff_cap_ms
            ),
        ));
    }
    if fetcher.block_scan_bytes == 0 {
        return Err(invalid("fetcher.block_scan_bytes", "must be positive"));
    }
    if let Some(marker) = fetcher
        .block_markers
        .iter()
        .find(|m| m.url_patterns.is_empty() && m.body_patterns.is_empty())
    {
        return Err(invalid(
            "fetcher.block_markers",
            format!("marker '{}' has no patterns", marker.key),
        ));
    }

    settings
        .classifier
        .validate()
        .map_err(|e| invalid(e.field, e.reason))?;

    url::Url::parse(&settings.pipeline.base_url)
        .map_err(|e| invalid("pipeline.base_url", e.to_string()))?;
    Ok(())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Stage;
    use std::io::Write;
    use std::sync::Mutex;

    // Ensure environment-variable manipulating tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            ENV_CONFIG_PATH,
            ENV_CONCURRENCY,
            ENV_MAX_RETRIES,
            ENV_TIMEOUT_MS,
            ENV_MIN_INTERVAL_MS,
            ENV_JITTER_MS,
            ENV_VIDEO_LIMIT,
            ENV_BASE_URL,
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    fn settings_file(contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("screen-settings-{}.json", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_when_env_missing() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.settings(), &Settings::default());
        assert_eq!(cfg.source(), None);
    }

    #[test]
    fn overrides_when_env_present() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        unsafe {
            env::set_var(ENV_CONCURRENCY, "4");
            env::set_var(ENV_MAX_RETRIES, " 1 ");
            env::set_var(ENV_MIN_INTERVAL_MS, "0");
            env::set_var(ENV_VIDEO_LIMIT, "5");
            env::set_var(ENV_BASE_URL, "http://127.0.0.1:9000");
        }
        let settings = Config::from_env().unwrap().into_settings();
        clear_env();

        assert_eq!(settings.fetcher.concurrency, 4);
        assert_eq!(settings.fetcher.max_retries, 1);
        assert_eq!(settings.fetcher.pacing.min_interval_ms, 0);
        assert_eq!(settings.pipeline.video_limit, 5);
        assert_eq!(settings.pipeline.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn unparsable_override_names_the_variable() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        unsafe {
            env::set_var(ENV_TIMEOUT_MS, "soon");
        }
        let err = Config::from_env().unwrap_err();
        clear_env();
        assert!(matches!(err, ConfigError::InvalidValue { field: ENV_TIMEOUT_MS, .. }));
    }

    #[test]
    fn file_settings_merge_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        let path = settings_file(
            r#"{
                "fetcher": {"concurrency": 3},
                "classifier": {"stage_order": ["topic"]},
                "pipeline": {"fetch_videos": false}
            }"#,
        );
        unsafe {
            env::set_var(ENV_CONFIG_PATH, &path);
            env::set_var(ENV_CONCURRENCY, "1");
        }
        let cfg = Config::from_env().unwrap();
        clear_env();
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.source(), Some(path.as_path()));
        let settings = cfg.settings();
        assert_eq!(settings.fetcher.concurrency, 1);
        assert_eq!(settings.fetcher.max_retries, FetcherConfig::default().max_retries);
        assert_eq!(settings.classifier.stage_order, vec![Stage::Topic]);
        assert!(!settings.pipeline.fetch_videos);
    }

    #[test]
    fn broken_file_is_reported() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        let path = settings_file("{ not json");
        unsafe {
            env::set_var(ENV_CONFIG_PATH, &path);
        }
        let err = Config::from_env().unwrap_err();
        clear_env();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let missing = env::temp_dir().join("screen-settings-does-not-exist.json");
        unsafe {
            env::set_var(ENV_CONFIG_PATH, &missing);
        }
        let err = Config::from_env().unwrap_err();
        clear_env();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut settings = Settings::default();
        settings.fetcher.backoff_base_ms = 10_000;
        settings.fetcher.backoff_cap_ms = 10;
        assert!(matches!(
            Config::new(settings),
            Err(ConfigError::InvalidValue { field: "fetcher.backoff_base_ms", .. })
        ));

        let mut settings = Settings::default();
        settings.pipeline.base_url = "not a url".to_string();
        assert!(Config::new(settings).is_err());

        let mut settings = Settings::default();
        settings.classifier.stage_order = vec![Stage::Topic, Stage::Topic];
        assert!(matches!(
            Config::new(settings),
            Err(ConfigError::InvalidValue { field: "stage_order", .. })
        ));
    }
}
