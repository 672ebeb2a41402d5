//! Shared configuration for the tally CLI.
//!
//! TOML profiles and global pipeline tuning, loaded through figment
//! (defaults → file → `TALLY_` environment) and translated into
//! `tally_core::AggregationConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tally_core::{AggregationConfig, RetryPolicy, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' is not defined")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Starter config written by `tally config init`.
    pub fn starter() -> Self {
        let mut config = Self::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                base_url: "http://localhost:8080/api".into(),
                ca_cert: None,
                insecure: None,
                timeout: None,
                page_size: None,
            },
        );
        config
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

/// Pipeline tuning shared by every profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Debounce window in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Request timeout in seconds. Unset = no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_page_size() -> usize {
    25
}
fn default_debounce_ms() -> u64 {
    150
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay_ms() -> u64 {
    1000
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// API root (e.g., "http://localhost:8080/api").
    pub base_url: String,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override the request timeout (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override the initial page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

impl Profile {
    /// Ad-hoc profile for a bare base URL (no config file entry).
    pub fn from_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ca_cert: None,
            insecure: None,
            timeout: None,
            page_size: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "tally", "tally").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tally");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, still layered under `TALLY_` env vars.
///
/// Nested keys use a double underscore: `TALLY_DEFAULTS__PAGE_SIZE=50`.
/// A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TALLY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build an `AggregationConfig` from a profile plus global defaults.
pub fn profile_to_aggregation_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<AggregationConfig, ConfigError> {
    let url: url::Url = profile
        .base_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {}", profile.base_url),
        })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    let page_size = profile.page_size.unwrap_or(defaults.page_size);
    if page_size == 0 {
        return Err(ConfigError::Validation {
            field: "page_size".into(),
            reason: "must be at least 1".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(AggregationConfig {
        base_url: profile.base_url.clone(),
        tls,
        timeout: profile
            .timeout
            .or(defaults.timeout)
            .map(Duration::from_secs),
        page_size,
        debounce: Duration::from_millis(defaults.debounce_ms),
        cache_ttl: Duration::from_secs(defaults.cache_ttl_secs),
        retry: RetryPolicy {
            max_retries: defaults.retries,
            delay: Duration::from_millis(defaults.retry_delay_ms),
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_core_defaults() {
        let cfg = profile_to_aggregation_config(
            &Profile::from_base_url("http://localhost:8080/api"),
            &Defaults::default(),
        )
        .unwrap();
        let core = AggregationConfig::default();

        assert_eq!(cfg.page_size, core.page_size);
        assert_eq!(cfg.debounce, core.debounce);
        assert_eq!(cfg.cache_ttl, core.cache_ttl);
        assert_eq!(cfg.retry, core.retry);
        assert_eq!(cfg.timeout, None);
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn loads_profiles_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "staging"

[defaults]
debounce_ms = 300
retries = 0

[profiles.staging]
base_url = "https://staging.example.com/api"
ca_cert = "/etc/ssl/staging.pem"
page_size = 50
timeout = 10
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("staging"));
        assert_eq!(cfg.defaults.output, "table");

        let profile = cfg.profile("staging").unwrap();
        let agg = profile_to_aggregation_config(profile, &cfg.defaults).unwrap();
        assert_eq!(agg.page_size, 50);
        assert_eq!(agg.debounce, Duration::from_millis(300));
        assert_eq!(agg.retry.max_retries, 0);
        assert_eq!(agg.timeout, Some(Duration::from_secs(10)));
        assert_eq!(
            agg.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/ssl/staging.pem"))
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert!(cfg.profiles.is_empty());
        assert!(matches!(
            cfg.profile("default"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let profile = Profile {
            insecure: Some(true),
            ca_cert: Some("/tmp/ca.pem".into()),
            ..Profile::from_base_url("https://localhost/api")
        };
        let agg = profile_to_aggregation_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(agg.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn rejects_bad_urls_and_zero_page_size() {
        let defaults = Defaults::default();
        for url in ["not a url", "ftp://example.com/api"] {
            let err = profile_to_aggregation_config(&Profile::from_base_url(url), &defaults)
                .unwrap_err();
            assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "base_url"));
        }

        let profile = Profile {
            page_size: Some(0),
            ..Profile::from_base_url("http://localhost/api")
        };
        let err = profile_to_aggregation_config(&profile, &defaults).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "page_size"));
    }

    #[test]
    fn starter_config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        save_config_to(&Config::starter(), &path).unwrap();

        let cfg = load_config_from(&path).unwrap();
        let profile = cfg.profile("default").unwrap();
        assert_eq!(profile.base_url, "http://localhost:8080/api");
        assert_eq!(cfg.defaults.page_size, 25);
    }
}
