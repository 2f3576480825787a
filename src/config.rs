use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_REMOTE_URL: &str = "https://ncov.dxy.cn/ncovh5/view/pneumonia";
pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://api.map.baidu.com/geocoding/v3/";

/// Resolved runtime configuration, passed by reference into each component.
#[derive(Debug, Clone)]
pub struct Config {
    pub inventory_dir: PathBuf,
    pub geocode_cache: PathBuf,
    pub log_file: Option<PathBuf>,
    pub source: NetConfig,
    pub geocode: GeocodeConfig,
}

#[derive(Debug, Clone)]
pub struct NetConfig {
    pub url: String,
    pub timeout: Duration,
    pub retries: u32,
}

#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
    pub retries: u32,
}

// On-disk shape. Every field is optional so a partial file only overrides
// what it names.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    log_file: Option<PathBuf>,
    source: FileSource,
    inventory: FileInventory,
    geocode: FileGeocode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSource {
    url: Option<String>,
    timeout: Option<String>,
    retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileInventory {
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileGeocode {
    cache_file: Option<PathBuf>,
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout: Option<String>,
    retries: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Config {
            inventory_dir: data_dir.join("ncov_inventory"),
            geocode_cache: data_dir.join("mapper_server").join("memory.json"),
            log_file: None,
            source: NetConfig {
                url: DEFAULT_REMOTE_URL.to_string(),
                timeout: Duration::from_secs(15),
                retries: 1,
            },
            geocode: GeocodeConfig {
                endpoint: DEFAULT_GEOCODE_ENDPOINT.to_string(),
                api_key: String::new(),
                timeout: Duration::from_secs(10),
                retries: 1,
            },
        }
    }
}

impl Config {
    /// Platform config file location (~/.config/ncov/config.toml or equivalent)
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "ncov")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads `path` if given, else the platform default if it exists, else
    /// built-in defaults. An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Config::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Toml { source, .. } => ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: PathBuf::new(),
            source,
        })?;

        let mut config = Config::default();

        if let Some(log_file) = file.log_file {
            config.log_file = Some(log_file);
        }
        if let Some(dir) = file.inventory.dir {
            config.inventory_dir = dir;
        }

        if let Some(url) = file.source.url {
            config.source.url = url;
        }
        if let Some(t) = file.source.timeout {
            config.source.timeout = parse_duration("source.timeout", &t)?;
        }
        if let Some(r) = file.source.retries {
            config.source.retries = r;
        }

        if let Some(cache_file) = file.geocode.cache_file {
            config.geocode_cache = cache_file;
        }
        if let Some(endpoint) = file.geocode.endpoint {
            config.geocode.endpoint = endpoint;
        }
        if let Some(key) = file.geocode.api_key {
            config.geocode.api_key = key;
        }
        if let Some(t) = file.geocode.timeout {
            config.geocode.timeout = parse_duration("geocode.timeout", &t)?;
        }
        if let Some(r) = file.geocode.retries {
            config.geocode.retries = r;
        }

        Ok(config)
    }

    /// Creates the inventory directory and the geocode cache's parent.
    /// Called once by the entry point.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.inventory_dir)?;
        if let Some(parent) = self.geocode_cache.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "ncov")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value).map_err(|e| ConfigError::Duration {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.source.url, DEFAULT_REMOTE_URL);
        assert_eq!(config.source.timeout, Duration::from_secs(15));
        assert_eq!(config.source.retries, 1);
        assert!(config.geocode.api_key.is_empty());
    }

    #[test]
    fn partial_file_overrides_named_fields() {
        let config = Config::from_toml_str(
            r#"
            [source]
            timeout = "500ms"

            [inventory]
            dir = "/tmp/inv"

            [geocode]
            api_key = "abc"
            retries = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.source.timeout, Duration::from_millis(500));
        assert_eq!(config.source.url, DEFAULT_REMOTE_URL);
        assert_eq!(config.inventory_dir, PathBuf::from("/tmp/inv"));
        assert_eq!(config.geocode.api_key, "abc");
        assert_eq!(config.geocode.retries, 0);
        assert_eq!(config.geocode.timeout, Duration::from_secs(10));
    }

    #[test]
    fn bad_duration_is_reported() {
        let err = Config::from_toml_str("[source]\ntimeout = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Duration { field: "source.timeout", .. }));
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(Config::from_toml_str("[source]\nproxy = \"x\"").is_err());
    }

    #[test]
    fn ensure_dirs_creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            inventory_dir: tmp.path().join("inv"),
            geocode_cache: tmp.path().join("geo").join("memory.json"),
            ..Config::default()
        };
        config.ensure_dirs().unwrap();
        assert!(config.inventory_dir.is_dir());
        assert!(tmp.path().join("geo").is_dir());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(matches!(Config::load(Some(&missing)), Err(ConfigError::Io { .. })));
    }
}
