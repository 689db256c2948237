//! Configuration types for Holocron components.
//!
//! Nothing here reads the environment. The CLI resolves flags, environment
//! variables and the mirrors file into these values and passes them down.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

/// Public SWAPI endpoint used when no base URL or mirror is given.
pub const DEFAULT_BASE_URL: &str = "https://swapi.dev/api";

/// Database connection pool configuration.
pub struct DbConfig {
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { max_connections: 5 }
    }
}

/// HTTP client and retry configuration for collection fetches.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    /// Total attempts per collection, first one included.
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub backoff_multiplier: f64,
}

impl HttpConfig {
    /// Delay to wait after failed attempt number `attempt` (1-based):
    /// `retry_base_delay * backoff_multiplier^attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        self.retry_base_delay.mul_f64(factor)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            backoff_multiplier: 1.5,
        }
    }
}

/// Everything one sync run needs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub base_url: String,
    pub verify_tls: bool,
    /// Keep only the first N character records.
    pub people_limit: Option<usize>,
    pub http: HttpConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            verify_tls: true,
            people_limit: None,
            http: HttpConfig::default(),
        }
    }
}

/// Named alternative endpoints, loaded from `mirrors.toml`.
///
/// ```toml
/// [[mirrors]]
/// name = "tech"
/// url = "https://swapi.tech/api"
///
/// [[mirrors]]
/// name = "local"
/// url = "https://localhost:8443/api"
/// verify_tls = false
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MirrorsConfig {
    #[serde(default)]
    pub mirrors: Vec<MirrorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MirrorEntry {
    pub name: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub verify_tls: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl MirrorsConfig {
    /// Case-insensitive lookup among enabled mirrors.
    pub fn find_by_name(&self, name: &str) -> Option<&MirrorEntry> {
        self.mirrors
            .iter()
            .find(|m| m.enabled && m.name.eq_ignore_ascii_case(name))
    }

    pub fn enabled_mirrors(&self) -> Vec<&MirrorEntry> {
        self.mirrors.iter().filter(|m| m.enabled).collect()
    }
}

/// Default location of the mirrors file: `<config dir>/holocron/mirrors.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("holocron").join("mirrors.toml"))
}

/// Loads the mirrors file.
///
/// An explicit `path` must exist. When no path is given and the default file is
/// absent, an empty configuration is returned.
pub fn load_mirrors_config(path: Option<&Path>) -> Result<MirrorsConfig, AppError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(MirrorsConfig::default()),
        },
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| AppError::ConfigError(format!("{}: {}", path.display(), e)))?;

    let config: MirrorsConfig = toml::from_str(&contents)
        .map_err(|e| AppError::ConfigError(format!("{}: {}", path.display(), e)))?;

    tracing::debug!(
        path = %path.display(),
        mirrors = config.mirrors.len(),
        "Loaded mirrors configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_db_config_defaults() {
        assert_eq!(DbConfig::default().max_connections, 5);
    }

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay, Duration::from_secs(1));
        assert_eq!(config.backoff_multiplier, 1.5);
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let config = HttpConfig::default();
        assert_eq!(config.backoff_delay(1), Duration::from_millis(1500));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(2250));
    }

    #[test]
    fn test_sync_config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.verify_tls);
        assert!(config.people_limit.is_none());
    }

    #[test]
    fn test_load_mirrors_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[mirrors]]
name = "Tech"
url = "https://swapi.tech/api"

[[mirrors]]
name = "lab"
url = "https://lab.local/api"
verify_tls = false

[[mirrors]]
name = "old"
url = "https://old.example/api"
enabled = false
"#
        )
        .unwrap();

        let config = load_mirrors_config(Some(file.path())).unwrap();
        assert_eq!(config.mirrors.len(), 3);
        assert_eq!(config.enabled_mirrors().len(), 2);

        let tech = config.find_by_name("tech").unwrap();
        assert!(tech.verify_tls);
        assert!(!config.find_by_name("lab").unwrap().verify_tls);
        assert!(config.find_by_name("old").is_none());
    }

    #[test]
    fn test_load_mirrors_config_missing_explicit_path() {
        let result = load_mirrors_config(Some(Path::new("/nonexistent/mirrors.toml")));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_load_mirrors_config_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[mirrors]]\nname = ").unwrap();
        let result = load_mirrors_config(Some(file.path()));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
