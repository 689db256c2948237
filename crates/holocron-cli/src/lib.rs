//! Holocron CLI - Command-line interface for the Holocron catalog mirror
//!
//! This crate wires the HTTP fetcher and the SQLite store together.

pub mod config;

use std::path::PathBuf;

use holocron_client::SwapiClient;
use holocron_core::config::{MirrorsConfig, SyncConfig, DEFAULT_BASE_URL};
use holocron_core::error::AppError;
use holocron_core::sync::SyncReport;
use holocron_db::SyncCoordinator;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

pub use config::{Command, Config};

/// `EX_TEMPFAIL` from sysexits.h.
pub const EXIT_TEMPFAIL: u8 = 75;

/// Runs one sync against the endpoint described by `config`.
///
/// The store is either fully updated or untouched when this returns.
pub async fn sync_catalog(
    pool: &SqlitePool,
    config: &SyncConfig,
    cancel: &CancellationToken,
) -> Result<SyncReport, AppError> {
    let client = SwapiClient::new(config)?;
    let report = SyncCoordinator::new(pool.clone(), client)
        .run(config, cancel)
        .await?;
    Ok(report)
}

/// Sync flags as given on the command line.
#[derive(Debug, Default)]
pub struct SyncArgs {
    pub base: Option<String>,
    pub mirror: Option<String>,
    pub insecure: bool,
    pub limit_people: Option<u64>,
}

/// Builds the run configuration: a named mirror wins over `--base`, which wins
/// over the public default. `--insecure` always disables verification.
pub fn resolve_sync_config(
    args: &SyncArgs,
    mirrors: &MirrorsConfig,
) -> Result<SyncConfig, AppError> {
    let (base_url, verify_tls) = match &args.mirror {
        Some(name) => {
            let mirror = mirrors.find_by_name(name).ok_or_else(|| {
                AppError::ConfigError(format!("mirror '{}' not found or disabled", name))
            })?;
            (mirror.url.clone(), mirror.verify_tls)
        }
        None => (
            args.base
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            true,
        ),
    };

    Ok(SyncConfig {
        base_url,
        verify_tls: verify_tls && !args.insecure,
        people_limit: args.limit_people.map(|n| n as usize),
        ..SyncConfig::default()
    })
}

/// Exit status for a failed sync. Transient network failures map to
/// [`EXIT_TEMPFAIL`] so schedulers can tell them from configuration or store
/// problems; everything else is 1.
pub fn failure_exit_status(err: &AppError) -> u8 {
    if err.is_retryable() {
        EXIT_TEMPFAIL
    } else {
        1
    }
}

/// Path of the default database file: `<data dir>/holocron/holocron.db`.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("holocron"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("holocron.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use holocron_core::config::MirrorEntry;

    fn mirrors() -> MirrorsConfig {
        MirrorsConfig {
            mirrors: vec![MirrorEntry {
                name: "lab".to_string(),
                url: "https://lab.local/api".to_string(),
                verify_tls: false,
                enabled: true,
                description: None,
            }],
        }
    }

    #[test]
    fn test_default_endpoint() {
        let config =
            resolve_sync_config(&SyncArgs::default(), &MirrorsConfig::default()).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.verify_tls);
        assert!(config.people_limit.is_none());
    }

    #[test]
    fn test_base_and_insecure() {
        let args = SyncArgs {
            base: Some("https://swapi.py4e.com/api".to_string()),
            insecure: true,
            limit_people: Some(5),
            ..Default::default()
        };
        let config = resolve_sync_config(&args, &MirrorsConfig::default()).unwrap();
        assert_eq!(config.base_url, "https://swapi.py4e.com/api");
        assert!(!config.verify_tls);
        assert_eq!(config.people_limit, Some(5));
    }

    #[test]
    fn test_mirror_overrides_base() {
        let args = SyncArgs {
            base: Some("https://ignored.example/api".to_string()),
            mirror: Some("LAB".to_string()),
            ..Default::default()
        };
        let config = resolve_sync_config(&args, &mirrors()).unwrap();
        assert_eq!(config.base_url, "https://lab.local/api");
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_unknown_mirror() {
        let args = SyncArgs {
            mirror: Some("nope".to_string()),
            ..Default::default()
        };
        let result = resolve_sync_config(&args, &mirrors());
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_failure_exit_status() {
        use holocron_core::{FetchError, SyncError, SyncStage};

        let outage = AppError::Sync(SyncError::from_fetch(
            SyncStage::Characters,
            FetchError::Network {
                collection: "people".to_string(),
                attempts: 3,
                message: "HTTP 502".to_string(),
            },
        ));
        assert_eq!(failure_exit_status(&outage), EXIT_TEMPFAIL);

        let tls = AppError::Sync(SyncError::from_fetch(
            SyncStage::Bodies,
            FetchError::Tls {
                collection: "planets".to_string(),
                attempts: 3,
                message: "certificate verify failed".to_string(),
            },
        ));
        assert_eq!(failure_exit_status(&tls), 1);

        let config = AppError::ConfigError("bad mirror".to_string());
        assert_eq!(failure_exit_status(&config), 1);
    }

    #[test]
    fn test_default_database_path() {
        assert!(default_database_path().ends_with("holocron.db"));
    }
}
