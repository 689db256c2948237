use std::fmt;

use thiserror::Error;

/// Failure of a complete collection fetch, after the retry budget is spent.
///
/// The TLS/network split exists because the remediation differs: a certificate
/// problem is fixed by switching to another mirror or disabling verification,
/// a network problem by retrying later or checking connectivity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Certificate or TLS handshake verification failed.
    #[error("TLS error fetching '{collection}' after {attempts} attempt(s): {message}")]
    Tls {
        collection: String,
        attempts: u32,
        message: String,
    },

    /// Timeout, refused connection, non-2xx status or undecodable page.
    #[error("Network error fetching '{collection}' after {attempts} attempt(s): {message}")]
    Network {
        collection: String,
        attempts: u32,
        message: String,
    },

    /// The caller cancelled the fetch.
    #[error("Fetch of '{collection}' was cancelled")]
    Cancelled { collection: String },
}

impl FetchError {
    /// Name of the collection whose fetch failed.
    pub fn collection(&self) -> &str {
        match self {
            FetchError::Tls { collection, .. }
            | FetchError::Network { collection, .. }
            | FetchError::Cancelled { collection } => collection,
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self, FetchError::Tls { .. })
    }
}

/// Pipeline stage a sync run was in when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Begin,
    Bodies,
    Productions,
    Characters,
    Commit,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStage::Begin => "begin",
            SyncStage::Bodies => "celestial bodies",
            SyncStage::Productions => "productions",
            SyncStage::Characters => "characters",
            SyncStage::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a sync run. The store is left unchanged in every case.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sync failed while fetching {stage}: {source}")]
    Fetch {
        stage: SyncStage,
        #[source]
        source: FetchError,
    },

    #[error("Sync failed while writing {stage}: {source}")]
    Store {
        stage: SyncStage,
        #[source]
        source: sqlx::Error,
    },

    #[error("Sync cancelled during {stage}")]
    Cancelled { stage: SyncStage },
}

impl SyncError {
    pub fn stage(&self) -> SyncStage {
        match self {
            SyncError::Fetch { stage, .. }
            | SyncError::Store { stage, .. }
            | SyncError::Cancelled { stage } => *stage,
        }
    }

    /// Wraps a fetch failure, folding fetch-level cancellation into
    /// [`SyncError::Cancelled`].
    pub fn from_fetch(stage: SyncStage, source: FetchError) -> Self {
        match source {
            FetchError::Cancelled { .. } => SyncError::Cancelled { stage },
            source => SyncError::Fetch { stage, source },
        }
    }

    pub fn store(stage: SyncStage) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| SyncError::Store { stage, source }
    }
}

/// Application-wide error types.
///
/// Library crates return the narrower [`FetchError`] / [`SyncError`] where they
/// can; `AppError` is what the CLI and the setup paths (connecting, migrating,
/// loading configuration) deal in.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Applying the schema migrations failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// A collection could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A sync run failed and was rolled back.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// HTTP client could not be built.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("unable to open database file") {
                    "Cannot open the local database.\n   \
                     Check --database-url and that its directory is writable."
                        .to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::Fetch(e) => fetch_hint(e),
            AppError::Sync(SyncError::Fetch { stage, source }) => {
                format!(
                    "Sync aborted while fetching {}; local store unchanged.\n{}",
                    stage,
                    fetch_hint(source)
                )
            }
            AppError::Sync(SyncError::Store { stage, source }) => {
                format!(
                    "Sync aborted while writing {}; local store unchanged.\n   Database error: {}",
                    stage, source
                )
            }
            AppError::Sync(SyncError::Cancelled { stage }) => {
                format!("Sync cancelled during {}; local store unchanged.", stage)
            }
            AppError::InvalidUrl(url) => {
                format!("Invalid base URL: {}\n   Example: https://swapi.dev/api", url)
            }
            AppError::ConfigError(msg) => {
                format!("Configuration error: {}\n   Check your mirrors.toml.", msg)
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if running the same operation again may succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// use holocron_core::error::{AppError, FetchError};
    ///
    /// let err = AppError::Fetch(FetchError::Network {
    ///     collection: "films".to_string(),
    ///     attempts: 3,
    ///     message: "connection reset".to_string(),
    /// });
    /// assert!(err.is_retryable());
    ///
    /// let err = AppError::InvalidUrl("not a url".to_string());
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Fetch(FetchError::Network { .. })
                | AppError::Sync(SyncError::Fetch {
                    source: FetchError::Network { .. },
                    ..
                })
        )
    }
}

fn fetch_hint(e: &FetchError) -> String {
    match e {
        FetchError::Tls { .. } => format!(
            "{}\n   Try another mirror with --base/--mirror, \
             or pass --insecure if your network requires it.",
            e
        ),
        FetchError::Network { .. } => format!(
            "{}\n   Check your internet connection and the base URL, then try again.",
            e
        ),
        FetchError::Cancelled { .. } => e.to_string(),
    }
}
