use std::collections::HashSet;
use std::error::Error as StdError;

use holocron_core::config::{HttpConfig, SyncConfig};
use holocron_core::error::{AppError, FetchError};
use holocron_core::models::Collection;
use holocron_core::source::CollectionSource;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// One page of a SWAPI collection.
///
/// ```json
/// {
///     "count": 60,
///     "next": "https://swapi.dev/api/planets/?page=2",
///     "previous": null,
///     "results": [ ... ]
/// }
/// ```
#[derive(Deserialize, Debug)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

/// Pages followed in one walk before giving up. SWAPI's largest collection
/// spans fewer than ten.
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Why a single walk over a collection failed.
#[derive(Debug)]
enum WalkError {
    Http(reqwest::Error),
    /// A `next` pointer led back to a page already read.
    Cycle(String),
    /// A `next` pointer could not be resolved against the page it came from.
    BadLink { page: String, next: String },
    /// The walk read `max_pages` pages and was still being sent onward.
    TooManyPages(usize),
}

impl From<reqwest::Error> for WalkError {
    fn from(e: reqwest::Error) -> Self {
        WalkError::Http(e)
    }
}

impl WalkError {
    fn is_tls(&self) -> bool {
        match self {
            WalkError::Http(e) => is_tls_failure(e),
            _ => false,
        }
    }

    fn message(&self) -> String {
        match self {
            WalkError::Http(e) => error_chain(e),
            WalkError::Cycle(url) => format!("pagination cycle at {}", url),
            WalkError::BadLink { page, next } => {
                format!("invalid next link '{}' on page {}", next, page)
            }
            WalkError::TooManyPages(max) => {
                format!("collection spans more than {} pages", max)
            }
        }
    }
}

/// HTTP client for SWAPI-compatible catalogs.
///
/// # Examples
///
/// ```no_run
/// use holocron_client::SwapiClient;
/// use holocron_core::{BodyRecord, Collection, SyncConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SwapiClient::new(&SyncConfig::default())?;
/// let planets: Vec<BodyRecord> = client
///     .fetch_all(Collection::Planets, &CancellationToken::new())
///     .await?;
/// println!("Fetched {} planets", planets.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SwapiClient {
    client: Client,
    base_url: Url,
    http: HttpConfig,
    max_pages: usize,
}

impl SwapiClient {
    /// Creates a client from the endpoint, TLS and retry settings of a sync run.
    pub fn new(config: &SyncConfig) -> Result<Self, AppError> {
        Self::with_options(&config.base_url, config.verify_tls, config.http.clone())
    }

    /// Creates a client for an explicit endpoint.
    ///
    /// # Arguments
    ///
    /// * `base_url_str` - API root, e.g. `https://swapi.dev/api`. A trailing
    ///   slash is optional.
    /// * `verify_tls` - When false, invalid or self-signed certificates are accepted.
    /// * `http` - Request timeout and retry policy.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if `base_url_str` is not an absolute URL.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn with_options(
        base_url_str: &str,
        verify_tls: bool,
        http: HttpConfig,
    ) -> Result<Self, AppError> {
        let base_url =
            Url::parse(base_url_str).map_err(|_| AppError::InvalidUrl(base_url_str.to_string()))?;

        let client = Client::builder()
            .user_agent("Holocron/0.1 (catalog-sync)")
            .timeout(http.timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        if !verify_tls {
            tracing::warn!(base = %base_url, "TLS certificate verification disabled");
        }

        Ok(Self {
            client,
            base_url,
            http,
            max_pages: DEFAULT_MAX_PAGES,
        })
    }

    /// Caps the number of pages a single walk may follow.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// The API root this client was built with.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// First page of a collection: `{base}/{collection}/`.
    pub fn collection_url(&self, collection: Collection) -> Result<Url, AppError> {
        let raw = format!(
            "{}/{}/",
            self.base_url.as_str().trim_end_matches('/'),
            collection.as_str()
        );
        Url::parse(&raw).map_err(|_| AppError::InvalidUrl(raw))
    }

    /// Fetches every record of `collection`, retrying the whole walk on failure.
    ///
    /// A failed attempt `n` is followed by a sleep of
    /// `retry_base_delay * backoff_multiplier^n`, up to `max_retries` attempts.
    /// Any failure restarts the walk from the first page, so a returned
    /// sequence always comes from one uninterrupted walk.
    ///
    /// # Arguments
    ///
    /// * `collection` - Which collection to walk.
    /// * `cancel` - Checked while a walk is in flight and during backoff.
    ///
    /// # Returns
    ///
    /// Every record of the collection in page order. An empty collection
    /// yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Tls` if the last attempt failed during the TLS
    /// handshake or certificate verification.
    /// Returns `FetchError::Network` for any other exhausted failure, including
    /// non-2xx statuses and undecodable pages.
    /// Returns `FetchError::Cancelled` as soon as `cancel` fires.
    pub async fn fetch_all<T>(
        &self,
        collection: Collection,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, FetchError>
    where
        T: DeserializeOwned + Send,
    {
        let start = self
            .collection_url(collection)
            .map_err(|e| FetchError::Network {
                collection: collection.to_string(),
                attempts: 0,
                message: e.to_string(),
            })?;
        let max_attempts = self.http.max_retries.max(1);
        let mut attempt = 1;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(FetchError::Cancelled { collection: collection.to_string() });
                }
                outcome = self.walk_pages::<T>(start.clone()) => outcome,
            };

            let err = match outcome {
                Ok(records) => {
                    tracing::info!(
                        collection = %collection,
                        records = records.len(),
                        attempt,
                        "Fetched collection"
                    );
                    return Ok(records);
                }
                Err(e) => e,
            };

            if attempt >= max_attempts {
                let message = err.message();
                tracing::error!(
                    collection = %collection,
                    attempts = attempt,
                    error = %message,
                    "Giving up on collection"
                );
                return Err(if err.is_tls() {
                    FetchError::Tls {
                        collection: collection.to_string(),
                        attempts: attempt,
                        message,
                    }
                } else {
                    FetchError::Network {
                        collection: collection.to_string(),
                        attempts: attempt,
                        message,
                    }
                });
            }

            let delay = self.http.backoff_delay(attempt);
            tracing::warn!(
                collection = %collection,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                tls = err.is_tls(),
                error = %err.message(),
                "Collection fetch failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(FetchError::Cancelled { collection: collection.to_string() });
                }
                _ = sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    /// Follows `next` pointers from `start` until exhausted, in arrival order.
    ///
    /// Relative `next` links are resolved against the page that carried them.
    async fn walk_pages<T>(&self, start: Url) -> Result<Vec<T>, WalkError>
    where
        T: DeserializeOwned,
    {
        let mut results = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(start);

        while let Some(url) = next.take() {
            if !visited.insert(url.to_string()) {
                return Err(WalkError::Cycle(url.to_string()));
            }
            if visited.len() > self.max_pages {
                return Err(WalkError::TooManyPages(self.max_pages));
            }

            let page: Page<T> = self
                .client
                .get(url.clone())
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            tracing::debug!(url = %url, records = page.results.len(), "Fetched page");

            if let Some(link) = page.next.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
                let resolved = url.join(link).map_err(|_| WalkError::BadLink {
                    page: url.to_string(),
                    next: link.to_string(),
                })?;
                next = Some(resolved);
            }
            results.extend(page.results);
        }

        Ok(results)
    }
}

impl CollectionSource for SwapiClient {
    async fn fetch_collection<T>(
        &self,
        collection: Collection,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, FetchError>
    where
        T: DeserializeOwned + Send,
    {
        self.fetch_all(collection, cancel).await
    }
}

const TLS_MARKERS: [&str; 6] = [
    "certificate",
    "tls",
    "ssl",
    "x509",
    "handshake",
    "invalidcertificate",
];

/// True when a request failed during the TLS handshake or certificate check.
///
/// Only connect failures qualify; a status or decode error happened after a
/// completed handshake. reqwest has no dedicated predicate and the concrete
/// error type depends on the TLS backend, so the underlying causes are
/// inspected. The outer error is skipped because its message carries the
/// request URL, which may itself contain a marker.
pub fn is_tls_failure(err: &reqwest::Error) -> bool {
    err.is_connect() && causes_mention_tls(err.source())
}

fn causes_mention_tls(mut current: Option<&(dyn StdError + 'static)>) -> bool {
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if TLS_MARKERS.iter().any(|m| text.contains(m)) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Joins an error and its sources into one line.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        let text = e.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        current = e.source();
    }
    parts.join(": ")
}
