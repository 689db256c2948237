//! The seam between the sync coordinator and whatever produces records.

use std::future::Future;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::models::Collection;

/// Produces the complete, ordered record sequence of one collection.
///
/// Implementations own their retry policy: an `Err` is final for the run.
/// An empty collection is `Ok(vec![])`.
pub trait CollectionSource: Send + Sync {
    fn fetch_collection<T>(
        &self,
        collection: Collection,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<T>, FetchError>> + Send
    where
        T: DeserializeOwned + Send;
}
