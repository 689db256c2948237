//! Holocron Client - HTTP access to SWAPI-compatible catalogs
//!
//! - [`swapi`] - paginated collection fetcher with whole-collection retry
//!
//! The fetcher implements [`holocron_core::CollectionSource`], which is what the
//! sync coordinator consumes.

pub mod swapi;

pub use swapi::SwapiClient;
