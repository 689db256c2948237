//! Holocron Core - Domain types, error handling, and configuration.

pub mod config;
pub mod error;
pub mod models;
pub mod source;
pub mod sync;

pub use config::{
    default_config_path, load_mirrors_config, DbConfig, HttpConfig, MirrorEntry, MirrorsConfig,
    SyncConfig, DEFAULT_BASE_URL,
};
pub use error::{AppError, FetchError, SyncError, SyncStage};
pub use models::{
    BodyRecord, CatalogStats, CelestialBody, Character, CharacterRecord, Collection,
    NewProduction, Production, ProductionRecord,
};
pub use source::CollectionSource;
pub use sync::{SyncReport, SyncStats, UpsertOutcome};
