//! Sync coordinator: one atomic run of fetch → resolve → upsert.
//!
//! Stage order is fixed because each stage resolves references against rows
//! the previous stage wrote:
//!
//! 1. planets → `celestial_bodies`
//! 2. films → `productions` (+ `production_bodies`, resolved against 1)
//! 3. people → `characters` (+ `character_productions`, resolved against 2)
//!
//! Everything runs inside a single transaction. Any error, including
//! cancellation, rolls it back and leaves the store as it was.

use std::time::Instant;

use holocron_core::config::SyncConfig;
use holocron_core::error::{SyncError, SyncStage};
use holocron_core::models::{BodyRecord, CharacterRecord, Collection, ProductionRecord};
use holocron_core::source::CollectionSource;
use holocron_core::sync::SyncReport;
use serde::de::DeserializeOwned;
use sqlx::{SqliteConnection, SqlitePool};
use tokio_util::sync::CancellationToken;

use crate::upsert;

/// Runs sync passes from a [`CollectionSource`] into the store.
///
/// Callers must not run two passes against the same database at once.
pub struct SyncCoordinator<S> {
    pool: SqlitePool,
    source: S,
}

impl<S: CollectionSource> SyncCoordinator<S> {
    pub fn new(pool: SqlitePool, source: S) -> Self {
        Self { pool, source }
    }

    /// Executes one complete sync run and commits it, or rolls everything back.
    pub async fn run(
        &self,
        config: &SyncConfig,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        tracing::info!(
            base = %config.base_url,
            verify_tls = config.verify_tls,
            people_limit = ?config.people_limit,
            "Starting sync"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(SyncError::store(SyncStage::Begin))?;

        let outcome = match self.run_stages(&mut *tx, config, cancel).await {
            Ok(report) => checkpoint(cancel, SyncStage::Commit).map(|_| report),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(mut report) => {
                tx.commit()
                    .await
                    .map_err(SyncError::store(SyncStage::Commit))?;
                report.duration = started.elapsed();
                tracing::info!(
                    bodies = report.bodies.total(),
                    productions = report.productions.total(),
                    characters = report.characters.total(),
                    created = report.bodies.created
                        + report.productions.created
                        + report.characters.created,
                    dangling = report.dangling_references,
                    elapsed_ms = report.duration.as_millis() as u64,
                    "Sync committed"
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Explicit rollback failed");
                }
                tracing::error!(stage = %e.stage(), error = %e, "Sync failed, rolled back");
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        conn: &mut SqliteConnection,
        config: &SyncConfig,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new();

        let bodies: Vec<BodyRecord> = self
            .fetch(Collection::Planets, SyncStage::Bodies, cancel)
            .await?;
        checkpoint(cancel, SyncStage::Bodies)?;
        let body_stage = upsert::apply_bodies(conn, &bodies)
            .await
            .map_err(SyncError::store(SyncStage::Bodies))?;
        tracing::info!(
            records = bodies.len(),
            created = body_stage.stats.created,
            "Upserted celestial bodies"
        );
        report.bodies = body_stage.stats;

        let productions: Vec<ProductionRecord> = self
            .fetch(Collection::Films, SyncStage::Productions, cancel)
            .await?;
        checkpoint(cancel, SyncStage::Productions)?;
        let production_stage =
            upsert::apply_productions(conn, &productions, &body_stage.references)
                .await
                .map_err(SyncError::store(SyncStage::Productions))?;
        tracing::info!(
            records = productions.len(),
            created = production_stage.stats.created,
            dangling = production_stage.dangling,
            "Upserted productions"
        );
        report.productions = production_stage.stats;
        report.dangling_references += production_stage.dangling;

        let mut characters: Vec<CharacterRecord> = self
            .fetch(Collection::People, SyncStage::Characters, cancel)
            .await?;
        if let Some(limit) = config.people_limit {
            if characters.len() > limit {
                tracing::info!(
                    fetched = characters.len(),
                    limit,
                    "Truncating character records"
                );
                characters.truncate(limit);
            }
        }
        checkpoint(cancel, SyncStage::Characters)?;
        let character_stage =
            upsert::apply_characters(conn, &characters, &production_stage.references)
                .await
                .map_err(SyncError::store(SyncStage::Characters))?;
        tracing::info!(
            records = characters.len(),
            created = character_stage.stats.created,
            dangling = character_stage.dangling,
            "Upserted characters"
        );
        report.characters = character_stage.stats;
        report.dangling_references += character_stage.dangling;

        Ok(report)
    }

    async fn fetch<T>(
        &self,
        collection: Collection,
        stage: SyncStage,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, SyncError>
    where
        T: DeserializeOwned + Send,
    {
        self.source
            .fetch_collection(collection, cancel)
            .await
            .map_err(|e| SyncError::from_fetch(stage, e))
    }
}

fn checkpoint(cancel: &CancellationToken, stage: SyncStage) -> Result<(), SyncError> {
    if cancel.is_cancelled() {
        Err(SyncError::Cancelled { stage })
    } else {
        Ok(())
    }
}
