//! Upsert engine: writes fetched records into the store.
//!
//! Every function takes a bare connection so the coordinator can run the whole
//! sync inside one transaction. Nothing here commits.

use holocron_core::models::{BodyRecord, CharacterRecord, NewProduction, ProductionRecord};
use holocron_core::sync::{SyncStats, UpsertOutcome};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::resolver::ReferenceMap;

/// Rows per bulk insert statement, well under SQLite's bind variable limit.
const EDGE_CHUNK: usize = 400;

/// A many-to-many relationship table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Production → CelestialBody ("filmed on").
    ProductionBodies,
    /// Character → Production ("appears in").
    CharacterProductions,
}

impl Relation {
    /// `(table, owner column, target column)`. Literals only; these are
    /// interpolated into SQL.
    fn schema(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            Relation::ProductionBodies => ("production_bodies", "production_id", "body_id"),
            Relation::CharacterProductions => {
                ("character_productions", "character_id", "production_id")
            }
        }
    }
}

/// What one stage of the pipeline produced.
#[derive(Debug, Default)]
pub struct StageResult {
    pub stats: SyncStats,
    /// Map for the next stage to resolve against. Empty for characters.
    pub references: ReferenceMap,
    pub dangling: usize,
}

/// Find-or-create a celestial body by exact, case-sensitive name.
///
/// Bodies carry no other scalars, so an existing row is left as is.
///
/// # Returns
///
/// `Created(id)` for a new row, `Updated(id)` when `name` was already stored.
///
/// # Errors
///
/// Returns the underlying `sqlx::Error` if either statement fails.
pub async fn upsert_body(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<UpsertOutcome, sqlx::Error> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM celestial_bodies WHERE name = ?1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

    if let Some(id) = existing {
        return Ok(UpsertOutcome::Updated(id));
    }

    let result = sqlx::query("INSERT INTO celestial_bodies (name) VALUES (?1)")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    Ok(UpsertOutcome::Created(result.last_insert_rowid()))
}

/// Find-or-create a production by title, then overwrite every scalar field.
///
/// Titles are not unique; when several rows share one, the oldest is used.
/// Overwriting is unconditional, so local edits to synopsis, director,
/// producers or release date do not survive a sync.
///
/// # Arguments
///
/// * `conn` - Connection of the enclosing run transaction.
/// * `production` - Already normalized field values.
///
/// # Errors
///
/// Returns the underlying `sqlx::Error` if the lookup, update or insert fails.
pub async fn upsert_production(
    conn: &mut SqliteConnection,
    production: &NewProduction,
) -> Result<UpsertOutcome, sqlx::Error> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM productions WHERE title = ?1 ORDER BY id LIMIT 1",
    )
    .bind(&production.title)
    .fetch_optional(&mut *conn)
    .await?;

    match existing {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE productions
                SET synopsis = ?1,
                    director = ?2,
                    producers = ?3,
                    release_date = ?4
                WHERE id = ?5
                "#,
            )
            .bind(&production.synopsis)
            .bind(&production.director)
            .bind(&production.producers)
            .bind(production.release_date)
            .bind(id)
            .execute(&mut *conn)
            .await?;

            Ok(UpsertOutcome::Updated(id))
        }
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO productions (title, synopsis, director, producers, release_date)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&production.title)
            .bind(&production.synopsis)
            .bind(&production.director)
            .bind(&production.producers)
            .bind(production.release_date)
            .execute(&mut *conn)
            .await?;

            Ok(UpsertOutcome::Created(result.last_insert_rowid()))
        }
    }
}

/// Find-or-create a character by name. The oldest row wins on duplicates.
pub async fn upsert_character(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<UpsertOutcome, sqlx::Error> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM characters WHERE name = ?1 ORDER BY id LIMIT 1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

    if let Some(id) = existing {
        return Ok(UpsertOutcome::Updated(id));
    }

    let result = sqlx::query("INSERT INTO characters (name) VALUES (?1)")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    Ok(UpsertOutcome::Created(result.last_insert_rowid()))
}

/// Replaces the owner's edge set with exactly `targets`: clear, then bulk insert.
///
/// Running it twice with the same input leaves the same set. Duplicate targets
/// collapse into one edge. Inserts are issued in chunks of `EDGE_CHUNK` rows.
///
/// # Arguments
///
/// * `relation` - Which join table to rewrite.
/// * `owner_id` - Production id for `ProductionBodies`, character id for
///   `CharacterProductions`.
/// * `targets` - Ids on the other side. An empty slice clears the set.
///
/// # Errors
///
/// Returns the underlying `sqlx::Error`, e.g. a foreign key violation when a
/// target id does not exist. The caller's transaction is left to roll back.
pub async fn replace_relations(
    conn: &mut SqliteConnection,
    relation: Relation,
    owner_id: i64,
    targets: &[i64],
) -> Result<(), sqlx::Error> {
    let (table, owner_col, target_col) = relation.schema();

    sqlx::query(&format!("DELETE FROM {} WHERE {} = ?1", table, owner_col))
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

    for chunk in targets.chunks(EDGE_CHUNK) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "INSERT OR IGNORE INTO {} ({}, {}) ",
            table, owner_col, target_col
        ));
        builder.push_values(chunk, |mut row, target| {
            row.push_bind(owner_id).push_bind(*target);
        });
        builder.build().execute(&mut *conn).await?;
    }

    Ok(())
}

/// Upserts every body record and returns the URL map productions resolve against.
pub async fn apply_bodies(
    conn: &mut SqliteConnection,
    records: &[BodyRecord],
) -> Result<StageResult, sqlx::Error> {
    let mut stage = StageResult::default();
    let mut ids = Vec::with_capacity(records.len());

    for record in records {
        let outcome = upsert_body(conn, &record.normalized_name()).await?;
        stage.stats.record(outcome);
        ids.push(outcome.id());
    }

    stage.references =
        ReferenceMap::from_upserted(records.iter().map(|r| r.url.as_deref()).zip(ids));
    Ok(stage)
}

/// Upserts every production, replaces its body set, and returns the URL map
/// characters resolve against.
pub async fn apply_productions(
    conn: &mut SqliteConnection,
    records: &[ProductionRecord],
    bodies: &ReferenceMap,
) -> Result<StageResult, sqlx::Error> {
    let mut stage = StageResult::default();
    let mut ids = Vec::with_capacity(records.len());

    for record in records {
        let outcome = upsert_production(conn, &record.normalize()).await?;
        stage.stats.record(outcome);
        ids.push(outcome.id());

        let resolved = bodies.resolve(record.body_refs());
        stage.dangling += resolved.misses;
        replace_relations(conn, Relation::ProductionBodies, outcome.id(), &resolved.ids).await?;
    }

    stage.references =
        ReferenceMap::from_upserted(records.iter().map(|r| r.url.as_deref()).zip(ids));
    Ok(stage)
}

/// Upserts every character and replaces its production set.
pub async fn apply_characters(
    conn: &mut SqliteConnection,
    records: &[CharacterRecord],
    productions: &ReferenceMap,
) -> Result<StageResult, sqlx::Error> {
    let mut stage = StageResult::default();

    for record in records {
        let outcome = upsert_character(conn, &record.normalized_name()).await?;
        stage.stats.record(outcome);

        let resolved = productions.resolve(record.production_refs());
        stage.dangling += resolved.misses;
        replace_relations(
            conn,
            Relation::CharacterProductions,
            outcome.id(),
            &resolved.ids,
        )
        .await?;
    }

    Ok(stage)
}
