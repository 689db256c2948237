//! Read access to the synced catalog.
//!
//! Writes only happen through [`crate::upsert`] inside a sync run; this
//! repository is what the CLI, tests and any API layer query.

use holocron_core::error::AppError;
use holocron_core::models::{CatalogStats, CelestialBody, Character, Production};
use sqlx::SqlitePool;

/// Column list for production SELECTs. Must remain a const literal since it
/// is spliced in with format!().
const PRODUCTION_COLUMNS: &str = "id, title, synopsis, director, producers, release_date";

/// Repository over the local SQLite mirror.
///
/// # Examples
///
/// ```no_run
/// use holocron_core::DbConfig;
/// use holocron_db::CatalogRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = holocron_db::connect("sqlite://holocron.db", &DbConfig::default()).await?;
/// let repo = CatalogRepository::new(pool);
/// let stats = repo.get_stats().await?;
/// println!("{} productions", stats.productions);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new repository over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All celestial bodies in insertion order.
    pub async fn list_bodies(&self) -> Result<Vec<CelestialBody>, AppError> {
        let rows = sqlx::query_as::<_, CelestialBody>(
            "SELECT id, name FROM celestial_bodies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_productions(&self) -> Result<Vec<Production>, AppError> {
        let query = format!("SELECT {} FROM productions ORDER BY id", PRODUCTION_COLUMNS);
        let rows = sqlx::query_as::<_, Production>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_characters(&self) -> Result<Vec<Character>, AppError> {
        let rows = sqlx::query_as::<_, Character>("SELECT id, name FROM characters ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// First production carrying `title`, if any.
    pub async fn find_production(&self, title: &str) -> Result<Option<Production>, AppError> {
        let query = format!(
            "SELECT {} FROM productions WHERE title = ?1 ORDER BY id LIMIT 1",
            PRODUCTION_COLUMNS
        );
        let row = sqlx::query_as::<_, Production>(&query)
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Names of the bodies linked to a production, sorted.
    pub async fn body_names_for_production(
        &self,
        production_id: i64,
    ) -> Result<Vec<String>, AppError> {
        let names = sqlx::query_scalar(
            r#"
            SELECT b.name
            FROM production_bodies pb
            JOIN celestial_bodies b ON b.id = pb.body_id
            WHERE pb.production_id = ?1
            ORDER BY b.name
            "#,
        )
        .bind(production_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Titles of the productions a character appears in, sorted.
    pub async fn production_titles_for_character(
        &self,
        character_id: i64,
    ) -> Result<Vec<String>, AppError> {
        let titles = sqlx::query_scalar(
            r#"
            SELECT p.title
            FROM character_productions cp
            JOIN productions p ON p.id = cp.production_id
            WHERE cp.character_id = ?1
            ORDER BY p.title
            "#,
        )
        .bind(character_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(titles)
    }

    /// Returns row and edge counts of the store.
    ///
    /// # Returns
    ///
    /// A [`CatalogStats`] with one count per entity table and per join table.
    ///
    /// # Errors
    ///
    /// Returns `AppError::DatabaseError` if the query fails.
    pub async fn get_stats(&self) -> Result<CatalogStats, AppError> {
        let row: StatsRow = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM celestial_bodies) AS bodies,
                (SELECT COUNT(*) FROM productions) AS productions,
                (SELECT COUNT(*) FROM characters) AS characters,
                (SELECT COUNT(*) FROM production_bodies) AS production_bodies,
                (SELECT COUNT(*) FROM character_productions) AS character_productions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CatalogStats {
            bodies: row.bodies,
            productions: row.productions,
            characters: row.characters,
            production_bodies: row.production_bodies,
            character_productions: row.character_productions,
        })
    }
}

/// Helper struct for deserializing stats query results
#[derive(sqlx::FromRow)]
struct StatsRow {
    bodies: i64,
    productions: i64,
    characters: i64,
    production_bodies: i64,
    character_productions: i64,
}
