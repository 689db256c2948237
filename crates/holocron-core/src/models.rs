//! Remote record shapes and local entity rows.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Placeholder for a missing or blank name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Placeholder for a missing or blank production title.
pub const UNTITLED: &str = "Untitled";

/// A paginated resource on the remote catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Planets,
    Films,
    People,
}

impl Collection {
    /// Path segment under the base URL.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Planets => "planets",
            Collection::Films => "films",
            Collection::People => "people",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record of the `planets` collection.
///
/// # Examples
///
/// ```
/// use holocron_core::models::BodyRecord;
///
/// let record: BodyRecord = serde_json::from_str(r#"{
///     "name": "  Tatooine ",
///     "climate": "arid",
///     "url": "https://swapi.dev/api/planets/1/"
/// }"#).unwrap();
///
/// assert_eq!(record.normalized_name(), "Tatooine");
/// ```
#[derive(Deserialize, Debug, Clone, Default)]
pub struct BodyRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl BodyRecord {
    pub fn normalized_name(&self) -> String {
        text_or(self.name.as_deref(), UNKNOWN_NAME)
    }
}

/// One record of the `films` collection.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProductionRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub opening_crawl: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    /// Already comma-joined by the remote.
    #[serde(default)]
    pub producer: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// External identifiers of the bodies featured in this production.
    #[serde(default)]
    pub planets: Option<Vec<String>>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ProductionRecord {
    /// Converts the raw record into the values written to the store.
    pub fn normalize(&self) -> NewProduction {
        NewProduction {
            title: text_or(self.title.as_deref(), UNTITLED),
            synopsis: self.opening_crawl.clone().unwrap_or_default(),
            director: self.director.clone().unwrap_or_default(),
            producers: self.producer.clone().unwrap_or_default(),
            release_date: parse_release_date(self.release_date.as_deref()),
        }
    }

    pub fn body_refs(&self) -> &[String] {
        self.planets.as_deref().unwrap_or_default()
    }
}

/// One record of the `people` collection.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CharacterRecord {
    #[serde(default)]
    pub name: Option<String>,
    /// External identifiers of the productions this character appears in.
    #[serde(default)]
    pub films: Option<Vec<String>>,
    #[serde(default)]
    pub url: Option<String>,
}

impl CharacterRecord {
    pub fn normalized_name(&self) -> String {
        text_or(self.name.as_deref(), UNKNOWN_NAME)
    }

    pub fn production_refs(&self) -> &[String] {
        self.films.as_deref().unwrap_or_default()
    }
}

/// Scalar fields of a production, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduction {
    pub title: String,
    pub synopsis: String,
    pub director: String,
    pub producers: String,
    pub release_date: Option<NaiveDate>,
}

/// Row of `celestial_bodies`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CelestialBody {
    pub id: i64,
    pub name: String,
}

/// Row of `productions`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Production {
    pub id: i64,
    pub title: String,
    pub synopsis: String,
    pub director: String,
    pub producers: String,
    pub release_date: Option<NaiveDate>,
}

impl Production {
    /// Producer names split out of the comma-joined column.
    pub fn producer_names(&self) -> Vec<&str> {
        self.producers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Row of `characters`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
}

/// Row and edge counts of the local store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub bodies: i64,
    pub productions: i64,
    pub characters: i64,
    pub production_bodies: i64,
    pub character_productions: i64,
}

fn text_or(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

/// Parses a `YYYY-MM-DD` date; blank or malformed input yields `None`.
pub fn parse_release_date(value: Option<&str>) -> Option<NaiveDate> {
    let raw = value.map(str::trim).filter(|s| !s.is_empty())?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!(value = raw, error = %e, "Ignoring unparsable release date");
            None
        }
    }
}
