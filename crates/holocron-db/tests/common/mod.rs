//! Shared fixtures for store-level tests.

#![allow(dead_code)]

use std::collections::HashMap;

use holocron_core::{Collection, CollectionSource, FetchError, SyncConfig};
use holocron_db::CatalogRepository;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

/// In-memory catalog standing in for the remote API.
#[derive(Default, Clone)]
pub struct FakeSource {
    data: HashMap<Collection, Vec<Value>>,
    failures: HashMap<Collection, FetchError>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, collection: Collection, records: Vec<Value>) -> Self {
        self.data.insert(collection, records);
        self
    }

    pub fn failing(mut self, collection: Collection, error: FetchError) -> Self {
        self.failures.insert(collection, error);
        self
    }
}

impl CollectionSource for FakeSource {
    async fn fetch_collection<T>(
        &self,
        collection: Collection,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, FetchError>
    where
        T: DeserializeOwned + Send,
    {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                collection: collection.to_string(),
            });
        }
        if let Some(err) = self.failures.get(&collection) {
            return Err(err.clone());
        }

        self.data
            .get(&collection)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|v| {
                serde_json::from_value(v).map_err(|e| FetchError::Network {
                    collection: collection.to_string(),
                    attempts: 1,
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

pub fn planet_url(id: u32) -> String {
    format!("https://swapi.dev/api/planets/{}/", id)
}

pub fn film_url(id: u32) -> String {
    format!("https://swapi.dev/api/films/{}/", id)
}

pub fn planet(id: u32, name: &str) -> Value {
    json!({ "name": name, "url": planet_url(id) })
}

pub fn film(id: u32, title: &str, planets: &[u32]) -> Value {
    json!({
        "title": title,
        "opening_crawl": format!("{} opening crawl", title),
        "director": "George Lucas",
        "producer": "Gary Kurtz, Rick McCallum",
        "release_date": "1977-05-25",
        "planets": planets.iter().map(|p| planet_url(*p)).collect::<Vec<_>>(),
        "url": film_url(id),
    })
}

pub fn person(id: u32, name: &str, films: &[u32]) -> Value {
    json!({
        "name": name,
        "films": films.iter().map(|f| film_url(*f)).collect::<Vec<_>>(),
        "url": format!("https://swapi.dev/api/people/{}/", id),
    })
}

/// Three planets, two films, three people, fully cross-referenced.
pub fn small_catalog() -> FakeSource {
    FakeSource::new()
        .with(
            Collection::Planets,
            vec![
                planet(1, "Tatooine"),
                planet(2, "Alderaan"),
                planet(3, "Yavin IV"),
            ],
        )
        .with(
            Collection::Films,
            vec![
                film(1, "A New Hope", &[1, 2, 3]),
                film(2, "The Empire Strikes Back", &[1]),
            ],
        )
        .with(
            Collection::People,
            vec![
                person(1, "Luke Skywalker", &[1, 2]),
                person(2, "C-3PO", &[1, 2]),
                person(3, "Leia Organa", &[1]),
            ],
        )
}

pub fn config() -> SyncConfig {
    SyncConfig::default()
}

/// Full observable content of the store, for before/after comparisons.
#[derive(Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub bodies: Vec<String>,
    pub productions: Vec<(String, String, String, String, Option<chrono::NaiveDate>, Vec<String>)>,
    pub characters: Vec<(String, Vec<String>)>,
}

pub async fn snapshot(repo: &CatalogRepository) -> Snapshot {
    let bodies = repo
        .list_bodies()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();

    let mut productions = Vec::new();
    for p in repo.list_productions().await.unwrap() {
        let links = repo.body_names_for_production(p.id).await.unwrap();
        productions.push((p.title, p.synopsis, p.director, p.producers, p.release_date, links));
    }

    let mut characters = Vec::new();
    for c in repo.list_characters().await.unwrap() {
        let links = repo.production_titles_for_character(c.id).await.unwrap();
        characters.push((c.name, links));
    }

    Snapshot {
        bodies,
        productions,
        characters,
    }
}
