//! Direct tests of the upsert engine primitives.

use holocron_core::{NewProduction, UpsertOutcome};
use holocron_db::upsert::{self, Relation};
use holocron_db::CatalogRepository;

fn production(title: &str, director: &str) -> NewProduction {
    NewProduction {
        title: title.to_string(),
        synopsis: String::new(),
        director: director.to_string(),
        producers: String::new(),
        release_date: None,
    }
}

#[tokio::test]
async fn test_body_upsert_is_keyed_by_exact_name() {
    let pool = holocron_db::connect_in_memory().await.unwrap();
    let mut conn = pool.acquire().await.unwrap();

    let first = upsert::upsert_body(&mut conn, "Tatooine").await.unwrap();
    let again = upsert::upsert_body(&mut conn, "Tatooine").await.unwrap();
    let other_case = upsert::upsert_body(&mut conn, "tatooine").await.unwrap();

    assert!(matches!(first, UpsertOutcome::Created(_)));
    assert_eq!(again, UpsertOutcome::Updated(first.id()));
    assert!(matches!(other_case, UpsertOutcome::Created(_)));
    assert_ne!(other_case.id(), first.id());
}

#[tokio::test]
async fn test_production_upsert_prefers_oldest_duplicate_title() {
    let pool = holocron_db::connect_in_memory().await.unwrap();
    let repo = CatalogRepository::new(pool.clone());

    sqlx::query("INSERT INTO productions (title) VALUES ('Dup'), ('Dup')")
        .execute(&pool)
        .await
        .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let outcome = upsert::upsert_production(&mut conn, &production("Dup", "Lucas"))
        .await
        .unwrap();
    drop(conn);

    let rows = repo.list_productions().await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated(rows[0].id));
    assert_eq!(rows[0].director, "Lucas");
    assert_eq!(rows[1].director, "");
}

#[tokio::test]
async fn test_replace_relations_is_idempotent() {
    let pool = holocron_db::connect_in_memory().await.unwrap();
    let repo = CatalogRepository::new(pool.clone());
    let mut conn = pool.acquire().await.unwrap();

    let a = upsert::upsert_body(&mut conn, "A").await.unwrap().id();
    let b = upsert::upsert_body(&mut conn, "B").await.unwrap().id();
    let c = upsert::upsert_body(&mut conn, "C").await.unwrap().id();
    let film = upsert::upsert_production(&mut conn, &production("Film", ""))
        .await
        .unwrap()
        .id();

    upsert::replace_relations(&mut conn, Relation::ProductionBodies, film, &[a, b])
        .await
        .unwrap();
    upsert::replace_relations(&mut conn, Relation::ProductionBodies, film, &[b, c, c])
        .await
        .unwrap();
    upsert::replace_relations(&mut conn, Relation::ProductionBodies, film, &[b, c])
        .await
        .unwrap();
    drop(conn);

    assert_eq!(
        repo.body_names_for_production(film).await.unwrap(),
        vec!["B", "C"]
    );
}

#[tokio::test]
async fn test_replace_relations_with_empty_set_clears() {
    let pool = holocron_db::connect_in_memory().await.unwrap();
    let repo = CatalogRepository::new(pool.clone());
    let mut conn = pool.acquire().await.unwrap();

    let film = upsert::upsert_production(&mut conn, &production("Film", ""))
        .await
        .unwrap()
        .id();
    let luke = upsert::upsert_character(&mut conn, "Luke").await.unwrap().id();

    upsert::replace_relations(&mut conn, Relation::CharacterProductions, luke, &[film])
        .await
        .unwrap();
    upsert::replace_relations(&mut conn, Relation::CharacterProductions, luke, &[])
        .await
        .unwrap();
    drop(conn);

    assert!(repo
        .production_titles_for_character(luke)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_replace_relations_handles_large_sets() {
    let pool = holocron_db::connect_in_memory().await.unwrap();
    let repo = CatalogRepository::new(pool.clone());
    let mut conn = pool.acquire().await.unwrap();

    let film = upsert::upsert_production(&mut conn, &production("Big", ""))
        .await
        .unwrap()
        .id();
    let mut bodies = Vec::new();
    for i in 0..1000 {
        bodies.push(
            upsert::upsert_body(&mut conn, &format!("Body {}", i))
                .await
                .unwrap()
                .id(),
        );
    }

    upsert::replace_relations(&mut conn, Relation::ProductionBodies, film, &bodies)
        .await
        .unwrap();
    drop(conn);

    assert_eq!(repo.get_stats().await.unwrap().production_bodies, 1000);
}
