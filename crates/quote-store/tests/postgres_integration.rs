//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p quote-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use domain::{HomeType, Money, PricingEngine, ServiceSpecification, VehicleClass};
use quote_store::{
    CustomerId, NewQuote, PostgresQuoteStore, QuoteAddon, QuoteId, QuoteRequest, QuoteService,
    QuoteStore, QuoteStoreError,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            PostgresQuoteStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresQuoteStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE quote_addons, quotes")
        .execute(&pool)
        .await
        .unwrap();

    PostgresQuoteStore::new(pool)
}

fn new_quote(addons: Vec<QuoteAddon>) -> NewQuote {
    let addon_total: Money = addons.iter().map(|a| a.addon_price).sum();
    NewQuote {
        customer_id: CustomerId::new(),
        main_service: "GENERAL".to_string(),
        subtotal: Money::from_major(2500),
        addon_total,
        total_price: Money::from_major(2500) + addon_total,
        addons,
    }
}

fn addon(name: &str, major: i64) -> QuoteAddon {
    QuoteAddon {
        addon_name: name.to_string(),
        addon_price: Money::from_major(major),
    }
}

#[tokio::test]
async fn insert_returns_generated_id_and_timestamps() {
    let store = get_test_store().await;

    let stored = store
        .insert(new_quote(vec![addon("CAR", 6750)]))
        .await
        .unwrap();

    assert!(stored.validity);
    assert_eq!(stored.total_price, Money::from_major(9250));
    assert!(stored.updated_at >= stored.created_at);

    let loaded = store.get(stored.id).await.unwrap().unwrap();
    assert_eq!(loaded, stored);
}

#[tokio::test]
async fn addons_keep_request_order() {
    let store = get_test_store().await;

    let stored = store
        .insert(new_quote(vec![
            addon("MATTRESS", 1800),
            addon("CAR", 1750),
            addon("COUCH", 250),
        ]))
        .await
        .unwrap();

    let loaded = store.get(stored.id).await.unwrap().unwrap();
    let names: Vec<_> = loaded.addons.iter().map(|a| a.addon_name.as_str()).collect();
    assert_eq!(names, vec!["MATTRESS", "CAR", "COUCH"]);
}

#[tokio::test]
async fn get_unknown_quote_returns_none() {
    let store = get_test_store().await;
    assert!(store.get(QuoteId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn migrations_can_rerun() {
    let store = get_test_store().await;
    store.run_migrations().await.unwrap();
}

#[tokio::test]
async fn consume_flips_validity_once() {
    let store = get_test_store().await;
    let stored = store.insert(new_quote(vec![])).await.unwrap();

    let owner = stored.customer_id.unwrap();

    let consumed = store.consume(stored.id, owner).await.unwrap().unwrap();
    assert!(!consumed.validity);
    assert!(consumed.updated_at >= stored.updated_at);

    assert!(store.consume(stored.id, owner).await.unwrap().is_none());
    assert!(!store.get(stored.id).await.unwrap().unwrap().validity);
}

#[tokio::test]
async fn consume_is_scoped_to_the_quote_owner() {
    let store = get_test_store().await;
    let stored = store.insert(new_quote(vec![])).await.unwrap();

    let result = store.consume(stored.id, CustomerId::new()).await.unwrap();

    assert!(result.is_none());
    assert!(store.get(stored.id).await.unwrap().unwrap().validity);
}

#[tokio::test]
async fn restore_reopens_a_consumed_quote() {
    let store = get_test_store().await;
    let stored = store.insert(new_quote(vec![addon("CAR", 6750)])).await.unwrap();
    let owner = stored.customer_id.unwrap();
    store.consume(stored.id, owner).await.unwrap().unwrap();

    assert!(store.restore(stored.id).await.unwrap());
    assert!(!store.restore(stored.id).await.unwrap());

    let again = store.consume(stored.id, owner).await.unwrap().unwrap();
    assert_eq!(again.addons.len(), 1);
}

#[tokio::test]
async fn failed_addon_insert_rolls_back_quote() {
    let store = get_test_store().await;

    // Reject every addon row: the quote insert succeeds, the first addon
    // insert fails inside the same transaction.
    sqlx::query(
        "ALTER TABLE quote_addons ADD CONSTRAINT reject_all CHECK (addon_price_cents < 0) NOT VALID",
    )
    .execute(store.pool())
    .await
    .unwrap();

    let result = store.insert(new_quote(vec![addon("CAR", 3250)])).await;

    sqlx::query("ALTER TABLE quote_addons DROP CONSTRAINT reject_all")
        .execute(store.pool())
        .await
        .unwrap();

    assert!(matches!(result, Err(QuoteStoreError::Database(_))));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quotes")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn quote_service_persists_through_postgres() {
    let store = get_test_store().await;
    let service = QuoteService::new(store, PricingEngine::default());

    let quote = service
        .create_quote(QuoteRequest {
            customer_id: Some(CustomerId::new()),
            main_service: ServiceSpecification::general(HomeType::House, 40.0),
            addons: vec![ServiceSpecification::car(vec![(VehicleClass::Sedan, 2)], 1)],
        })
        .await
        .unwrap();

    assert_eq!(quote.total_price, Money::from_major(9250));
    let loaded = service.get_quote(quote.id).await.unwrap().unwrap();
    assert_eq!(loaded.addons[0].addon_price, Money::from_major(6750));
}
