//! Shared fixtures for the PostgreSQL-backed tests.
//!
//! These tests require a reachable PostgreSQL database in `DATABASE_URL`.
//! Every test works inside a test transaction that is never committed.
//!
//! Run with: cargo test -- --ignored

#![allow(dead_code)]

use std::sync::Once;

use diesel::{Connection, PgConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use storefront_service::{
    cache::AddressCache,
    models::{AddressEntity, CreateProductEntity, ProductEntity},
    stores::{
        address_book::{self, NewAddress},
        catalog,
    },
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static MIGRATED: Once = Once::new();

fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set")
}

/// Opens a connection whose writes are committed, migrating the database on
/// first use. Callers clean up after themselves.
pub async fn committed_connection() -> AsyncPgConnection {
    let url = database_url();

    MIGRATED.call_once(|| {
        let mut conn = PgConnection::establish(&url).expect("Failed to connect for migrations");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Failed to run migrations");
    });

    AsyncPgConnection::establish(&url)
        .await
        .expect("Failed to connect to the test database")
}

/// Opens a connection inside a test transaction that is never committed.
pub async fn connection() -> AsyncPgConnection {
    let mut conn = committed_connection().await;
    conn.begin_test_transaction()
        .await
        .expect("Failed to begin test transaction");
    conn
}

pub struct Catalog {
    pub product_type_id: i32,
    pub manufacturer_id: i32,
}

pub async fn catalog(conn: &mut AsyncPgConnection, type_name: &str) -> Catalog {
    let product_type = catalog::create_product_type(conn, type_name).await.unwrap();
    let manufacturer = catalog::create_manufacturer(conn, "Hokkaido Farms")
        .await
        .unwrap();

    Catalog {
        product_type_id: product_type.id,
        manufacturer_id: manufacturer.id,
    }
}

pub async fn product(
    conn: &mut AsyncPgConnection,
    catalog: &Catalog,
    name: &str,
    price: i32,
    stock: i32,
) -> ProductEntity {
    catalog::create_product(
        conn,
        CreateProductEntity {
            name: name.into(),
            price,
            stock,
            product_type_id: catalog.product_type_id,
            manufacturer_id: catalog.manufacturer_id,
        },
    )
    .await
    .unwrap()
}

pub fn new_address(address: &str) -> NewAddress {
    NewAddress {
        zip_code: "060-0001".into(),
        prefecture: "Hokkaido".into(),
        address: address.into(),
    }
}

pub async fn address(
    conn: &mut AsyncPgConnection,
    cache: &AddressCache,
    user_id: i32,
    address: &str,
) -> AddressEntity {
    address_book::save(conn, cache, user_id, new_address(address))
        .await
        .unwrap()
}
