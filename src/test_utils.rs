//! Shared test utilities for the consignment ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        clock::FixedClock,
        exit_note::{self, NewNoteItem},
        seller,
    },
    entities::{self, exit_note::DeliveryStatus},
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test harness. Safe to call from several tests.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Midnight UTC on the given day.
pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// A clock frozen at 2025-06-15 12:00:00 UTC.
pub fn test_clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap())
}

/// Creates a test seller named `name` with an email derived from it.
pub async fn create_test_seller(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::seller::Model> {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    seller::create_seller(db, &test_clock(), name, &email).await
}

/// Creates a pending, unpaid note with one item priced at `total`.
///
/// # Defaults
/// * `product_ref`: `"SKU-TEST"`
/// * `quantity`: 1
/// * `shipping_fee`: 0.0
pub async fn create_test_note(
    db: &DatabaseConnection,
    seller_id: i64,
    date: DateTime<Utc>,
    total: f64,
) -> Result<entities::exit_note::Model> {
    exit_note::create_exit_note(
        db,
        &test_clock(),
        seller_id,
        date,
        vec![NewNoteItem::new("SKU-TEST", 1, total)],
        0.0,
    )
    .await
}

/// Creates a note with [`create_test_note`] and marks it delivered, so it counts as debt.
pub async fn create_delivered_note(
    db: &DatabaseConnection,
    seller_id: i64,
    date: DateTime<Utc>,
    total: f64,
) -> Result<entities::exit_note::Model> {
    let note = create_test_note(db, seller_id, date, total).await?;
    exit_note::update_note_status(db, note.id, DeliveryStatus::Delivered).await
}

/// Sets up a complete test environment with a seller.
/// Returns (db, seller) for common test scenarios.
pub async fn setup_with_seller() -> Result<(DatabaseConnection, entities::seller::Model)> {
    let db = setup_test_db().await?;
    let seller = create_test_seller(&db, "Test Seller").await?;
    Ok((db, seller))
}
