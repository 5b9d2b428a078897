//! Database configuration module for the consignment ledger.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Creation uses `IF NOT EXISTS`, which makes
//! it safe to call on every start.

use crate::entities::{ExitNote, ExitNoteItem, PaymentRecord, Seller, SystemState};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/consignment.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, or the default
/// local `SQLite` file if it is not set.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);

    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables that do not exist yet and seeds the sequence counters.
///
/// Parents are created before children so foreign keys resolve: sellers, exit notes,
/// note items, payment records, then system state.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Seller).await?;
    create_table(db, &schema, ExitNote).await?;
    create_table(db, &schema, ExitNoteItem).await?;
    create_table(db, &schema, PaymentRecord).await?;
    create_table(db, &schema, SystemState).await?;
    crate::core::sequence::ensure_sequences(db).await?;

    info!("Database tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ExitNoteModel, PaymentRecordModel, SellerModel, SystemStateModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<SellerModel> = Seller::find().limit(1).all(&db).await?;
        let _: Vec<ExitNoteModel> = ExitNote::find().limit(1).all(&db).await?;
        let _: Vec<PaymentRecordModel> = PaymentRecord::find().limit(1).all(&db).await?;
        let _: Vec<SystemStateModel> = SystemState::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let sellers: Vec<SellerModel> = Seller::find().all(&db).await?;
        assert!(sellers.is_empty());

        // One row per sequence, each seeded once
        let counters: Vec<SystemStateModel> = SystemState::find().all(&db).await?;
        assert_eq!(counters.len(), 2);
        assert!(counters.iter().all(|c| c.value == 1));
        Ok(())
    }
}
