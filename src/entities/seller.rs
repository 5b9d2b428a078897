//! Seller entity - A consignment seller receiving goods on exit notes.
//!
//! Sellers are referenced by exit notes and seller payment records. The `slug` is a
//! short, unique, URL-friendly handle derived from the first word of the name.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Seller database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sellers")]
pub struct Model {
    /// Unique identifier for the seller
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full display name (e.g., "Ana Morales")
    pub name: String,
    /// Contact email, used to match seed sellers from config.toml
    pub email: String,
    /// Unique handle derived from the first word of the name (e.g., "ana", "ana2")
    #[sea_orm(unique)]
    pub slug: String,
    /// When the seller was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Seller and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One seller has many exit notes
    #[sea_orm(has_many = "super::exit_note::Entity")]
    ExitNotes,
    /// One seller has many payment records
    #[sea_orm(has_many = "super::payment_record::Entity")]
    PaymentRecords,
}

impl Related<super::exit_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExitNotes.def()
    }
}

impl Related<super::payment_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
