//! Exit note item entity - One product line on an exit note.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Exit note line item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exit_note_items")]
pub struct Model {
    /// Unique identifier for the line item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Note this line belongs to
    pub note_id: i64,
    /// Catalog reference of the shipped product (SKU or barcode)
    pub product_ref: String,
    /// Units shipped
    pub quantity: i32,
    /// Consignment price per unit in dollars
    pub unit_price: f64,
}

/// Defines relationships between `ExitNoteItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one exit note
    #[sea_orm(
        belongs_to = "super::exit_note::Entity",
        from = "Column::NoteId",
        to = "super::exit_note::Column::Id"
    )]
    ExitNote,
}

impl Related<super::exit_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExitNote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
