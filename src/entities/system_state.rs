//! System state entity - Stores named system-wide counters.
//! Used for the sequential exit note numbers and payment record numbers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// System state database model - one row per named counter
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_state")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// State key (e.g., `"next_exit_note_number"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Next value the counter hands out
    pub value: i64,
    /// When this value was last modified
    pub updated_at: DateTime,
}

/// `SystemState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
