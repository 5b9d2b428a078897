//! Payment record entity - Audit trail of money received.
//!
//! A record comes either from a seller (consignment debt) or from a walk-in customer.
//! Seller records may point at a specific exit note; global (lump) payments do not.
//! Only `approved` records count toward a seller's total payments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who the money came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A consignment seller paying down debt
    #[sea_orm(string_value = "seller")]
    Seller,
    /// A walk-in customer
    #[sea_orm(string_value = "customer")]
    Customer,
}

/// How the money was received
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash handed over in person
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Bank transfer or deposit
    #[sea_orm(string_value = "bank")]
    Bank,
}

/// Review status of a payment record
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Waiting for an admin decision
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Counts toward the seller's payments
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Never counts
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Payment record database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_records")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Generated human-readable number (e.g., `"PAY-000042"`)
    #[sea_orm(unique)]
    pub number: String,
    /// Seller or customer
    pub source_type: SourceType,
    /// Paying seller, set iff `source_type` is `Seller`
    pub seller_id: Option<i64>,
    /// Paying customer, set iff `source_type` is `Customer`
    pub customer_id: Option<String>,
    /// Exit note this payment was made against, None for global payments
    pub note_id: Option<i64>,
    /// Amount received in dollars
    pub amount: f64,
    /// Cash or bank
    pub method: PaymentMethod,
    /// Review status
    pub status: RecordStatus,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was approved, if it was
    pub approved_at: Option<DateTimeUtc>,
    /// External reference (receipt or transfer number)
    pub reference: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
}

/// Defines relationships between `PaymentRecord` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Seller that made the payment
    #[sea_orm(
        belongs_to = "super::seller::Entity",
        from = "Column::SellerId",
        to = "super::seller::Column::Id"
    )]
    Seller,
    /// Exit note the payment was made against
    #[sea_orm(
        belongs_to = "super::exit_note::Entity",
        from = "Column::NoteId",
        to = "super::exit_note::Column::Id"
    )]
    ExitNote,
}

impl Related<super::seller::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
    }
}

impl Related<super::exit_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExitNote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
