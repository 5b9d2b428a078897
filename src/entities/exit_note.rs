//! Exit note entity - A consignment shipment of goods to a seller.
//!
//! Each note carries two independent lifecycles: the delivery `status` and the derived
//! `payment_status`. Once a note is delivered or received, its `total_price` counts as
//! debt for the seller. `amount_paid` only ever grows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery lifecycle of an exit note
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Recorded but not shipped yet
    #[sea_orm(string_value = "pending")]
    Pending,
    /// On its way to the seller
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    /// Delivered to the seller
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Delivery confirmed by the seller
    #[sea_orm(string_value = "received")]
    Received,
}

impl DeliveryStatus {
    /// Position in the lifecycle; transitions only move forward.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::InTransit => 1,
            Self::Delivered => 2,
            Self::Received => 3,
        }
    }

    /// Whether a note in this status counts toward the seller's debt.
    #[must_use]
    pub const fn counts_as_debt(self) -> bool {
        matches!(self, Self::Delivered | Self::Received)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Received => "received",
        };
        f.write_str(label)
    }
}

/// Payment state of an exit note, derived from `amount_paid` vs `total_price`
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing paid yet
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    /// Some, but not all, of the total has been paid
    #[sea_orm(string_value = "partial")]
    Partial,
    /// Fully paid (within the rounding tolerance)
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unpaid => "unpaid",
            Self::Partial => "partial",
            Self::Paid => "paid",
        };
        f.write_str(label)
    }
}

/// Exit note database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exit_notes")]
pub struct Model {
    /// Unique identifier for the note
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sequential human-readable note number
    #[sea_orm(unique)]
    pub number: i64,
    /// Seller the goods were shipped to
    pub seller_id: i64,
    /// Shipment date, used to order debt oldest-first
    pub date: DateTimeUtc,
    /// Flat shipping fee included in `total_price`
    pub shipping_fee: f64,
    /// Sum of line items plus shipping fee
    pub total_price: f64,
    /// Cumulative amount paid against this note
    pub amount_paid: f64,
    /// Delivery lifecycle status
    pub status: DeliveryStatus,
    /// Derived payment status
    pub payment_status: PaymentStatus,
    /// When the note was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `ExitNote` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each note belongs to one seller
    #[sea_orm(
        belongs_to = "super::seller::Entity",
        from = "Column::SellerId",
        to = "super::seller::Column::Id"
    )]
    Seller,
    /// One note has many line items
    #[sea_orm(has_many = "super::exit_note_item::Entity")]
    Items,
    /// Payment records linked to this note
    #[sea_orm(has_many = "super::payment_record::Entity")]
    PaymentRecords,
}

impl Related<super::seller::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
    }
}

impl Related<super::exit_note_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::payment_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
