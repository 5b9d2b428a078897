//! Exit note business logic - Handles recording, reading and reverting consignment shipments.
//!
//! An exit note is created with its line items in a single database transaction and gets the
//! next sequential note number. The delivery status only moves forward
//! (pending → in transit → delivered → received); skipping steps is allowed. Paid amounts
//! are never written here, see [`crate::core::allocation`].

use crate::{
    config::sellers::Config,
    core::{clock::Clock, sequence},
    entities::{
        ExitNote, ExitNoteItem, PaymentRecord, exit_note,
        exit_note::{DeliveryStatus, PaymentStatus},
        exit_note_item, payment_record,
        payment_record::RecordStatus,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// A line item for a note that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNoteItem {
    /// Catalog reference of the product
    pub product_ref: String,
    /// Units shipped, must be positive
    pub quantity: i32,
    /// Consignment price per unit, must be finite and non-negative
    pub unit_price: f64,
}

impl NewNoteItem {
    /// Creates a line item.
    #[must_use]
    pub fn new(product_ref: impl Into<String>, quantity: i32, unit_price: f64) -> Self {
        Self {
            product_ref: product_ref.into(),
            quantity,
            unit_price,
        }
    }

    /// `quantity × unit_price`
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }
}

/// Sum of the line subtotals plus the flat shipping fee.
#[must_use]
pub fn compute_total_price(items: &[NewNoteItem], shipping_fee: f64) -> f64 {
    items.iter().map(NewNoteItem::subtotal).sum::<f64>() + shipping_fee
}

fn validate_items(items: &[NewNoteItem], shipping_fee: f64) -> Result<()> {
    if items.is_empty() {
        return Err(Error::Validation {
            message: "An exit note needs at least one item".to_string(),
        });
    }

    for item in items {
        if item.product_ref.trim().is_empty() {
            return Err(Error::Validation {
                message: "Item product reference cannot be empty".to_string(),
            });
        }
        if item.quantity <= 0 {
            return Err(Error::Validation {
                message: format!(
                    "Item '{}' quantity must be positive, got {}",
                    item.product_ref, item.quantity
                ),
            });
        }
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            return Err(Error::InvalidAmount {
                amount: item.unit_price,
            });
        }
    }

    if !shipping_fee.is_finite() || shipping_fee < 0.0 {
        return Err(Error::InvalidAmount {
            amount: shipping_fee,
        });
    }

    Ok(())
}

/// Records a new exit note for a seller.
///
/// The note starts `pending` and `unpaid` with nothing paid. The note, its items and the
/// note number are written in one database transaction.
#[instrument(skip(db, clock, items))]
pub async fn create_exit_note(
    db: &DatabaseConnection,
    clock: &impl Clock,
    seller_id: i64,
    date: DateTime<Utc>,
    items: Vec<NewNoteItem>,
    shipping_fee: f64,
) -> Result<exit_note::Model> {
    validate_items(&items, shipping_fee)?;

    crate::core::seller::get_seller_by_id(db, seller_id)
        .await?
        .ok_or(Error::SellerNotFound { id: seller_id })?;

    let total_price = compute_total_price(&items, shipping_fee);

    let txn = db.begin().await?;

    let number = sequence::next_value(&txn, sequence::EXIT_NOTE_SEQUENCE).await?;
    let note = exit_note::ActiveModel {
        number: Set(number),
        seller_id: Set(seller_id),
        date: Set(date),
        shipping_fee: Set(shipping_fee),
        total_price: Set(total_price),
        amount_paid: Set(0.0),
        status: Set(DeliveryStatus::Pending),
        payment_status: Set(PaymentStatus::Unpaid),
        created_at: Set(clock.now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for item in items {
        exit_note_item::ActiveModel {
            note_id: Set(note.id),
            product_ref: Set(item.product_ref),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    info!(
        note_id = note.id,
        number = note.number,
        total_price = note.total_price,
        "Exit note created"
    );
    Ok(note)
}

/// Creates an exit note charging the `default_shipping_fee` from `config.toml`.
pub async fn create_exit_note_with_default_fee(
    db: &DatabaseConnection,
    clock: &impl Clock,
    config: &Config,
    seller_id: i64,
    date: DateTime<Utc>,
    items: Vec<NewNoteItem>,
) -> Result<exit_note::Model> {
    create_exit_note(
        db,
        clock,
        seller_id,
        date,
        items,
        config.default_shipping_fee,
    )
    .await
}

/// Finds an exit note by its unique ID.
pub async fn get_exit_note_by_id<C>(db: &C, note_id: i64) -> Result<Option<exit_note::Model>>
where
    C: ConnectionTrait,
{
    ExitNote::find_by_id(note_id).one(db).await.map_err(Into::into)
}

/// Retrieves all exit notes of a seller, oldest first (by date, then note number).
///
/// Unknown sellers simply have no notes.
pub async fn get_exit_notes_for_seller<C>(db: &C, seller_id: i64) -> Result<Vec<exit_note::Model>>
where
    C: ConnectionTrait,
{
    ExitNote::find()
        .filter(exit_note::Column::SellerId.eq(seller_id))
        .order_by_asc(exit_note::Column::Date)
        .order_by_asc(exit_note::Column::Number)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the seller's notes that still have something to pay (`total_price > amount_paid`),
/// oldest first.
pub async fn get_outstanding_notes_for_seller<C>(
    db: &C,
    seller_id: i64,
) -> Result<Vec<exit_note::Model>>
where
    C: ConnectionTrait,
{
    let notes = get_exit_notes_for_seller(db, seller_id).await?;
    Ok(notes
        .into_iter()
        .filter(|note| note.total_price > note.amount_paid)
        .collect())
}

/// Retrieves the line items of a note.
pub async fn get_items_for_note(
    db: &DatabaseConnection,
    note_id: i64,
) -> Result<Vec<exit_note_item::Model>> {
    ExitNoteItem::find()
        .filter(exit_note_item::Column::NoteId.eq(note_id))
        .order_by_asc(exit_note_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves a note forward in its delivery lifecycle.
///
/// Setting the current status again is a no-op. Moving backwards fails with
/// [`Error::InvalidStatusTransition`].
#[instrument(skip(db))]
pub async fn update_note_status(
    db: &DatabaseConnection,
    note_id: i64,
    status: DeliveryStatus,
) -> Result<exit_note::Model> {
    let note = get_exit_note_by_id(db, note_id)
        .await?
        .ok_or(Error::NoteNotFound { id: note_id })?;

    if note.status == status {
        return Ok(note);
    }

    if status.rank() < note.status.rank() {
        return Err(Error::InvalidStatusTransition {
            from: note.status.to_string(),
            to: status.to_string(),
        });
    }

    let from = note.status;
    let mut active_model: exit_note::ActiveModel = note.into();
    active_model.status = Set(status);
    let updated = active_model.update(db).await?;

    info!(note_id, %from, to = %status, "Exit note status updated");
    Ok(updated)
}

/// Reverts (deletes) an exit note, as done by the inventory-reversal flow.
///
/// Notes that already received money, either through `amount_paid` or through an approved
/// payment record linked to them, are refused with [`Error::NoteHasPayments`]. Otherwise
/// the note, its items and its remaining (pending or rejected) payment records are removed
/// in one transaction, so no payment record is left pointing at a missing note.
#[instrument(skip(db))]
pub async fn delete_exit_note(db: &DatabaseConnection, note_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let note = get_exit_note_by_id(&txn, note_id)
        .await?
        .ok_or(Error::NoteNotFound { id: note_id })?;

    let linked_records = PaymentRecord::find()
        .filter(payment_record::Column::NoteId.eq(note_id))
        .all(&txn)
        .await?;

    let has_approved = linked_records
        .iter()
        .any(|record| record.status == RecordStatus::Approved);
    if note.amount_paid > 0.0 || has_approved {
        return Err(Error::NoteHasPayments { id: note_id });
    }

    PaymentRecord::delete_many()
        .filter(payment_record::Column::NoteId.eq(note_id))
        .exec(&txn)
        .await?;
    ExitNoteItem::delete_many()
        .filter(exit_note_item::Column::NoteId.eq(note_id))
        .exec(&txn)
        .await?;
    note.delete(&txn).await?;

    txn.commit().await?;

    info!(
        note_id,
        removed_records = linked_records.len(),
        "Exit note reverted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::payment_record::{NewPaymentRecord, Payer, create_payment_record};
    use crate::entities::payment_record::PaymentMethod;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_compute_total_price() {
        let items = vec![
            NewNoteItem::new("SKU-1", 2, 10.5),
            NewNoteItem::new("SKU-2", 1, 4.0),
        ];
        assert_eq!(compute_total_price(&items, 0.0), 25.0);
        assert_eq!(compute_total_price(&items, 5.0), 30.0);
    }

    #[tokio::test]
    async fn test_create_exit_note_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let clock = test_clock();

        // No items
        let result = create_exit_note(&db, &clock, 1, date(2025, 1, 1), vec![], 0.0).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        // Zero quantity
        let items = vec![NewNoteItem::new("SKU-1", 0, 10.0)];
        let result = create_exit_note(&db, &clock, 1, date(2025, 1, 1), items, 0.0).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        // Negative price
        let items = vec![NewNoteItem::new("SKU-1", 1, -10.0)];
        let result = create_exit_note(&db, &clock, 1, date(2025, 1, 1), items, 0.0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -10.0 }
        ));

        // NaN shipping fee
        let items = vec![NewNoteItem::new("SKU-1", 1, 10.0)];
        let result = create_exit_note(&db, &clock, 1, date(2025, 1, 1), items, f64::NAN).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_exit_note_unknown_seller() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();

        let items = vec![NewNoteItem::new("SKU-1", 1, 10.0)];
        let result = create_exit_note(&db, &clock, 77, date(2025, 1, 1), items, 0.0).await;
        assert!(matches!(result.unwrap_err(), Error::SellerNotFound { id: 77 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_exit_note_integration() -> Result<()> {
        let (db, seller) = setup_with_seller().await?;
        let clock = test_clock();

        let items = vec![
            NewNoteItem::new("SKU-1", 3, 20.0),
            NewNoteItem::new("SKU-2", 2, 5.0),
        ];
        let note = create_exit_note(&db, &clock, seller.id, date(2025, 2, 1), items, 7.5).await?;

        assert_eq!(note.number, 1);
        assert_eq!(note.seller_id, seller.id);
        assert_eq!(note.total_price, 77.5);
        assert_eq!(note.amount_paid, 0.0);
        assert_eq!(note.status, DeliveryStatus::Pending);
        assert_eq!(note.payment_status, PaymentStatus::Unpaid);
        assert_eq!(note.created_at, clock.now());

        let stored_items = get_items_for_note(&db, note.id).await?;
        assert_eq!(stored_items.len(), 2);
        assert_eq!(stored_items[0].product_ref, "SKU-1");
        assert_eq!(stored_items[0].quantity, 3);

        let second = create_test_note(&db, seller.id, date(2025, 2, 2), 10.0).await?;
        assert_eq!(second.number, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_exit_note_with_default_fee() -> Result<()> {
        let (db, seller) = setup_with_seller().await?;
        let clock = test_clock();
        let config: Config = toml::from_str("default_shipping_fee = 4.25").unwrap();

        let items = vec![NewNoteItem::new("SKU-1", 2, 10.0)];
        let note =
            create_exit_note_with_default_fee(&db, &clock, &config, seller.id, date(2025, 2, 1), items)
                .await?;
        assert_eq!(note.shipping_fee, 4.25);
        assert_eq!(note.total_price, 24.25);

        // A negative configured fee is rejected like an explicit one
        let config: Config = toml::from_str("default_shipping_fee = -1.0").unwrap();
        let items = vec![NewNoteItem::new("SKU-1", 1, 10.0)];
        let result =
            create_exit_note_with_default_fee(&db, &clock, &config, seller.id, date(2025, 2, 2), items)
                .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -1.0 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_exit_notes_for_seller_oldest_first() -> Result<()> {
        let (db, seller) = setup_with_seller().await?;
        let other = create_test_seller(&db, "Other Seller").await?;

        let newer = create_test_note(&db, seller.id, date(2025, 3, 1), 10.0).await?;
        let older = create_test_note(&db, seller.id, date(2025, 1, 1), 20.0).await?;
        create_test_note(&db, other.id, date(2024, 1, 1), 30.0).await?;

        let notes = get_exit_notes_for_seller(&db, seller.id).await?;
        assert_eq!(notes, vec![older, newer]);

        assert!(get_exit_notes_for_seller(&db, 999).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_note_status_forward_only() -> Result<()> {
        let (db, seller) = setup_with_seller().await?;
        let note = create_test_note(&db, seller.id, date(2025, 1, 1), 10.0).await?;

        let note = update_note_status(&db, note.id, DeliveryStatus::InTransit).await?;
        assert_eq!(note.status, DeliveryStatus::InTransit);

        let note = update_note_status(&db, note.id, DeliveryStatus::Received).await?;
        assert_eq!(note.status, DeliveryStatus::Received);

        // Same status is a no-op
        let note = update_note_status(&db, note.id, DeliveryStatus::Received).await?;
        assert_eq!(note.status, DeliveryStatus::Received);

        let result = update_note_status(&db, note.id, DeliveryStatus::Delivered).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidStatusTransition { from: _, to: _ }
        ));

        let result = update_note_status(&db, 999, DeliveryStatus::Delivered).await;
        assert!(matches!(result.unwrap_err(), Error::NoteNotFound { id: 999 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_exit_note_removes_items_and_pending_records() -> Result<()> {
        let (db, seller) = setup_with_seller().await?;
        let clock = test_clock();
        let note = create_test_note(&db, seller.id, date(2025, 1, 1), 10.0).await?;

        create_payment_record(
            &db,
            &clock,
            NewPaymentRecord {
                payer: Payer::Seller(seller.id),
                note_id: Some(note.id),
                amount: 10.0,
                method: PaymentMethod::Bank,
                status: RecordStatus::Pending,
                reference: Some("TRX-1".to_string()),
                notes: None,
            },
        )
        .await?;

        delete_exit_note(&db, note.id).await?;

        assert!(get_exit_note_by_id(&db, note.id).await?.is_none());
        assert!(get_items_for_note(&db, note.id).await?.is_empty());
        let records = crate::core::payment_record::get_payments_for_seller(&db, seller.id).await?;
        assert!(records.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_exit_note_with_payments_is_refused() -> Result<()> {
        let (db, seller) = setup_with_seller().await?;
        let clock = test_clock();
        let note = create_delivered_note(&db, seller.id, date(2025, 1, 1), 10.0).await?;

        crate::core::allocation::pay_note(&db, &clock, note.id, 4.0, PaymentMethod::Cash).await?;

        let result = delete_exit_note(&db, note.id).await;
        assert!(matches!(result.unwrap_err(), Error::NoteHasPayments { id: _ }));
        assert!(get_exit_note_by_id(&db, note.id).await?.is_some());

        let result = delete_exit_note(&db, 999).await;
        assert!(matches!(result.unwrap_err(), Error::NoteNotFound { id: 999 }));

        Ok(())
    }
}
